use serde::{Deserialize, Serialize};

/// How a completed match with equal scores is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TiePolicy {
    /// Both sides record a loss (what the web app has always shown)
    #[default]
    Loss,
    /// Both sides record a draw in a separate column
    Draw,
}

/// Weights for the combined leaderboard.
///
/// Example YAML:
/// ```yaml
/// standings:
///   performance_weight: 70
///   spirit_weight: 30
///   max_spirit_total: 20
///   tie_policy: loss
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StandingsConfig {
    /// Points awarded to the team with the most wins (default: 70)
    pub performance_weight: f64,

    /// Points awarded for a perfect spirit average (default: 30)
    pub spirit_weight: f64,

    /// Highest possible spirit total for one sheet (default: 20)
    pub max_spirit_total: f64,

    pub tie_policy: TiePolicy,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            performance_weight: 70.0,
            spirit_weight: 30.0,
            max_spirit_total: 20.0,
            tie_policy: TiePolicy::Loss,
        }
    }
}
