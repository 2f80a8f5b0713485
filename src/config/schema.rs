use serde::{Deserialize, Serialize};

use crate::standings::StandingsConfig;

/// Environment variable overriding `backend.url`
pub const ENV_BACKEND_URL: &str = "Y_ULTIMATE_BACKEND_URL";
/// Environment variable overriding `backend.anon_key`
pub const ENV_ANON_KEY: &str = "Y_ULTIMATE_ANON_KEY";

fn default_auto_refresh_interval() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub backend: BackendConfig,

    /// Web app base URL, used by `open`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,

    /// Default tournament id when a command is run without `--tournament`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<String>,

    /// TUI refresh interval in seconds
    #[serde(default = "default_auto_refresh_interval")]
    pub auto_refresh_interval: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standings: Option<StandingsConfig>,
}

/// Where the hosted backend lives and the public key every request carries
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

impl Config {
    /// Standings settings, falling back to the built-in weights
    pub fn standings(&self) -> StandingsConfig {
        self.standings.clone().unwrap_or_default()
    }

    /// Apply `Y_ULTIMATE_BACKEND_URL` / `Y_ULTIMATE_ANON_KEY` on top of the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(non_empty_env(ENV_BACKEND_URL), non_empty_env(ENV_ANON_KEY));
    }

    fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url {
            self.backend.url = url;
        }
        if let Some(key) = anon_key {
            self.backend.anon_key = key;
        }
    }

    /// Resolve which tournament a command operates on
    pub fn tournament_id<'a>(&'a self, flag: Option<&'a str>) -> anyhow::Result<&'a str> {
        flag.or(self.tournament.as_deref()).ok_or_else(|| {
            anyhow::anyhow!(
                "No tournament selected. Pass --tournament <ID> or set `tournament:` in the config file."
            )
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::TiePolicy;

    const MINIMAL: &str = r#"
backend:
  url: https://project.example.co
  anon_key: anon
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config: Config = serde_saphyr::from_str(MINIMAL).unwrap();
        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.auto_refresh_interval, 30);
        assert!(config.tournament.is_none());
        assert!(config.standings.is_none());
        assert_eq!(config.standings(), StandingsConfig::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
backend:
  url: https://project.example.co
  anon_key: anon
app_url: https://y-ultimate.example.org
tournament: t-2025
auto_refresh_interval: 60
standings:
  performance_weight: 60
  spirit_weight: 40
  tie_policy: draw
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.auto_refresh_interval, 60);
        assert_eq!(config.tournament.as_deref(), Some("t-2025"));
        let standings = config.standings();
        assert_eq!(standings.performance_weight, 60.0);
        assert_eq!(standings.spirit_weight, 40.0);
        assert_eq!(standings.max_spirit_total, 20.0);
        assert_eq!(standings.tie_policy, TiePolicy::Draw);
    }

    #[test]
    fn test_missing_backend_is_an_error() {
        let result: Result<Config, _> = serde_saphyr::from_str("tournament: t1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_replace_backend() {
        let mut config: Config = serde_saphyr::from_str(MINIMAL).unwrap();
        config.apply_overrides(Some("http://localhost:54321".to_string()), None);
        assert_eq!(config.backend.url, "http://localhost:54321");
        assert_eq!(config.backend.anon_key, "anon");
    }

    #[test]
    fn test_tournament_flag_wins_over_config() {
        let mut config: Config = serde_saphyr::from_str(MINIMAL).unwrap();
        assert!(config.tournament_id(None).is_err());
        config.tournament = Some("from-config".to_string());
        assert_eq!(config.tournament_id(None).unwrap(), "from-config");
        assert_eq!(config.tournament_id(Some("from-flag")).unwrap(), "from-flag");
    }
}
