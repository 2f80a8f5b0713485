pub mod config;
pub mod engine;
pub mod validation;

pub use config::{StandingsConfig, TiePolicy};
pub use engine::{
    combined_standings, compute_standings, performance_standings, spirit_standings,
    CombinedStanding, PerformanceStanding, SpiritStanding, Standings,
};
pub use validation::validate_standings;

/// Which leaderboard to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StandingsView {
    #[default]
    Combined,
    Performance,
    Spirit,
}

impl StandingsView {
    pub const ALL: [StandingsView; 3] = [
        StandingsView::Combined,
        StandingsView::Performance,
        StandingsView::Spirit,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StandingsView::Combined => "Combined",
            StandingsView::Performance => "Performance",
            StandingsView::Spirit => "Spirit",
        }
    }
}
