use anyhow::Result;
use std::time::Instant;

use crate::backend::{tables, BackendClient, MatchStatus};
use crate::standings::{compute_standings, Standings, StandingsConfig};

/// Fetch teams, matches and spirit scores for a tournament concurrently and
/// compute all three leaderboard views.
///
/// Any failed request aborts the whole computation. Called from main.rs for
/// one-shot output and from the TUI event loop for manual/auto refresh.
pub async fn fetch_standings(
    client: &BackendClient,
    tournament_id: &str,
    config: &StandingsConfig,
    verbose: bool,
) -> Result<Standings> {
    let started = Instant::now();

    let (teams, matches, spirit_scores) = tokio::try_join!(
        tables::fetch_teams(client, tournament_id),
        tables::fetch_matches(client, tournament_id),
        tables::fetch_spirit_scores(client, tournament_id),
    )?;

    if verbose {
        crate::buffered_eprintln!(
            "Fetched {} teams, {} matches, {} spirit scores in {}ms",
            teams.len(),
            matches.len(),
            spirit_scores.len(),
            started.elapsed().as_millis()
        );
    }

    let standings = compute_standings(&teams, &matches, &spirit_scores, config);

    if verbose {
        let completed = matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .count();
        crate::buffered_eprintln!(
            "Ranked {} approved teams over {} completed matches",
            standings.team_count(),
            completed
        );
    }

    Ok(standings)
}
