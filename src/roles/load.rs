use anyhow::Result;
use chrono::NaiveDate;

use super::{
    active_children, active_tournaments, attendance_rate, is_active_tournament, live_matches,
    matches_on, pending_approvals, sessions_in_week, upcoming_matches_for, week_start_utc,
    CaptainStats, CoachStats, Dashboard, DashboardKind, DirectorStats, PlayerStats, TeamSummary,
};
use crate::backend::{tables, AuthContext, BackendClient};
use crate::fetch::fetch_standings;
use crate::standings::StandingsConfig;

/// Fetch what the signed-in user's dashboard shows.
pub async fn load_dashboard(
    client: &BackendClient,
    ctx: &AuthContext,
    today: NaiveDate,
    standings: &StandingsConfig,
    verbose: bool,
) -> Result<Dashboard> {
    let kind = DashboardKind::for_role(ctx.role());
    if verbose {
        eprintln!("Loading {} for {}", kind.title(), ctx.display_name());
    }

    match kind {
        DashboardKind::TournamentDirector => {
            let (tournaments, teams, matches) = tokio::try_join!(
                tables::list_tournaments(client, true),
                tables::list_all_teams(client),
                tables::list_all_matches(client),
            )?;
            Ok(Dashboard::TournamentDirector(DirectorStats {
                active_tournaments: active_tournaments(&tournaments),
                registered_teams: teams.len(),
                matches_today: matches_on(&matches, today),
                pending_approvals: pending_approvals(&teams),
                live_matches: live_matches(&matches),
            }))
        }
        DashboardKind::TeamCaptain => {
            let teams = tables::fetch_captained_teams(client, ctx.user_id()).await?;
            let mut summaries = Vec::with_capacity(teams.len());
            for team in &teams {
                let matches = tables::fetch_matches(client, &team.tournament_id).await?;
                let (rank, spirit_average) = if team.is_approved() {
                    let standings =
                        fetch_standings(client, &team.tournament_id, standings, verbose).await?;
                    (
                        standings.combined_rank(&team.id),
                        standings.spirit_of(&team.id).map(|s| s.average),
                    )
                } else {
                    (None, None)
                };
                summaries.push(TeamSummary {
                    team_id: team.id.clone(),
                    team_name: team.name.clone(),
                    status: team.status,
                    upcoming_matches: upcoming_matches_for(&matches, &team.id),
                    rank,
                    spirit_average,
                });
            }
            Ok(Dashboard::TeamCaptain(CaptainStats { teams: summaries }))
        }
        DashboardKind::Coach => {
            let (children, sessions, attendance) = tokio::try_join!(
                tables::list_children(client),
                tables::sessions_since(client, super::week_start(today)),
                tables::fetch_attendance_since(client, week_start_utc(today)),
            )?;
            Ok(Dashboard::Coach(CoachStats {
                active_children: active_children(&children),
                sessions_this_week: sessions_in_week(&sessions, today),
                attendance_rate: attendance_rate(&attendance),
            }))
        }
        DashboardKind::Player => {
            let tournaments = tables::list_tournaments(client, false).await?;
            Ok(Dashboard::Player(PlayerStats {
                open_tournaments: tournaments
                    .into_iter()
                    .filter(is_active_tournament)
                    .collect(),
            }))
        }
    }
}
