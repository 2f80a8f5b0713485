use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::auth::AuthContext;
use super::client::{BackendClient, TableQuery};
use super::types::{
    AttendanceRecord, Child, CoachingSession, Match, NewChild, NewMatch, NewPlayer, NewSession,
    NewTeam, NewTournament, Profile, SpiritScore, Team, TeamPlayer, TeamStatus, Tournament,
};
use crate::live::ScoreUpdate;
use crate::spirit::SpiritSubmission;

const MATCH_SELECT: &str = "*,
    team_a:teams!matches_team_a_id_fkey(id, name),
    team_b:teams!matches_team_b_id_fkey(id, name)";

/// Spirit scores are filtered through their match's tournament, so the match
/// is embedded with an inner join.
const SPIRIT_SELECT: &str = "*, match:matches!inner(tournament_id)";

fn single<T>(rows: Vec<T>, what: &str) -> Result<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| anyhow!("Backend returned no row for {}", what))
}

// --- tournaments ---

pub fn tournaments_query(include_drafts: bool) -> TableQuery {
    let query = TableQuery::new("tournaments").order("start_date", false);
    if include_drafts {
        query
    } else {
        query.neq("status", "draft")
    }
}

pub async fn list_tournaments(client: &BackendClient, include_drafts: bool) -> Result<Vec<Tournament>> {
    client.select(&tournaments_query(include_drafts)).await
}

pub async fn get_tournament(client: &BackendClient, id: &str) -> Result<Tournament> {
    let rows = client.select(&TableQuery::new("tournaments").eq("id", id)).await?;
    single(rows, &format!("tournament {}", id))
}

#[derive(Serialize)]
struct TournamentInsert<'a> {
    #[serde(flatten)]
    tournament: &'a NewTournament,
    created_by: &'a str,
}

pub async fn create_tournament(
    client: &BackendClient,
    ctx: &AuthContext,
    tournament: &NewTournament,
) -> Result<Tournament> {
    if tournament.end_date < tournament.start_date {
        anyhow::bail!("Tournament cannot end before it starts");
    }
    let row = TournamentInsert {
        tournament,
        created_by: ctx.user_id(),
    };
    let rows = client.insert("tournaments", &[row]).await?;
    single(rows, "new tournament")
}

// --- teams ---

pub fn teams_query(tournament_id: &str) -> TableQuery {
    TableQuery::new("teams")
        .eq("tournament_id", tournament_id)
        .order("created_at", false)
}

pub async fn fetch_teams(client: &BackendClient, tournament_id: &str) -> Result<Vec<Team>> {
    client.select(&teams_query(tournament_id)).await
}

/// Teams across every tournament, for dashboard counts
pub async fn list_all_teams(client: &BackendClient) -> Result<Vec<Team>> {
    client
        .select(&TableQuery::new("teams").order("created_at", false))
        .await
}

pub async fn fetch_captained_teams(client: &BackendClient, captain_id: &str) -> Result<Vec<Team>> {
    let query = TableQuery::new("teams")
        .eq("captain_id", captain_id)
        .order("created_at", false);
    client.select(&query).await
}

pub async fn fetch_team_players(client: &BackendClient, team_id: &str) -> Result<Vec<TeamPlayer>> {
    client
        .select(&TableQuery::new("team_players").eq("team_id", team_id))
        .await
}

#[derive(Serialize)]
struct TeamInsert<'a> {
    #[serde(flatten)]
    team: &'a NewTeam,
    captain_id: &'a str,
}

#[derive(Serialize)]
struct PlayerInsert<'a> {
    #[serde(flatten)]
    player: &'a NewPlayer,
    team_id: &'a str,
}

/// Register a team captained by the current user, then its roster.
///
/// The two inserts are not transactional: if the roster insert fails the
/// team row stays registered without players.
pub async fn register_team(
    client: &BackendClient,
    ctx: &AuthContext,
    team: &NewTeam,
    players: &[NewPlayer],
) -> Result<Team> {
    let rows = client
        .insert(
            "teams",
            &[TeamInsert {
                team,
                captain_id: ctx.user_id(),
            }],
        )
        .await?;
    let created: Team = single(rows, "new team")?;

    if !players.is_empty() {
        let roster: Vec<PlayerInsert> = players
            .iter()
            .map(|player| PlayerInsert {
                player,
                team_id: &created.id,
            })
            .collect();
        let _: Vec<TeamPlayer> = client
            .insert("team_players", &roster)
            .await
            .with_context(|| format!("Team '{}' registered but roster upload failed", created.name))?;
    }

    Ok(created)
}

#[derive(Serialize)]
struct TeamStatusPatch<'a> {
    status: TeamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

pub async fn update_team_status(
    client: &BackendClient,
    team_id: &str,
    status: TeamStatus,
    notes: Option<&str>,
) -> Result<Team> {
    if status == TeamStatus::Pending {
        anyhow::bail!("A team can only be approved or rejected");
    }
    let rows = client
        .update(
            &TableQuery::new("teams").eq("id", team_id),
            &TeamStatusPatch { status, notes },
        )
        .await?;
    single(rows, &format!("team {}", team_id))
}

// --- matches ---

pub fn matches_query(tournament_id: Option<&str>) -> TableQuery {
    let query = TableQuery::new("matches").select(MATCH_SELECT);
    let query = match tournament_id {
        Some(id) => query.eq("tournament_id", id),
        None => query,
    };
    query.order("scheduled_time", true)
}

pub async fn fetch_matches(client: &BackendClient, tournament_id: &str) -> Result<Vec<Match>> {
    client.select(&matches_query(Some(tournament_id))).await
}

pub async fn list_all_matches(client: &BackendClient) -> Result<Vec<Match>> {
    client.select(&matches_query(None)).await
}

pub async fn get_match(client: &BackendClient, match_id: &str) -> Result<Match> {
    let query = TableQuery::new("matches").select(MATCH_SELECT).eq("id", match_id);
    let rows = client.select(&query).await?;
    single(rows, &format!("match {}", match_id))
}

pub async fn create_match(client: &BackendClient, new_match: &NewMatch) -> Result<Match> {
    if new_match.team_a_id == new_match.team_b_id {
        anyhow::bail!("A match needs two distinct teams");
    }
    let rows = client.insert("matches", &[new_match]).await?;
    single(rows, "new match")
}

/// Write an absolute score snapshot (and optional status change).
/// Last write wins; there is no conflict detection.
pub async fn update_match_score(client: &BackendClient, match_id: &str, update: &ScoreUpdate) -> Result<Match> {
    let query = TableQuery::new("matches").select(MATCH_SELECT).eq("id", match_id);
    let rows = client.update(&query, update).await?;
    single(rows, &format!("match {}", match_id))
}

// --- spirit scores ---

pub fn spirit_scores_query(tournament_id: &str) -> TableQuery {
    TableQuery::new("spirit_scores")
        .select(SPIRIT_SELECT)
        .eq("match.tournament_id", tournament_id)
}

pub async fn fetch_spirit_scores(client: &BackendClient, tournament_id: &str) -> Result<Vec<SpiritScore>> {
    client.select(&spirit_scores_query(tournament_id)).await
}

pub async fn submit_spirit_score(client: &BackendClient, submission: &SpiritSubmission) -> Result<SpiritScore> {
    let rows = client.insert("spirit_scores", &[submission]).await?;
    single(rows, "new spirit score")
}

// --- coaching ---

pub async fn list_sessions(client: &BackendClient) -> Result<Vec<CoachingSession>> {
    let query = TableQuery::new("sessions")
        .order("date", false)
        .order("time", false);
    client.select(&query).await
}

#[derive(Serialize)]
struct SessionInsert<'a> {
    #[serde(flatten)]
    session: &'a NewSession,
    coach_id: &'a str,
}

pub async fn create_session(
    client: &BackendClient,
    ctx: &AuthContext,
    session: &NewSession,
) -> Result<CoachingSession> {
    let rows = client
        .insert(
            "sessions",
            &[SessionInsert {
                session,
                coach_id: ctx.user_id(),
            }],
        )
        .await?;
    single(rows, "new session")
}

pub async fn fetch_session_attendance(client: &BackendClient, session_id: &str) -> Result<Vec<AttendanceRecord>> {
    let query = TableQuery::new("attendance")
        .select("*, child:children(*)")
        .eq("session_id", session_id);
    client.select(&query).await
}

pub async fn fetch_attendance_since(client: &BackendClient, since: DateTime<Utc>) -> Result<Vec<AttendanceRecord>> {
    let query = TableQuery::new("attendance").gte("marked_at", &since.to_rfc3339());
    client.select(&query).await
}

/// One child's presence at a session
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceMark {
    pub child_id: String,
    pub present: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct AttendanceUpsert<'a> {
    session_id: &'a str,
    child_id: &'a str,
    present: bool,
    synced: bool,
}

fn attendance_rows<'a>(session_id: &'a str, marks: &'a [AttendanceMark]) -> Vec<AttendanceUpsert<'a>> {
    marks
        .iter()
        .map(|m| AttendanceUpsert {
            session_id,
            child_id: &m.child_id,
            present: m.present,
            synced: true,
        })
        .collect()
}

/// Save attendance for a session. Re-marking a child overwrites the earlier
/// record instead of duplicating it.
pub async fn mark_attendance(client: &BackendClient, session_id: &str, marks: &[AttendanceMark]) -> Result<()> {
    if marks.is_empty() {
        return Ok(());
    }
    client
        .upsert("attendance", &attendance_rows(session_id, marks), "session_id,child_id")
        .await
}

pub async fn list_children(client: &BackendClient) -> Result<Vec<Child>> {
    client
        .select(&TableQuery::new("children").order("name", true))
        .await
}

pub async fn get_child(client: &BackendClient, id: &str) -> Result<Child> {
    let rows = client.select(&TableQuery::new("children").eq("id", id)).await?;
    single(rows, &format!("child {}", id))
}

pub async fn create_child(client: &BackendClient, child: &NewChild) -> Result<Child> {
    let rows = client.insert("children", &[child]).await?;
    single(rows, "new child")
}

#[derive(Serialize)]
struct ActivePatch {
    active: bool,
}

pub async fn set_child_active(client: &BackendClient, id: &str, active: bool) -> Result<Child> {
    let rows = client
        .update(&TableQuery::new("children").eq("id", id), &ActivePatch { active })
        .await?;
    single(rows, &format!("child {}", id))
}

/// Sessions on or after `since`, for dashboard counts
pub async fn sessions_since(client: &BackendClient, since: NaiveDate) -> Result<Vec<CoachingSession>> {
    let query = TableQuery::new("sessions").gte("date", &since.to_string());
    client.select(&query).await
}

// --- profiles ---

pub async fn fetch_profile(client: &BackendClient, user_id: &str) -> Result<Option<Profile>> {
    let rows = client
        .select(&TableQuery::new("profiles").eq("id", user_id))
        .await?;
    Ok(rows.into_iter().next())
}
