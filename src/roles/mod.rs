mod load;

pub use load::load_dashboard;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::backend::types::{
    AttendanceRecord, Child, CoachingSession, Match, MatchStatus, Role, Team, TeamStatus,
    Tournament, TournamentStatus,
};

/// Which dashboard a role lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    TournamentDirector,
    TeamCaptain,
    Coach,
    Player,
}

impl DashboardKind {
    /// Signed-in users without a profile row get the player view
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) | Some(Role::TournamentDirector) => DashboardKind::TournamentDirector,
            Some(Role::TeamCaptain) => DashboardKind::TeamCaptain,
            Some(Role::Coach) | Some(Role::ProgramManager) => DashboardKind::Coach,
            Some(Role::Player) | Some(Role::Volunteer) | None => DashboardKind::Player,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DashboardKind::TournamentDirector => "Tournament Director Dashboard",
            DashboardKind::TeamCaptain => "Team Captain Dashboard",
            DashboardKind::Coach => "Coach Dashboard",
            DashboardKind::Player => "Player Dashboard",
        }
    }
}

/// A loaded dashboard: one variant per role group, each with its own figures.
#[derive(Debug, Clone)]
pub enum Dashboard {
    TournamentDirector(DirectorStats),
    TeamCaptain(CaptainStats),
    Coach(CoachStats),
    Player(PlayerStats),
}

impl Dashboard {
    pub fn kind(&self) -> DashboardKind {
        match self {
            Dashboard::TournamentDirector(_) => DashboardKind::TournamentDirector,
            Dashboard::TeamCaptain(_) => DashboardKind::TeamCaptain,
            Dashboard::Coach(_) => DashboardKind::Coach,
            Dashboard::Player(_) => DashboardKind::Player,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectorStats {
    pub active_tournaments: usize,
    pub registered_teams: usize,
    pub matches_today: usize,
    pub pending_approvals: usize,
    pub live_matches: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub team_id: String,
    pub team_name: String,
    pub status: TeamStatus,
    pub upcoming_matches: usize,
    /// Combined leaderboard position, once the team is approved
    pub rank: Option<usize>,
    pub spirit_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainStats {
    pub teams: Vec<TeamSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoachStats {
    pub active_children: usize,
    pub sessions_this_week: usize,
    /// Share of attendance marks this week that were "present"
    pub attendance_rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PlayerStats {
    pub open_tournaments: Vec<Tournament>,
}

// --- what each role may do ---

pub fn can_create_tournaments(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin) | Some(Role::TournamentDirector))
}

pub fn can_score_matches(role: Option<Role>) -> bool {
    matches!(
        role,
        Some(Role::Admin) | Some(Role::TournamentDirector) | Some(Role::Volunteer)
    )
}

pub fn can_manage_teams(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin) | Some(Role::TournamentDirector))
}

pub fn can_manage_coaching(role: Option<Role>) -> bool {
    matches!(
        role,
        Some(Role::Admin) | Some(Role::Coach) | Some(Role::ProgramManager)
    )
}

/// Fail with a readable message when the role lacks a permission
pub fn require(allowed: bool, action: &str) -> anyhow::Result<()> {
    if allowed {
        Ok(())
    } else {
        anyhow::bail!("Your role does not allow you to {}", action)
    }
}

// --- dashboard figures ---

pub fn is_active_tournament(t: &Tournament) -> bool {
    matches!(
        t.status,
        TournamentStatus::RegistrationOpen | TournamentStatus::InProgress
    )
}

pub fn active_tournaments(tournaments: &[Tournament]) -> usize {
    tournaments.iter().filter(|t| is_active_tournament(t)).count()
}

pub fn pending_approvals(teams: &[Team]) -> usize {
    teams.iter().filter(|t| t.status == TeamStatus::Pending).count()
}

pub fn matches_on(matches: &[Match], day: NaiveDate) -> usize {
    matches
        .iter()
        .filter(|m| m.scheduled_time.date_naive() == day)
        .count()
}

pub fn live_matches(matches: &[Match]) -> usize {
    matches.iter().filter(|m| m.status == MatchStatus::Live).count()
}

pub fn upcoming_matches_for(matches: &[Match], team_id: &str) -> usize {
    matches
        .iter()
        .filter(|m| m.status == MatchStatus::Upcoming && m.involves(team_id))
        .count()
}

pub fn active_children(children: &[Child]) -> usize {
    children.iter().filter(|c| c.active).count()
}

/// Monday of the week containing `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

pub fn week_start_utc(day: NaiveDate) -> DateTime<Utc> {
    week_start(day).and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn sessions_in_week(sessions: &[CoachingSession], day: NaiveDate) -> usize {
    let start = week_start(day);
    let end = start + Duration::days(7);
    sessions
        .iter()
        .filter(|s| s.date >= start && s.date < end)
        .count()
}

pub fn attendance_rate(records: &[AttendanceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let present = records.iter().filter(|r| r.present).count();
    Some(present as f64 / records.len() as f64)
}
