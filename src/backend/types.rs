use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval state of a team registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TeamStatus::Pending => "pending",
            TeamStatus::Approved => "approved",
            TeamStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Draft,
    RegistrationOpen,
    InProgress,
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::RegistrationOpen => "registration open",
            TournamentStatus::InProgress => "in progress",
            TournamentStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    School,
    Community,
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramType::School => f.write_str("school"),
            ProgramType::Community => f.write_str("community"),
        }
    }
}

/// Account role stored on the user's profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TournamentDirector,
    TeamCaptain,
    Player,
    Coach,
    ProgramManager,
    Volunteer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::TournamentDirector,
        Role::TeamCaptain,
        Role::Player,
        Role::Coach,
        Role::ProgramManager,
        Role::Volunteer,
    ];

    /// Wire name, as stored in the `profiles.role` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TournamentDirector => "tournament_director",
            Role::TeamCaptain => "team_captain",
            Role::Player => "player",
            Role::Coach => "coach",
            Role::ProgramManager => "program_manager",
            Role::Volunteer => "volunteer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Role::ALL.into_iter().find(|r| r.as_str() == normalized)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('_', " "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TournamentStatus,
    pub max_teams: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub tournament_id: String,
    pub name: String,
    pub captain_id: String,
    pub email: String,
    pub phone: String,
    pub status: TeamStatus,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn is_approved(&self) -> bool {
        self.status == TeamStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPlayer {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Id and name of a team embedded in a match row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub tournament_id: String,
    pub team_a_id: String,
    pub team_b_id: String,
    pub field: String,
    pub scheduled_time: DateTime<Utc>,
    pub team_a_score: u32,
    pub team_b_score: u32,
    pub status: MatchStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_a: Option<TeamRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_b: Option<TeamRef>,
}

impl Match {
    pub fn involves(&self, team_id: &str) -> bool {
        self.team_a_id == team_id || self.team_b_id == team_id
    }

    /// Display name for side A, falling back to the raw id
    pub fn team_a_name(&self) -> &str {
        self.team_a.as_ref().map(|t| t.name.as_str()).unwrap_or(&self.team_a_id)
    }

    pub fn team_b_name(&self) -> &str {
        self.team_b.as_ref().map(|t| t.name.as_str()).unwrap_or(&self.team_b_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpiritScore {
    pub id: String,
    pub match_id: String,
    pub from_team_id: String,
    pub to_team_id: String,
    pub rules: u32,
    pub fouls: u32,
    pub fairness: u32,
    pub attitude: u32,
    pub communication: u32,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SpiritScore {
    /// Stored total, or the category sum when the backend has not filled it in.
    /// The web leaderboard counts a missing total as 0 instead.
    pub fn effective_total(&self) -> u32 {
        self.total.unwrap_or(
            self.rules + self.fouls + self.fairness + self.attitude + self.communication,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachingSession {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub coach_id: String,
    pub program_type: ProgramType,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub child_id: String,
    pub present: bool,
    pub marked_at: DateTime<Utc>,
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Child>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub community_id: Option<String>,
    pub parent_name: String,
    pub parent_phone: String,
    #[serde(default)]
    pub parent_whatsapp: Option<String>,
    #[serde(default)]
    pub medical_notes: Option<String>,
    pub join_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Insert payloads. Server-generated columns (ids, timestamps, totals) are
// never sent.

#[derive(Debug, Clone, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TournamentStatus,
    pub max_teams: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTeam {
    pub tournament_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl NewPlayer {
    /// Parse a player given on the command line as `NAME,AGE,GENDER[,EMAIL]`
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() < 3 || parts.len() > 4 {
            anyhow::bail!("Player must be NAME,AGE,GENDER[,EMAIL]: '{}'", s);
        }
        if parts[0].is_empty() {
            anyhow::bail!("Player name cannot be empty: '{}'", s);
        }
        let age: u32 = parts[1]
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid player age '{}' in '{}'", parts[1], s))?;
        Ok(Self {
            name: parts[0].to_string(),
            age,
            gender: parts[2].to_string(),
            email: parts.get(3).filter(|e| !e.is_empty()).map(|e| e.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMatch {
    pub tournament_id: String,
    pub team_a_id: String,
    pub team_b_id: String,
    pub field: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub program_type: ProgramType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChild {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub parent_name: String,
    pub parent_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    pub join_date: NaiveDate,
    pub active: bool,
}
