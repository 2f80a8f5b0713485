pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::types::{Match, MatchStatus};

pub use storage::{get_drafts_path, load_drafts, save_drafts, DraftBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionError {
    pub from: MatchStatus,
    pub to: MatchStatus,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A match cannot go from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// Allowed status moves: start, pause and finish. Saving without a status
/// change is always allowed.
pub fn check_transition(from: MatchStatus, to: MatchStatus) -> Result<(), TransitionError> {
    use MatchStatus::*;
    match (from, to) {
        (a, b) if a == b => Ok(()),
        (Upcoming, Live) | (Live, Upcoming) | (Live, Completed) => Ok(()),
        _ => Err(TransitionError { from, to }),
    }
}

/// Absolute score snapshot written to a match row. Last write wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreUpdate {
    pub team_a_score: u32,
    pub team_b_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
}

/// Local, unsaved score state for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDraft {
    pub match_id: String,
    /// Status of the match row when the draft was started
    pub status: MatchStatus,
    pub saved_a: u32,
    pub saved_b: u32,
    pub team_a_score: u32,
    pub team_b_score: u32,
    #[serde(default)]
    pub pending_status: Option<MatchStatus>,
    pub updated_at: DateTime<Utc>,
}

impl ScoreDraft {
    pub fn from_match(m: &Match) -> Self {
        Self {
            match_id: m.id.clone(),
            status: m.status,
            saved_a: m.team_a_score,
            saved_b: m.team_b_score,
            team_a_score: m.team_a_score,
            team_b_score: m.team_b_score,
            pending_status: None,
            updated_at: Utc::now(),
        }
    }

    fn score_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.team_a_score,
            Side::B => &mut self.team_b_score,
        }
    }

    pub fn increment(&mut self, side: Side) {
        let score = self.score_mut(side);
        *score = score.saturating_add(1);
        self.touch();
    }

    /// Remove a point; never goes below zero
    pub fn decrement(&mut self, side: Side) {
        let score = self.score_mut(side);
        *score = score.saturating_sub(1);
        self.touch();
    }

    pub fn set(&mut self, team_a_score: u32, team_b_score: u32) {
        self.team_a_score = team_a_score;
        self.team_b_score = team_b_score;
        self.touch();
    }

    /// Queue a status change to go out with the next save
    pub fn request_status(&mut self, to: MatchStatus) -> Result<(), TransitionError> {
        check_transition(self.status, to)?;
        self.pending_status = if to == self.status { None } else { Some(to) };
        self.touch();
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.team_a_score != self.saved_a
            || self.team_b_score != self.saved_b
            || self.pending_status.is_some()
    }

    /// Status the match will have once this draft is saved
    pub fn effective_status(&self) -> MatchStatus {
        self.pending_status.unwrap_or(self.status)
    }

    pub fn snapshot(&self) -> ScoreUpdate {
        ScoreUpdate {
            team_a_score: self.team_a_score,
            team_b_score: self.team_b_score,
            status: self.pending_status,
        }
    }

    /// Move the saved baseline to the current server row, keeping the drafted
    /// scores. A queued status that is no longer a legal move from the server
    /// status is rejected and the draft is left as it was.
    pub fn rebase(&mut self, current: &Match) -> Result<(), TransitionError> {
        let target = self.effective_status();
        check_transition(current.status, target)?;
        self.status = current.status;
        self.saved_a = current.team_a_score;
        self.saved_b = current.team_b_score;
        self.pending_status = (target != current.status).then_some(target);
        Ok(())
    }

    /// The server accepted the snapshot; it is now the saved baseline
    pub fn mark_saved(&mut self) {
        self.saved_a = self.team_a_score;
        self.saved_b = self.team_b_score;
        self.status = self.effective_status();
        self.pending_status = None;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
