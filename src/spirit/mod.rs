use serde::Serialize;
use std::fmt;

/// Highest mark in any one spirit category
pub const MAX_CATEGORY_SCORE: u32 = 4;

/// Spirit-of-the-game sheet: five categories marked 0 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpiritSheet {
    pub rules: u32,
    pub fouls: u32,
    pub fairness: u32,
    pub attitude: u32,
    pub communication: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpiritError {
    CategoryOutOfRange { category: &'static str, value: u32 },
    SelfAssessment,
    /// The rated team did not play the match
    NotInMatch { team_id: String },
}

impl fmt::Display for SpiritError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiritError::CategoryOutOfRange { category, value } => write!(
                f,
                "Spirit category '{}' must be between 0 and {}, got {}",
                category, MAX_CATEGORY_SCORE, value
            ),
            SpiritError::SelfAssessment => write!(f, "A team cannot submit a spirit score for itself"),
            SpiritError::NotInMatch { team_id } => {
                write!(f, "Team {} did not play in this match", team_id)
            }
        }
    }
}

impl std::error::Error for SpiritError {}

impl SpiritSheet {
    pub fn new(
        rules: u32,
        fouls: u32,
        fairness: u32,
        attitude: u32,
        communication: u32,
    ) -> Result<Self, SpiritError> {
        let sheet = Self {
            rules,
            fouls,
            fairness,
            attitude,
            communication,
        };
        sheet.validate()?;
        Ok(sheet)
    }

    pub fn categories(&self) -> [(&'static str, u32); 5] {
        [
            ("rules", self.rules),
            ("fouls", self.fouls),
            ("fairness", self.fairness),
            ("attitude", self.attitude),
            ("communication", self.communication),
        ]
    }

    pub fn validate(&self) -> Result<(), SpiritError> {
        for (category, value) in self.categories() {
            if value > MAX_CATEGORY_SCORE {
                return Err(SpiritError::CategoryOutOfRange { category, value });
            }
        }
        Ok(())
    }

    pub fn total(&self) -> u32 {
        self.categories().iter().map(|(_, v)| v).sum()
    }
}

/// A spirit score ready to insert. The stored total is computed by the
/// backend and never sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiritSubmission {
    pub match_id: String,
    pub from_team_id: String,
    pub to_team_id: String,
    #[serde(flatten)]
    pub sheet: SpiritSheet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl SpiritSubmission {
    pub fn new(
        match_id: &str,
        from_team_id: &str,
        to_team_id: &str,
        sheet: SpiritSheet,
        comments: Option<String>,
    ) -> Result<Self, SpiritError> {
        if from_team_id == to_team_id {
            return Err(SpiritError::SelfAssessment);
        }
        sheet.validate()?;
        Ok(Self {
            match_id: match_id.to_string(),
            from_team_id: from_team_id.to_string(),
            to_team_id: to_team_id.to_string(),
            sheet,
            comments: comments.filter(|c| !c.trim().is_empty()),
        })
    }

    /// Check both teams actually played the given match
    pub fn check_teams(&self, team_a_id: &str, team_b_id: &str) -> Result<(), SpiritError> {
        for team in [&self.from_team_id, &self.to_team_id] {
            if team != team_a_id && team != team_b_id {
                return Err(SpiritError::NotInMatch {
                    team_id: team.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_total() {
        let sheet = SpiritSheet::new(4, 3, 4, 2, 3).unwrap();
        assert_eq!(sheet.total(), 16);
        assert_eq!(SpiritSheet::new(4, 4, 4, 4, 4).unwrap().total(), 20);
        assert_eq!(SpiritSheet::new(0, 0, 0, 0, 0).unwrap().total(), 0);
    }

    #[test]
    fn test_category_out_of_range() {
        let err = SpiritSheet::new(2, 2, 5, 2, 2).unwrap_err();
        assert_eq!(
            err,
            SpiritError::CategoryOutOfRange {
                category: "fairness",
                value: 5
            }
        );
        assert!(err.to_string().contains("between 0 and 4"));
    }

    #[test]
    fn test_self_assessment_rejected() {
        let sheet = SpiritSheet::new(2, 2, 2, 2, 2).unwrap();
        let err = SpiritSubmission::new("m1", "a", "a", sheet, None).unwrap_err();
        assert_eq!(err, SpiritError::SelfAssessment);
    }

    #[test]
    fn test_submission_payload_has_no_total() {
        let sheet = SpiritSheet::new(3, 3, 3, 3, 3).unwrap();
        let submission =
            SpiritSubmission::new("m1", "a", "b", sheet, Some("great game".to_string())).unwrap();
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["rules"], 3);
        assert_eq!(json["to_team_id"], "b");
        assert_eq!(json["comments"], "great game");
        assert!(json.get("total").is_none());
        assert!(json.get("sheet").is_none());
    }

    #[test]
    fn test_blank_comments_dropped() {
        let sheet = SpiritSheet::new(3, 3, 3, 3, 3).unwrap();
        let submission = SpiritSubmission::new("m1", "a", "b", sheet, Some("  ".to_string())).unwrap();
        assert!(submission.comments.is_none());
    }

    #[test]
    fn test_check_teams() {
        let sheet = SpiritSheet::new(3, 3, 3, 3, 3).unwrap();
        let submission = SpiritSubmission::new("m1", "a", "b", sheet, None).unwrap();
        assert!(submission.check_teams("b", "a").is_ok());
        assert_eq!(
            submission.check_teams("a", "c").unwrap_err(),
            SpiritError::NotInMatch {
                team_id: "b".to_string()
            }
        );
    }
}
