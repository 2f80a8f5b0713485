use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use super::formatter::{format_age, truncate};
use crate::backend::types::{
    AttendanceRecord, Child, CoachingSession, Match, MatchStatus, Team, TeamPlayer, TeamStatus,
    Tournament,
};
use crate::live::ScoreDraft;

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%a %d %b %H:%M").to_string()
}

fn team_status_label(status: TeamStatus, use_colors: bool) -> String {
    let label = format!("[{}]", status);
    if !use_colors {
        return label;
    }
    match status {
        TeamStatus::Approved => label.green().to_string(),
        TeamStatus::Pending => label.yellow().to_string(),
        TeamStatus::Rejected => label.red().to_string(),
    }
}

fn match_status_label(status: MatchStatus, use_colors: bool) -> String {
    let label = format!("[{}]", status);
    if !use_colors {
        return label;
    }
    match status {
        MatchStatus::Live => label.red().bold().to_string(),
        MatchStatus::Upcoming => label.dimmed().to_string(),
        MatchStatus::Completed => label.green().to_string(),
    }
}

/// One line per tournament: name | location | dates | status | id
pub fn format_tournament_list(tournaments: &[Tournament], use_colors: bool) -> String {
    if tournaments.is_empty() {
        return "No tournaments found.".to_string();
    }

    tournaments
        .iter()
        .map(|t| {
            let dates = format!("{} to {}", t.start_date, t.end_date);
            if use_colors {
                format!(
                    "{} | {} | {} | {} | {}",
                    t.name.bold(),
                    t.location.cyan(),
                    dates,
                    t.status.to_string().yellow(),
                    t.id.dimmed()
                )
            } else {
                format!("{} | {} | {} | {} | {}", t.name, t.location, dates, t.status, t.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_team_list(teams: &[Team], use_colors: bool) -> String {
    if teams.is_empty() {
        return "No teams registered.".to_string();
    }

    teams
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            let status = team_status_label(team.status, use_colors);
            if use_colors {
                format!(
                    "{:>2}. {} {} | {} | {} | {}",
                    idx + 1,
                    team.name.bold(),
                    status,
                    team.email,
                    team.phone,
                    team.id.dimmed()
                )
            } else {
                format!(
                    "{:>2}. {} {} | {} | {} | {}",
                    idx + 1,
                    team.name,
                    status,
                    team.email,
                    team.phone,
                    team.id
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_player_list(players: &[TeamPlayer]) -> String {
    if players.is_empty() {
        return "    (no players listed)".to_string();
    }
    players
        .iter()
        .map(|p| match &p.email {
            Some(email) => format!("    {} ({}, {}) {}", p.name, p.age, p.gender, email),
            None => format!("    {} ({}, {})", p.name, p.age, p.gender),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_scoreline(m: &Match, team_a_score: u32, team_b_score: u32) -> String {
    format!(
        "{} {} - {} {}",
        m.team_a_name(),
        team_a_score,
        team_b_score,
        m.team_b_name()
    )
}

/// Matches in schedule order: time, field, scoreline, status, id
pub fn format_match_list(matches: &[Match], use_colors: bool) -> String {
    if matches.is_empty() {
        return "No matches scheduled.".to_string();
    }

    matches
        .iter()
        .map(|m| {
            let when = local_time(m.scheduled_time);
            let field = format!("Field {}", truncate(&m.field, 8));
            let score = format_scoreline(m, m.team_a_score, m.team_b_score);
            let status = match_status_label(m.status, use_colors);
            if use_colors {
                format!("{}  {}  {}  {}  {}", when.dimmed(), field, score.bold(), status, m.id.dimmed())
            } else {
                format!("{}  {}  {}  {}  {}", when, field, score, status, m.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A match with its saved score and, if any, the unsaved local draft
pub fn format_match_detail(m: &Match, draft: Option<&ScoreDraft>, use_colors: bool) -> String {
    let mut lines = vec![
        format_scoreline(m, m.team_a_score, m.team_b_score),
        format!("  Status: {}", m.status),
        format!("  Field: {}", m.field),
        format!("  Scheduled: {}", local_time(m.scheduled_time)),
    ];
    if use_colors {
        lines[0] = lines[0].bold().to_string();
    }

    if let Some(draft) = draft.filter(|d| d.is_dirty()) {
        let mut pending = format!(
            "  Unsaved: {}",
            format_scoreline(m, draft.team_a_score, draft.team_b_score)
        );
        if let Some(status) = draft.pending_status {
            pending.push_str(&format!(" -> {}", status));
        }
        let age = format_age(Utc::now() - draft.updated_at);
        if age == "now" {
            pending.push_str(" (edited just now)");
        } else {
            pending.push_str(&format!(" (edited {} ago)", age));
        }
        lines.push(if use_colors {
            pending.yellow().to_string()
        } else {
            pending
        });
    }

    lines.join("\n")
}

pub fn format_session_list(sessions: &[CoachingSession], use_colors: bool) -> String {
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }

    sessions
        .iter()
        .map(|s| {
            let when = format!("{} {}", s.date.format("%a %d %b %Y"), s.time.format("%H:%M"));
            if use_colors {
                format!("{} | {} | {} | {}", when.bold(), s.location, s.program_type.cyan(), s.id.dimmed())
            } else {
                format!("{} | {} | {} | {}", when, s.location, s.program_type, s.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Attendance sheet: one child per line, then a present count
pub fn format_attendance(records: &[AttendanceRecord], use_colors: bool) -> String {
    if records.is_empty() {
        return "No attendance marked for this session.".to_string();
    }

    let mut lines: Vec<String> = records
        .iter()
        .map(|r| {
            let name = r
                .child
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or(&r.child_id);
            let mark = if r.present { "present" } else { "absent" };
            let mark = if use_colors {
                if r.present {
                    mark.green().to_string()
                } else {
                    mark.red().to_string()
                }
            } else {
                mark.to_string()
            };
            let unsynced = if r.synced { "" } else { " (not synced)" };
            format!("  {}  {}{}", mark, name, unsynced)
        })
        .collect();

    let present = records.iter().filter(|r| r.present).count();
    lines.push(format!("{}/{} present", present, records.len()));
    lines.join("\n")
}

pub fn format_child_list(children: &[Child], use_colors: bool) -> String {
    if children.is_empty() {
        return "No children enrolled.".to_string();
    }

    children
        .iter()
        .map(|c| {
            let inactive = if c.active { "" } else { " [inactive]" };
            let parent = format!("{} {}", c.parent_name, c.parent_phone);
            if use_colors {
                format!(
                    "{} ({}, {}){} | {} | joined {} | {}",
                    c.name.bold(),
                    c.age,
                    c.gender,
                    inactive.dimmed(),
                    parent,
                    c.join_date,
                    c.id.dimmed()
                )
            } else {
                format!(
                    "{} ({}, {}){} | {} | joined {} | {}",
                    c.name, c.age, c.gender, inactive, parent, c.join_date, c.id
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
