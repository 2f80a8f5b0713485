use owo_colors::OwoColorize;

use super::formatter::format_spirit;
use crate::roles::{CaptainStats, CoachStats, Dashboard, DirectorStats, PlayerStats};

fn stat_line(label: &str, value: impl std::fmt::Display, use_colors: bool) -> String {
    if use_colors {
        format!("  {:<22}{}", label, value.bold())
    } else {
        format!("  {:<22}{}", label, value)
    }
}

fn render_director(stats: &DirectorStats, use_colors: bool) -> Vec<String> {
    let mut lines = vec![
        stat_line("Active tournaments", stats.active_tournaments, use_colors),
        stat_line("Registered teams", stats.registered_teams, use_colors),
        stat_line("Matches today", stats.matches_today, use_colors),
        stat_line("Pending approvals", stats.pending_approvals, use_colors),
    ];
    if stats.live_matches > 0 {
        lines.push(stat_line("Live now", stats.live_matches, use_colors));
    }
    lines.push(String::new());
    lines.push("Next: `y-ultimate teams --pending`, `y-ultimate matches`, `y-ultimate create-tournament`".to_string());
    lines
}

fn render_captain(stats: &CaptainStats, max_spirit_total: f64, use_colors: bool) -> Vec<String> {
    if stats.teams.is_empty() {
        return vec![
            "  You are not captaining any team yet.".to_string(),
            String::new(),
            "Next: `y-ultimate register-team`".to_string(),
        ];
    }

    let mut lines = Vec::new();
    for team in &stats.teams {
        let heading = format!("{} [{}]", team.team_name, team.status);
        lines.push(if use_colors {
            heading.bold().to_string()
        } else {
            heading
        });
        lines.push(stat_line("Upcoming matches", team.upcoming_matches, use_colors));
        let rank = team
            .rank
            .map(|r| format!("#{}", r))
            .unwrap_or_else(|| "-".to_string());
        lines.push(stat_line("Team rank", rank, use_colors));
        let spirit = team
            .spirit_average
            .map(|avg| format_spirit(avg, max_spirit_total))
            .unwrap_or_else(|| "-".to_string());
        lines.push(stat_line("Spirit score", spirit, use_colors));
    }
    lines
}

fn render_coach(stats: &CoachStats, use_colors: bool) -> Vec<String> {
    let attendance = stats
        .attendance_rate
        .map(|rate| format!("{:.0}%", rate * 100.0))
        .unwrap_or_else(|| "-".to_string());
    vec![
        stat_line("Active children", stats.active_children, use_colors),
        stat_line("Sessions this week", stats.sessions_this_week, use_colors),
        stat_line("Attendance this week", attendance, use_colors),
        String::new(),
        "Next: `y-ultimate sessions`, `y-ultimate attendance <SESSION>`, `y-ultimate children`".to_string(),
    ]
}

fn render_player(stats: &PlayerStats, use_colors: bool) -> Vec<String> {
    if stats.open_tournaments.is_empty() {
        return vec!["  No tournaments are running right now.".to_string()];
    }
    let mut lines = vec!["  Active tournaments:".to_string()];
    for t in &stats.open_tournaments {
        let line = format!("    {} ({}, {})", t.name, t.location, t.status);
        lines.push(if use_colors { line.cyan().to_string() } else { line });
    }
    lines.push(String::new());
    lines.push("Next: `y-ultimate standings --tournament <ID>`".to_string());
    lines
}

/// Render a dashboard with a welcome header
pub fn format_dashboard(
    dashboard: &Dashboard,
    display_name: &str,
    max_spirit_total: f64,
    use_colors: bool,
) -> String {
    let title = dashboard.kind().title();
    let mut lines = vec![
        if use_colors {
            title.bold().to_string()
        } else {
            title.to_string()
        },
        format!("Welcome, {}", display_name),
        String::new(),
    ];

    lines.extend(match dashboard {
        Dashboard::TournamentDirector(stats) => render_director(stats, use_colors),
        Dashboard::TeamCaptain(stats) => render_captain(stats, max_spirit_total, use_colors),
        Dashboard::Coach(stats) => render_coach(stats, use_colors),
        Dashboard::Player(stats) => render_player(stats, use_colors),
    });
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::TeamStatus;
    use crate::roles::TeamSummary;

    #[test]
    fn test_director_dashboard() {
        let dashboard = Dashboard::TournamentDirector(DirectorStats {
            active_tournaments: 2,
            registered_teams: 18,
            matches_today: 6,
            pending_approvals: 3,
            live_matches: 0,
        });
        let result = format_dashboard(&dashboard, "Meera", 20.0, false);
        assert!(result.starts_with("Tournament Director Dashboard\nWelcome, Meera"));
        assert!(result.contains("  Pending approvals     3"));
        assert!(!result.contains("Live now"));
    }

    #[test]
    fn test_captain_dashboard() {
        let dashboard = Dashboard::TeamCaptain(CaptainStats {
            teams: vec![
                TeamSummary {
                    team_id: "a".to_string(),
                    team_name: "Sky Walkers".to_string(),
                    status: TeamStatus::Approved,
                    upcoming_matches: 2,
                    rank: Some(4),
                    spirit_average: Some(16.5),
                },
                TeamSummary {
                    team_id: "b".to_string(),
                    team_name: "Late Entry".to_string(),
                    status: TeamStatus::Pending,
                    upcoming_matches: 0,
                    rank: None,
                    spirit_average: None,
                },
            ],
        });
        let result = format_dashboard(&dashboard, "Kiran", 20.0, false);
        assert!(result.contains("Sky Walkers [approved]"));
        assert!(result.contains("#4"));
        assert!(result.contains("16.5/20"));
        assert!(result.contains("Late Entry [pending]"));
    }

    #[test]
    fn test_coach_dashboard_without_attendance() {
        let dashboard = Dashboard::Coach(CoachStats {
            active_children: 40,
            sessions_this_week: 3,
            attendance_rate: None,
        });
        let result = format_dashboard(&dashboard, "Coach", 20.0, false);
        assert!(result.contains("  Attendance this week  -"));

        let dashboard = Dashboard::Coach(CoachStats {
            active_children: 40,
            sessions_this_week: 3,
            attendance_rate: Some(0.875),
        });
        assert!(format_dashboard(&dashboard, "Coach", 20.0, false).contains("88%"));
    }

    #[test]
    fn test_player_dashboard_empty() {
        let dashboard = Dashboard::Player(PlayerStats {
            open_tournaments: vec![],
        });
        let result = format_dashboard(&dashboard, "p@example.org", 20.0, false);
        assert!(result.contains("No tournaments are running right now."));
    }
}
