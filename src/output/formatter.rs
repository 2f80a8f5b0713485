use chrono::Duration;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::standings::{
    CombinedStanding, PerformanceStanding, SpiritStanding, Standings, StandingsConfig, StandingsView,
};

const NO_TEAMS: &str = "No approved teams yet.";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, counting chars rather than bytes
pub fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Width for the team name column: the longest name, squeezed to fit the
/// terminal when there is one.
fn name_column_width<'a>(names: impl Iterator<Item = &'a str>, fixed_width: usize) -> usize {
    let longest = names.map(|n| n.chars().count()).max().unwrap_or(0).max(4);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        Some(_) => longest.min(20),
        None => longest,
    }
}

/// "+12", "-3", "0"
pub fn format_point_diff(diff: i64) -> String {
    if diff > 0 {
        format!("+{}", diff)
    } else {
        diff.to_string()
    }
}

/// "3W-1L", or "3W-1L-1D" when draws are recorded
pub fn format_record(wins: u32, losses: u32, draws: u32) -> String {
    if draws > 0 {
        format!("{}W-{}L-{}D", wins, losses, draws)
    } else {
        format!("{}W-{}L", wins, losses)
    }
}

/// "18.0/20"
pub fn format_spirit(average: f64, max_total: f64) -> String {
    format!("{:.1}/{}", average, max_total)
}

pub fn format_composite(score: f64) -> String {
    format!("{:.1}", score)
}

fn rank(idx: usize) -> String {
    format!("{:>2}.", idx + 1)
}

/// Performance table: rank, team, W, L, [D,] PF, PA, Diff
pub fn format_performance_table(rows: &[PerformanceStanding], use_colors: bool) -> String {
    if rows.is_empty() {
        return NO_TEAMS.to_string();
    }

    let show_draws = rows.iter().any(|r| r.draws > 0);
    let numbers_width = if show_draws { 30 } else { 25 };
    let name_width = name_column_width(rows.iter().map(|r| r.team_name.as_str()), numbers_width + 6);

    let mut header = format!("    {}  {:>3} {:>3}", pad("Team", name_width), "W", "L");
    if show_draws {
        header.push_str(&format!(" {:>3}", "D"));
    }
    header.push_str(&format!(" {:>5} {:>5} {:>6}", "PF", "PA", "Diff"));

    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for (idx, row) in rows.iter().enumerate() {
        let name = pad(&truncate(&row.team_name, name_width), name_width);
        let mut numbers = format!("{:>3} {:>3}", row.wins, row.losses);
        if show_draws {
            numbers.push_str(&format!(" {:>3}", row.draws));
        }
        numbers.push_str(&format!(" {:>5} {:>5}", row.points_for, row.points_against));
        let diff = format!("{:>6}", format_point_diff(row.point_differential()));

        let line = if use_colors {
            let diff = match row.point_differential() {
                d if d > 0 => diff.green().to_string(),
                d if d < 0 => diff.red().to_string(),
                _ => diff,
            };
            format!("{} {}  {} {}", rank(idx).dimmed(), name.bold(), numbers, diff)
        } else {
            format!("{} {}  {} {}", rank(idx), name, numbers, diff)
        };
        lines.push(line);
    }
    lines.join("\n")
}

/// Spirit list: rank, team, average out of the maximum, number of sheets
pub fn format_spirit_table(rows: &[SpiritStanding], max_total: f64, use_colors: bool) -> String {
    if rows.is_empty() {
        return NO_TEAMS.to_string();
    }

    let name_width = name_column_width(rows.iter().map(|r| r.team_name.as_str()), 28);

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let name = pad(&truncate(&row.team_name, name_width), name_width);
            let spirit = format!("{:>8}", format_spirit(row.average, max_total));
            let count = format!(
                "{} score{}",
                row.scores_received,
                if row.scores_received == 1 { "" } else { "s" }
            );
            if use_colors {
                format!("{} {}  {}  {}", rank(idx).dimmed(), name.bold(), spirit.cyan(), count.dimmed())
            } else {
                format!("{} {}  {}  {}", rank(idx), name, spirit, count)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line explanation of how a combined score was reached
pub fn format_breakdown(row: &CombinedStanding, config: &StandingsConfig) -> String {
    format!(
        "performance {} ({}/{} wins) + spirit {} ({})",
        format_composite(row.performance_component),
        row.wins,
        row.max_wins,
        format_composite(row.spirit_component),
        format_spirit(row.spirit_average, config.max_spirit_total)
    )
}

/// Combined list: rank, composite score, team; with `verbose` each row is
/// followed by its breakdown.
pub fn format_combined_table(
    rows: &[CombinedStanding],
    config: &StandingsConfig,
    verbose: bool,
    use_colors: bool,
) -> String {
    if rows.is_empty() {
        return NO_TEAMS.to_string();
    }

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let score = format!("{:>6}", format_composite(row.composite));
            let mut line = if use_colors {
                format!("{} {}  {}", rank(idx).dimmed(), score.bold(), row.team_name)
            } else {
                format!("{} {}  {}", rank(idx), score, row.team_name)
            };
            if verbose {
                let breakdown = format!("           {}", format_breakdown(row, config));
                line.push('\n');
                if use_colors {
                    line.push_str(&breakdown.dimmed().to_string());
                } else {
                    line.push_str(&breakdown);
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_standings(
    standings: &Standings,
    view: StandingsView,
    config: &StandingsConfig,
    verbose: bool,
    use_colors: bool,
) -> String {
    match view {
        StandingsView::Combined => format_combined_table(&standings.combined, config, verbose, use_colors),
        StandingsView::Performance => format_performance_table(&standings.performance, use_colors),
        StandingsView::Spirit => format_spirit_table(&standings.spirit, config.max_spirit_total, use_colors),
    }
}

/// Tab-separated values for scripting (no headers, no colors)
///
/// Columns by view:
/// - combined: rank, composite, team, performance part, spirit part
/// - performance: rank, team, wins, losses, draws, points for, points against, diff
/// - spirit: rank, team, average, scores received
pub fn format_tsv(standings: &Standings, view: StandingsView) -> String {
    let lines: Vec<String> = match view {
        StandingsView::Combined => standings
            .combined
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "{}\t{:.2}\t{}\t{:.2}\t{:.2}",
                    i + 1,
                    r.composite,
                    r.team_name,
                    r.performance_component,
                    r.spirit_component
                )
            })
            .collect(),
        StandingsView::Performance => standings
            .performance
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    i + 1,
                    r.team_name,
                    r.wins,
                    r.losses,
                    r.draws,
                    r.points_for,
                    r.points_against,
                    r.point_differential()
                )
            })
            .collect(),
        StandingsView::Spirit => standings
            .spirit
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}\t{}\t{:.2}\t{}", i + 1, r.team_name, r.average, r.scores_received))
            .collect(),
    };
    lines.join("\n")
}

/// All three views as one JSON document
pub fn format_json(standings: &Standings) -> serde_json::Result<String> {
    let performance: Vec<serde_json::Value> = standings
        .performance
        .iter()
        .enumerate()
        .map(|(i, r)| {
            serde_json::json!({
                "rank": i + 1,
                "team_id": r.team_id,
                "team_name": r.team_name,
                "wins": r.wins,
                "losses": r.losses,
                "draws": r.draws,
                "games_played": r.games_played(),
                "points_for": r.points_for,
                "points_against": r.points_against,
                "point_differential": r.point_differential(),
            })
        })
        .collect();
    let spirit: Vec<serde_json::Value> = standings
        .spirit
        .iter()
        .enumerate()
        .map(|(i, r)| {
            serde_json::json!({
                "rank": i + 1,
                "team_id": r.team_id,
                "team_name": r.team_name,
                "average": r.average,
                "scores_received": r.scores_received,
            })
        })
        .collect();
    let combined: Vec<serde_json::Value> = standings
        .combined
        .iter()
        .enumerate()
        .map(|(i, r)| {
            serde_json::json!({
                "rank": i + 1,
                "team_id": r.team_id,
                "team_name": r.team_name,
                "composite": r.composite,
                "performance_component": r.performance_component,
                "spirit_component": r.spirit_component,
            })
        })
        .collect();

    serde_json::to_string_pretty(&serde_json::json!({
        "performance": performance,
        "spirit": spirit,
        "combined": combined,
    }))
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(id: &str, wins: u32, losses: u32, draws: u32, pf: u32, pa: u32) -> PerformanceStanding {
        PerformanceStanding {
            team_id: id.to_string(),
            team_name: format!("Team {}", id.to_uppercase()),
            wins,
            losses,
            draws,
            points_for: pf,
            points_against: pa,
        }
    }

    fn sample_standings() -> Standings {
        Standings {
            performance: vec![perf("a", 3, 1, 0, 55, 43), perf("b", 1, 3, 0, 40, 52)],
            spirit: vec![
                SpiritStanding {
                    team_id: "b".to_string(),
                    team_name: "Team B".to_string(),
                    average: 19.0,
                    scores_received: 1,
                },
                SpiritStanding {
                    team_id: "a".to_string(),
                    team_name: "Team A".to_string(),
                    average: 18.0,
                    scores_received: 4,
                },
            ],
            combined: vec![CombinedStanding {
                team_id: "a".to_string(),
                team_name: "Team A".to_string(),
                wins: 3,
                max_wins: 3,
                spirit_average: 18.0,
                performance_component: 70.0,
                spirit_component: 27.0,
                composite: 97.0,
            }],
        }
    }

    #[test]
    fn test_format_point_diff() {
        assert_eq!(format_point_diff(12), "+12");
        assert_eq!(format_point_diff(-3), "-3");
        assert_eq!(format_point_diff(0), "0");
    }

    #[test]
    fn test_format_record() {
        assert_eq!(format_record(3, 1, 0), "3W-1L");
        assert_eq!(format_record(2, 1, 1), "2W-1L-1D");
    }

    #[test]
    fn test_format_spirit() {
        assert_eq!(format_spirit(18.0, 20.0), "18.0/20");
        assert_eq!(format_spirit(13.333, 20.0), "13.3/20");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Short", 20), "Short");
        assert_eq!(truncate("Discs of Fury Ultimate", 10), "Discs o...");
        assert_eq!(truncate("Hello", 3), "Hel");
    }

    #[test]
    fn test_empty_tables() {
        let config = StandingsConfig::default();
        assert_eq!(format_performance_table(&[], false), "No approved teams yet.");
        assert_eq!(format_spirit_table(&[], 20.0, false), "No approved teams yet.");
        assert_eq!(format_combined_table(&[], &config, false, false), "No approved teams yet.");
        assert_eq!(format_tsv(&Standings::default(), StandingsView::Spirit), "");
    }

    #[test]
    fn test_performance_table() {
        let standings = sample_standings();
        let result = format_performance_table(&standings.performance, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Diff"));
        assert!(!lines[0].contains(" D "));
        assert!(lines[1].starts_with(" 1."));
        assert!(lines[1].contains("Team A"));
        assert!(lines[1].trim_end().ends_with("+12"));
        assert!(lines[2].trim_end().ends_with("-12"));
    }

    #[test]
    fn test_performance_table_shows_draw_column() {
        let rows = vec![perf("a", 1, 0, 1, 20, 15)];
        let result = format_performance_table(&rows, false);
        assert!(result.lines().next().unwrap().contains("  D"));
    }

    #[test]
    fn test_spirit_table() {
        let standings = sample_standings();
        let result = format_spirit_table(&standings.spirit, 20.0, false);
        let lines: Vec<&str> = result.lines().collect();
        assert!(lines[0].contains("Team B"));
        assert!(lines[0].contains("19.0/20"));
        assert!(lines[0].ends_with("1 score"));
        assert!(lines[1].ends_with("4 scores"));
    }

    #[test]
    fn test_combined_table_with_breakdown() {
        let standings = sample_standings();
        let config = StandingsConfig::default();
        let plain = format_combined_table(&standings.combined, &config, false, false);
        assert_eq!(plain, " 1.   97.0  Team A");

        let verbose = format_combined_table(&standings.combined, &config, true, false);
        assert!(verbose.contains("performance 70.0 (3/3 wins) + spirit 27.0 (18.0/20)"));
    }

    #[test]
    fn test_format_tsv_performance() {
        let result = format_tsv(&sample_standings(), StandingsView::Performance);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "1\tTeam A\t3\t1\t0\t55\t43\t12");
        assert_eq!(lines[1].split('\t').count(), 8);
    }

    #[test]
    fn test_format_tsv_combined() {
        let result = format_tsv(&sample_standings(), StandingsView::Combined);
        assert_eq!(result, "1\t97.00\tTeam A\t70.00\t27.00");
    }

    #[test]
    fn test_format_json() {
        let json = format_json(&sample_standings()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["performance"][0]["point_differential"], 12);
        assert_eq!(value["performance"][0]["games_played"], 4);
        assert_eq!(value["spirit"][0]["team_id"], "b");
        assert_eq!(value["combined"][0]["composite"], 97.0);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
        assert_eq!(format_age(Duration::minutes(30)), "30m");
        assert_eq!(format_age(Duration::hours(3)), "3h");
        assert_eq!(format_age(Duration::days(2)), "2d");
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }
}
