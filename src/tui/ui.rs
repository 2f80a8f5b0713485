use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::time::Duration;

use crate::output::{format_composite, format_point_diff, format_record, format_spirit, truncate};
use crate::standings::StandingsView;
use crate::tui::app::{App, FlashKind, InputMode};
use crate::tui::theme::ThemeColors;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if area.height < 6 || area.width < 30 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Title(1) + Tabs(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    render_table(frame, chunks[2], app);
    render_status_bar(frame, chunks[3], app);

    match app.input_mode {
        InputMode::Help => render_help_popup(frame, &app.theme),
        InputMode::Breakdown => render_breakdown_popup(frame, app),
        InputMode::Normal => {}
    }

    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let left = format!("Y-Ultimate · {}", app.title());
    let mut spans = vec![Span::styled(left.clone(), Style::default().fg(theme.title_color).bold())];

    let weights = format!(
        "perf {}% / spirit {}%",
        app.standings_config.performance_weight, app.standings_config.spirit_weight
    );
    let padding = (area.width as usize).saturating_sub(left.chars().count() + weights.len());
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(weights, Style::default().fg(theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<&str> = StandingsView::ALL.iter().map(|v| v.title()).collect();
    let selected = StandingsView::ALL
        .iter()
        .position(|v| *v == app.view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style)
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn rank_cell(rank: usize, theme: &ThemeColors) -> Cell<'static> {
    let style = match theme.rank_color(rank) {
        Some(color) => Style::default().fg(color).bold(),
        None => Style::default().fg(theme.index_color),
    };
    Cell::from(format!("{}.", rank)).style(style)
}

fn row_style(idx: usize, theme: &ThemeColors) -> Style {
    if idx % 2 == 1 {
        Style::default().bg(theme.row_alt_bg)
    } else {
        Style::default()
    }
}

fn render_table(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.row_count() == 0 {
        let msg = if app.is_loading {
            ""
        } else {
            "No approved teams yet"
        };
        frame.render_widget(Paragraph::new(msg).alignment(Alignment::Center), area);
        return;
    }

    let table = match app.view {
        StandingsView::Combined => combined_table(app),
        StandingsView::Performance => performance_table(app),
        StandingsView::Spirit => spirit_table(app),
    };

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn combined_table(app: &App) -> Table<'static> {
    let theme = &app.theme;
    let max_spirit = app.standings_config.max_spirit_total;

    let rows: Vec<Row> = app
        .standings
        .combined
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut composite = vec![Span::styled(
                format!("{:>6} ", format_composite(row.composite)),
                Style::default().fg(theme.level_color(row.composite, 100.0)),
            )];
            composite.extend(level_bar(row.composite, 100.0, 10, theme).spans);

            Row::new(vec![
                rank_cell(idx + 1, theme),
                Cell::from(truncate(&row.team_name, 40)),
                Cell::from(format!("{}/{}", row.wins, row.max_wins)),
                Cell::from(format_spirit(row.spirit_average, max_spirit))
                    .style(Style::default().fg(theme.level_color(row.spirit_average, max_spirit))),
                Cell::from(Line::from(composite)),
            ])
            .style(row_style(idx, theme))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(18),
    ];

    Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Team", "Wins", "Spirit", "Composite"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected)
}

fn performance_table(app: &App) -> Table<'static> {
    let theme = &app.theme;
    let show_draws = app.standings.performance.iter().any(|r| r.draws > 0);

    let rows: Vec<Row> = app
        .standings
        .performance
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let diff = row.point_differential();
            Row::new(vec![
                rank_cell(idx + 1, theme),
                Cell::from(truncate(&row.team_name, 40)),
                Cell::from(format_record(row.wins, row.losses, row.draws)),
                Cell::from(format!("{}-{}", row.points_for, row.points_against)),
                Cell::from(format_point_diff(diff)).style(Style::default().fg(theme.diff_color(diff))),
            ])
            .style(row_style(idx, theme))
        })
        .collect();

    let record_width = if show_draws { 13 } else { 9 };
    let widths = [
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(record_width),
        Constraint::Length(9),
        Constraint::Length(6),
    ];

    Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Team", "Record", "Points", "Diff"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected)
}

fn spirit_table(app: &App) -> Table<'static> {
    let theme = &app.theme;
    let max_spirit = app.standings_config.max_spirit_total;

    let rows: Vec<Row> = app
        .standings
        .spirit
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut average = vec![Span::styled(
                format!("{:>8} ", format_spirit(row.average, max_spirit)),
                Style::default().fg(theme.level_color(row.average, max_spirit)),
            )];
            average.extend(level_bar(row.average, max_spirit, 10, theme).spans);

            Row::new(vec![
                rank_cell(idx + 1, theme),
                Cell::from(truncate(&row.team_name, 40)),
                Cell::from(Line::from(average)),
                Cell::from(row.scores_received.to_string()).style(Style::default().fg(theme.muted)),
            ])
            .style(row_style(idx, theme))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(20),
        Constraint::Length(7),
    ];

    Table::new(rows, widths)
        .header(
            Row::new(vec!["#", "Team", "Average", "Sheets"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(theme.row_selected)
}

fn level_bar(value: f64, max: f64, width: usize, theme: &ThemeColors) -> Line<'static> {
    let ratio = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled(
            "█".repeat(filled),
            Style::default().fg(theme.level_color(value, max)),
        ));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(theme.bar_empty)));
    }
    Line::from(spans)
}

/// "refreshed 12s ago", to the second
fn refreshed_ago(elapsed: Duration) -> String {
    let secs = Duration::from_secs(elapsed.as_secs());
    if secs.is_zero() {
        "refreshed just now".to_string()
    } else {
        format!("refreshed {} ago", humantime::format_duration(secs))
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;

    let text = if let Some(flash) = &app.flash {
        let color = match flash.kind {
            FlashKind::Info => theme.flash_info,
            FlashKind::Success => theme.flash_success,
            FlashKind::Error => theme.flash_error,
        };
        Line::from(Span::styled(flash.text.clone(), Style::default().fg(color)))
    } else {
        let count = format!("{} teams", app.row_count());
        let refreshed = app
            .last_refresh
            .map(|at| refreshed_ago(at.elapsed()))
            .unwrap_or_else(|| "not loaded".to_string());

        let hints = [
            ("j/k", ":nav"),
            ("Tab", ":view"),
            ("b", ":breakdown"),
            ("o", ":open"),
            ("r", ":refresh"),
            ("?", ":help"),
            ("q", ":quit"),
        ];

        let mut spans = vec![
            Span::styled(count, Style::default().fg(theme.muted)),
            Span::raw(" "),
            Span::styled(refreshed, Style::default().fg(theme.muted)),
            Span::raw("  "),
        ];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Centered rectangle with fixed width and height, clamped to `area`
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect { x, y, width, height }
}

fn popup_block(title: String, theme: &ThemeColors) -> Block<'static> {
    Block::bordered()
        .title(Span::styled(title, theme.popup_title))
        .border_style(Style::default().fg(theme.popup_border))
        .style(Style::default().bg(theme.popup_bg))
}

fn render_breakdown_popup(frame: &mut Frame, app: &App) {
    let Some(row) = app.selected_combined() else {
        return;
    };
    let theme = &app.theme;
    let config = &app.standings_config;

    let popup_area = centered_rect_fixed(56, 10, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block(format!(" {} ", truncate(&row.team_name, 40)), theme);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let label = Style::default().fg(theme.status_key_color).bold();
    let lines = vec![
        Line::from(vec![
            Span::styled("Performance  ", label),
            Span::raw(format!(
                "{} / {} wins × {}% = {}",
                row.wins,
                row.max_wins,
                config.performance_weight,
                format_composite(row.performance_component)
            )),
        ]),
        Line::from(vec![
            Span::styled("Spirit       ", label),
            Span::raw(format!(
                "{} × {}% = {}",
                format_spirit(row.spirit_average, config.max_spirit_total),
                config.spirit_weight,
                format_composite(row.spirit_component)
            )),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Composite    ", label),
            Span::styled(
                format_composite(row.composite),
                Style::default().fg(theme.level_color(row.composite, 100.0)).bold(),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("Esc/b: close  j/k: next team", Style::default().fg(theme.muted))),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help_popup(frame: &mut Frame, theme: &ThemeColors) {
    let popup_area = centered_rect_fixed(50, 15, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = popup_block(" Keyboard Shortcuts ".to_string(), theme);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(theme.status_key_color).bold();
    let entries = [
        ("j / Down      ", "Next team"),
        ("k / Up        ", "Previous team"),
        ("g / G         ", "First / last team"),
        ("Tab / S-Tab   ", "Next / previous leaderboard"),
        ("1 2 3         ", "Combined / Performance / Spirit"),
        ("b / Enter     ", "Composite breakdown"),
        ("o             ", "Open leaderboard in browser"),
        ("r             ", "Refresh now"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, action)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*action)]))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(theme.muted),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered().border_style(Style::default().fg(app.theme.popup_border));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
    let text = if app.last_refresh.is_none() {
        format!("{} Loading standings...", spinner)
    } else {
        format!("{} Refreshing...", spinner)
    };

    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.title_color)),
        inner,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(50, 10, area), Rect::new(25, 15, 50, 10));
        // Clamped to a small terminal
        let small = Rect::new(0, 0, 30, 6);
        assert_eq!(centered_rect_fixed(50, 10, small), Rect::new(0, 0, 30, 6));
    }

    #[test]
    fn test_level_bar_widths() {
        let theme = ThemeColors::dark();
        let full = level_bar(100.0, 100.0, 10, &theme);
        assert_eq!(full.spans.len(), 1);
        assert_eq!(full.spans[0].content, "█".repeat(10));

        let half = level_bar(10.0, 20.0, 10, &theme);
        assert_eq!(half.spans[0].content, "█".repeat(5));
        assert_eq!(half.spans[1].content, "░".repeat(5));

        let empty = level_bar(0.0, 0.0, 4, &theme);
        assert_eq!(empty.spans.len(), 1);
        assert_eq!(empty.spans[0].content, "░".repeat(4));
    }

    #[test]
    fn test_refreshed_ago() {
        assert_eq!(refreshed_ago(Duration::from_millis(400)), "refreshed just now");
        assert_eq!(refreshed_ago(Duration::from_millis(12_700)), "refreshed 12s ago");
        assert_eq!(refreshed_ago(Duration::from_secs(90)), "refreshed 1m 30s ago");
    }
}
