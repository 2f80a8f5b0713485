//! Color palettes for the leaderboard TUI

use ratatui::prelude::*;

/// Which palette to draw with. `Auto` asks the terminal for its background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Composite / spirit levels
    pub level_high: Color,
    pub level_mid: Color,
    pub level_low: Color,
    pub bar_empty: Color,

    // Podium
    pub rank_first: Color,
    pub rank_second: Color,
    pub rank_third: Color,

    // Point differential
    pub diff_positive: Color,
    pub diff_negative: Color,

    // Table
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub header_style: Style,
    pub row_selected: Style,

    pub muted: Color,
    pub title_color: Color,

    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Status bar
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_info: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popups
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            level_high: Color::Green,
            level_mid: Color::Yellow,
            level_low: Color::Red,
            bar_empty: Color::DarkGray,
            rank_first: Color::Rgb(255, 215, 0),
            rank_second: Color::Rgb(192, 192, 192),
            rank_third: Color::Rgb(205, 127, 50),
            diff_positive: Color::Green,
            diff_negative: Color::Red,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            tab_active_style: Style::new().fg(Color::Cyan).bold().reversed(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_info: Color::White,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
        }
    }

    pub fn light() -> Self {
        Self {
            level_high: Color::Rgb(0, 120, 0),
            level_mid: Color::Rgb(170, 110, 0),
            level_low: Color::Rgb(180, 0, 0),
            bar_empty: Color::Indexed(250),
            rank_first: Color::Rgb(184, 134, 11),
            rank_second: Color::Rgb(112, 112, 112),
            rank_third: Color::Rgb(160, 82, 45),
            diff_positive: Color::Rgb(0, 120, 0),
            diff_negative: Color::Rgb(180, 0, 0),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(244),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Indexed(242),
            title_color: Color::Blue,
            tab_active_style: Style::new().fg(Color::Blue).bold().reversed(),
            tab_inactive_style: Style::new().fg(Color::Indexed(244)),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_info: Color::Black,
            flash_success: Color::Rgb(0, 120, 0),
            flash_error: Color::Rgb(180, 0, 0),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            popup_bg: Color::Indexed(255),
        }
    }

    /// Traffic-light color for `value` as a share of `max`
    pub fn level_color(&self, value: f64, max: f64) -> Color {
        let percentage = if max > 0.0 { (value / max) * 100.0 } else { 0.0 };

        if percentage >= 70.0 {
            self.level_high
        } else if percentage >= 40.0 {
            self.level_mid
        } else {
            self.level_low
        }
    }

    /// Podium color for 1-based ranks 1..=3
    pub fn rank_color(&self, rank: usize) -> Option<Color> {
        match rank {
            1 => Some(self.rank_first),
            2 => Some(self.rank_second),
            3 => Some(self.rank_third),
            _ => None,
        }
    }

    pub fn diff_color(&self, diff: i64) -> Color {
        match diff.signum() {
            1 => self.diff_positive,
            -1 => self.diff_negative,
            _ => self.muted,
        }
    }
}

/// Luma above which the terminal background counts as light
const LIGHT_BACKGROUND_LUMA: f32 = 0.6;

/// Pick a palette. Auto-detection queries the terminal, so call this before
/// entering the alternate screen.
pub fn resolve_theme(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors::dark(),
        Theme::Light => ThemeColors::light(),
        Theme::Auto => match terminal_light::luma() {
            Ok(luma) => palette_for_luma(luma),
            Err(_) => ThemeColors::dark(),
        },
    }
}

fn palette_for_luma(luma: f32) -> ThemeColors {
    if luma > LIGHT_BACKGROUND_LUMA {
        ThemeColors::light()
    } else {
        ThemeColors::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_color_thresholds() {
        let t = ThemeColors::dark();
        assert_eq!(t.level_color(100.0, 100.0), Color::Green);
        assert_eq!(t.level_color(70.0, 100.0), Color::Green);
        assert_eq!(t.level_color(50.0, 100.0), Color::Yellow);
        assert_eq!(t.level_color(10.0, 100.0), Color::Red);
        assert_eq!(t.level_color(5.0, 0.0), Color::Red);
    }

    #[test]
    fn test_rank_color_only_for_podium() {
        let t = ThemeColors::dark();
        assert_eq!(t.rank_color(1), Some(t.rank_first));
        assert_eq!(t.rank_color(3), Some(t.rank_third));
        assert_eq!(t.rank_color(4), None);
        assert_eq!(t.rank_color(0), None);
    }

    #[test]
    fn test_diff_color() {
        let t = ThemeColors::dark();
        assert_eq!(t.diff_color(12), t.diff_positive);
        assert_eq!(t.diff_color(-3), t.diff_negative);
        assert_eq!(t.diff_color(0), t.muted);
    }

    #[test]
    fn test_explicit_themes_skip_detection() {
        assert_eq!(resolve_theme(Theme::Light).title_color, Color::Blue);
        assert_eq!(resolve_theme(Theme::Dark).title_color, Color::Cyan);
    }

    #[test]
    fn test_palette_for_luma() {
        assert_eq!(palette_for_luma(0.9).title_color, Color::Blue);
        assert_eq!(palette_for_luma(0.1).title_color, Color::Cyan);
    }
}
