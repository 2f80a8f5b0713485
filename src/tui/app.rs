use crate::config::Config;
use crate::standings::{CombinedStanding, Standings, StandingsConfig, StandingsView};
use crate::tui::theme::ThemeColors;
use ratatui::widgets::TableState;
use std::time::{Duration, Instant};

/// How long a flash message stays in the status bar
const FLASH_SECS: u64 = 3;

/// Auto-refresh waits this long after the last keypress
const INTERACTION_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Help,
    Breakdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlashKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub text: String,
    pub kind: FlashKind,
    pub shown_at: Instant,
}

pub struct App {
    pub tournament_id: String,
    pub tournament_name: Option<String>,
    pub standings: Standings,
    pub view: StandingsView,
    pub table_state: TableState,
    pub input_mode: InputMode,
    pub flash: Option<Flash>,
    pub last_refresh: Option<Instant>,
    pub last_interaction: Instant,
    pub needs_refresh: bool,
    pub force_refresh: bool,
    pub should_quit: bool,
    pub config: Config,
    pub standings_config: StandingsConfig,
    pub theme: ThemeColors,
    pub verbose: bool,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl App {
    /// An empty leaderboard in loading state; the first fetch fills it in.
    pub fn new_loading(
        config: Config,
        tournament_id: String,
        tournament_name: Option<String>,
        theme: ThemeColors,
        verbose: bool,
    ) -> Self {
        let standings_config = config.standings();
        Self {
            tournament_id,
            tournament_name,
            standings: Standings::default(),
            view: StandingsView::default(),
            table_state: TableState::default(),
            input_mode: InputMode::Normal,
            flash: None,
            last_refresh: None,
            last_interaction: Instant::now(),
            needs_refresh: false,
            force_refresh: false,
            should_quit: false,
            config,
            standings_config,
            theme,
            verbose,
            is_loading: true,
            spinner_frame: 0,
        }
    }

    pub fn title(&self) -> &str {
        self.tournament_name.as_deref().unwrap_or(&self.tournament_id)
    }

    /// Rows in the current view
    pub fn row_count(&self) -> usize {
        match self.view {
            StandingsView::Combined => self.standings.combined.len(),
            StandingsView::Performance => self.standings.performance.len(),
            StandingsView::Spirit => self.standings.spirit.len(),
        }
    }

    fn team_id_at(&self, index: usize) -> Option<&str> {
        match self.view {
            StandingsView::Combined => self.standings.combined.get(index).map(|r| r.team_id.as_str()),
            StandingsView::Performance => self
                .standings
                .performance
                .get(index)
                .map(|r| r.team_id.as_str()),
            StandingsView::Spirit => self.standings.spirit.get(index).map(|r| r.team_id.as_str()),
        }
    }

    fn position_of(&self, team_id: &str) -> Option<usize> {
        match self.view {
            StandingsView::Combined => self.standings.combined.iter().position(|r| r.team_id == team_id),
            StandingsView::Performance => self
                .standings
                .performance
                .iter()
                .position(|r| r.team_id == team_id),
            StandingsView::Spirit => self.standings.spirit.iter().position(|r| r.team_id == team_id),
        }
    }

    pub fn selected_team_id(&self) -> Option<&str> {
        self.table_state.selected().and_then(|i| self.team_id_at(i))
    }

    /// Composite breakdown for the selected team, whichever view is shown
    pub fn selected_combined(&self) -> Option<&CombinedStanding> {
        let team_id = self.selected_team_id()?;
        self.standings.combined.iter().find(|r| r.team_id == team_id)
    }

    pub fn next_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn first_row(&mut self) {
        if self.row_count() > 0 {
            self.table_state.select(Some(0));
        }
    }

    pub fn last_row(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.table_state.select(Some(len - 1));
        }
    }

    /// Switch leaderboard, keeping the same team selected when it is listed
    pub fn set_view(&mut self, view: StandingsView) {
        if view == self.view {
            return;
        }
        let selected = self.selected_team_id().map(str::to_string);
        self.view = view;
        self.reselect(selected.as_deref());
    }

    pub fn next_view(&mut self) {
        let i = view_index(self.view);
        self.set_view(StandingsView::ALL[(i + 1) % StandingsView::ALL.len()]);
    }

    pub fn previous_view(&mut self) {
        let len = StandingsView::ALL.len();
        let i = view_index(self.view);
        self.set_view(StandingsView::ALL[(i + len - 1) % len]);
    }

    fn reselect(&mut self, team_id: Option<&str>) {
        let len = self.row_count();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let position = team_id
            .and_then(|id| self.position_of(id))
            .or_else(|| self.table_state.selected().map(|i| i.min(len - 1)))
            .unwrap_or(0);
        self.table_state.select(Some(position));
    }

    /// Replace the leaderboard with fresh standings. The selection follows
    /// the previously selected team to its new rank.
    pub fn update_standings(&mut self, standings: Standings) {
        let selected = self.selected_team_id().map(str::to_string);
        self.standings = standings;
        self.reselect(selected.as_deref());
        self.last_refresh = Some(Instant::now());

        let teams = self.standings.team_count();
        self.show_flash(
            format!("Refreshed ({} team{})", teams, if teams == 1 { "" } else { "s" }),
            FlashKind::Success,
        );
    }

    pub fn show_flash(&mut self, text: String, kind: FlashKind) {
        self.flash = Some(Flash {
            text,
            kind,
            shown_at: Instant::now(),
        });
    }

    pub fn show_error(&mut self, text: String) {
        self.show_flash(text, FlashKind::Error);
    }

    pub fn update_flash(&mut self) {
        if let Some(flash) = &self.flash {
            if flash.shown_at.elapsed().as_secs() >= FLASH_SECS {
                self.flash = None;
            }
        }
    }

    pub fn request_manual_refresh(&mut self) {
        self.needs_refresh = true;
        self.force_refresh = true;
        self.show_flash("Refreshing...".to_string(), FlashKind::Info);
    }

    /// Whether a pending refresh may start now. Manual refreshes always
    /// run; auto-refresh waits until no popup is open and the user has been
    /// idle for a moment, so the table does not reshuffle mid-read.
    pub fn refresh_allowed(&self) -> bool {
        if self.force_refresh {
            return true;
        }
        self.input_mode == InputMode::Normal && self.last_interaction.elapsed() >= INTERACTION_GRACE
    }

    /// Web app leaderboard for this tournament, if `app_url` is configured
    pub fn leaderboard_url(&self) -> Option<String> {
        self.config.app_url.as_deref().map(|base| {
            crate::browser::page_url(
                base,
                &crate::browser::Page::Leaderboard(Some(&self.tournament_id)),
            )
        })
    }

    pub fn open_leaderboard(&mut self) {
        match self.leaderboard_url() {
            Some(url) => match crate::browser::open_url(&url) {
                Ok(()) => self.show_flash(format!("Opened: {}", url), FlashKind::Success),
                Err(e) => self.show_error(format!("Failed to open browser: {}", e)),
            },
            None => self.show_error("Set `app_url` in the config to open the web app".to_string()),
        }
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn show_breakdown(&mut self) {
        if self.selected_combined().is_some() {
            self.input_mode = InputMode::Breakdown;
        }
    }

    pub fn dismiss_popup(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

fn view_index(view: StandingsView) -> usize {
    StandingsView::ALL
        .iter()
        .position(|v| *v == view)
        .unwrap_or(0)
}
