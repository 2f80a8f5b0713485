pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, Theme, ThemeColors};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tokio::task::JoinHandle;
use tokio::time::error::Elapsed;

use crate::backend::{BackendClient, BackendError};
use crate::standings::{Standings, StandingsView};
use app::{FlashKind, InputMode};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

type FetchHandle = JoinHandle<Result<anyhow::Result<Standings>, Elapsed>>;

fn spawn_fetch(app: &App, client: &BackendClient) -> FetchHandle {
    let client = client.clone();
    let tournament_id = app.tournament_id.clone();
    let config = app.standings_config.clone();
    let verbose = app.verbose;

    tokio::spawn(async move {
        tokio::time::timeout(
            FETCH_TIMEOUT,
            crate::fetch::fetch_standings(&client, &tournament_id, &config, verbose),
        )
        .await
    })
}

/// Run the live leaderboard until the user quits.
///
/// `session_path` is where a fresh login is stored if the backend rejects
/// the current session mid-run.
pub async fn run_tui(mut app: App, mut client: BackendClient, session_path: PathBuf) -> anyhow::Result<()> {
    // Keep stderr off the alternate screen
    crate::stderr_buffer::hold();

    let mut terminal = ratatui::init();
    let mut events = EventHandler::new(250, app.config.auto_refresh_interval);

    let mut pending_fetch: Option<FetchHandle> = Some(spawn_fetch(&app, &client));
    app.is_loading = true;

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Refresh => {
                app.needs_refresh = true;
            }
        }

        if let Some(handle) = pending_fetch.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(Ok(standings))) => app.update_standings(standings),
                Ok(Ok(Err(e))) => {
                    let rejected = e
                        .downcast_ref::<BackendError>()
                        .is_some_and(BackendError::is_auth);
                    if rejected {
                        // Leave the alternate screen to prompt, then come back
                        ratatui::restore();
                        match crate::credentials::reprompt_for_login(&client, &session_path).await {
                            Ok(session) => {
                                client = client.with_access_token(session.access_token);
                                app.needs_refresh = true;
                                app.force_refresh = true;
                                app.show_flash(
                                    "Signed in again. Refreshing...".to_string(),
                                    FlashKind::Info,
                                );
                            }
                            Err(le) => app.show_error(format!("Sign-in cancelled: {}", le)),
                        }
                        terminal = ratatui::init();
                    } else {
                        crate::buffered_eprintln!("Refresh failed: {:#}", e);
                        app.show_error(format!("Refresh failed: {}", e));
                    }
                }
                Ok(Err(_elapsed)) => {
                    app.show_error(format!(
                        "Refresh timed out ({}s). Will retry on next refresh.",
                        FETCH_TIMEOUT.as_secs()
                    ));
                }
                Err(e) => app.show_error(format!("Refresh task failed: {}", e)),
            }
            app.is_loading = false;
        }

        // Auto-refresh that is not allowed yet stays pending for the next tick
        if app.needs_refresh && pending_fetch.is_none() && app.refresh_allowed() {
            app.needs_refresh = false;
            app.force_refresh = false;
            pending_fetch = Some(spawn_fetch(&app, &client));
            app.is_loading = true;
        }

        if app.should_quit {
            break;
        }
    }

    ratatui::restore();

    for msg in crate::stderr_buffer::release() {
        eprintln!("{}", msg);
    }

    Ok(())
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.should_quit = true
            }

            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            KeyCode::Char('g') | KeyCode::Home => app.first_row(),
            KeyCode::Char('G') | KeyCode::End => app.last_row(),

            KeyCode::Tab => app.next_view(),
            KeyCode::BackTab => app.previous_view(),
            KeyCode::Char('1') => app.set_view(StandingsView::Combined),
            KeyCode::Char('2') => app.set_view(StandingsView::Performance),
            KeyCode::Char('3') => app.set_view(StandingsView::Spirit),

            KeyCode::Char('b') | KeyCode::Enter => app.show_breakdown(),
            KeyCode::Char('o') => app.open_leaderboard(),
            KeyCode::Char('r') => app.request_manual_refresh(),
            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        InputMode::Breakdown => match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') | KeyCode::Enter => {
                app.dismiss_popup()
            }
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            _ => {}
        },
        // Any key closes help
        InputMode::Help => app.dismiss_popup(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, Config};
    use crate::standings::{CombinedStanding, PerformanceStanding, SpiritStanding};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_two_teams() -> App {
        let config = Config {
            backend: BackendConfig {
                url: "https://project.example.co".to_string(),
                anon_key: "anon".to_string(),
            },
            app_url: None,
            tournament: None,
            auto_refresh_interval: 30,
            standings: None,
        };
        let mut app = App::new_loading(config, "t1".to_string(), None, ThemeColors::dark(), false);
        let standings = Standings {
            performance: ["a", "b"]
                .iter()
                .map(|id| PerformanceStanding {
                    team_id: id.to_string(),
                    team_name: id.to_string(),
                    wins: 1,
                    losses: 0,
                    draws: 0,
                    points_for: 15,
                    points_against: 10,
                })
                .collect(),
            spirit: ["a", "b"]
                .iter()
                .map(|id| SpiritStanding {
                    team_id: id.to_string(),
                    team_name: id.to_string(),
                    average: 10.0,
                    scores_received: 1,
                })
                .collect(),
            combined: ["a", "b"]
                .iter()
                .map(|id| CombinedStanding {
                    team_id: id.to_string(),
                    team_name: id.to_string(),
                    wins: 1,
                    max_wins: 1,
                    spirit_average: 10.0,
                    performance_component: 70.0,
                    spirit_component: 15.0,
                    composite: 85.0,
                })
                .collect(),
        };
        app.update_standings(standings);
        app
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with_two_teams();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = app_with_two_teams();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_view_keys() {
        let mut app = app_with_two_teams();
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.view, StandingsView::Spirit);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.view, StandingsView::Combined);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.view, StandingsView::Spirit);
    }

    #[test]
    fn test_breakdown_popup_navigates_and_closes() {
        let mut app = app_with_two_teams();
        handle_key_event(&mut app, key(KeyCode::Char('b')));
        assert_eq!(app.input_mode, InputMode::Breakdown);
        handle_key_event(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.selected_team_id(), Some("b"));
        // q closes the popup rather than quitting
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app_with_two_teams();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert_eq!(app.input_mode, InputMode::Help);
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_manual_refresh_key() {
        let mut app = app_with_two_teams();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert!(app.needs_refresh);
        assert!(app.refresh_allowed());
    }
}
