use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use y_ultimate::backend::{
    auth, create_client, tables, AuthContext, BackendClient, BackendError, MatchStatus, NewChild,
    NewMatch, NewPlayer, NewSession, NewTeam, NewTournament, ProgramType, Role, TeamStatus,
    TournamentStatus,
};
use y_ultimate::browser::{self, Page};
use y_ultimate::config::{self, Config};
use y_ultimate::credentials::{self, CredentialError};
use y_ultimate::live::{self, ScoreDraft, Side};
use y_ultimate::output;
use y_ultimate::roles;
use y_ultimate::spirit::{SpiritSheet, SpiritSubmission};
use y_ultimate::standings::{validate_standings, StandingsConfig, StandingsView};
use y_ultimate::tui;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_RATE_LIMIT: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OpenTarget {
    #[default]
    Leaderboard,
    Tournament,
    Scoring,
    Dashboard,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the config file interactively
    Init,
    /// Sign in (or create an account with --sign-up)
    Login {
        #[arg(long)]
        sign_up: bool,
        /// Display name for a new account
        #[arg(long, requires = "sign_up")]
        name: Option<String>,
        /// Role for a new account
        #[arg(long, requires = "sign_up", value_parser = parse_role)]
        role: Option<Role>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Role-specific overview for the signed-in user
    Dashboard,
    /// List tournaments
    Tournaments {
        /// Include drafts
        #[arg(long)]
        all: bool,
    },
    /// Create a tournament (directors only)
    CreateTournament {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: NaiveDate,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value_t = 16)]
        max_teams: u32,
        #[arg(long, value_enum, default_value_t = TournamentStatus::RegistrationOpen)]
        status: TournamentStatus,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print tournament standings (default if no subcommand)
    Standings {
        #[arg(long, value_enum, default_value_t)]
        view: StandingsView,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Live leaderboard in the terminal
    Tui {
        #[arg(long, value_enum, default_value_t)]
        theme: tui::Theme,
    },
    /// Open a page of the web app in the browser
    Open {
        #[arg(value_enum, default_value_t)]
        target: OpenTarget,
        /// Match id, for `scoring`
        id: Option<String>,
    },
    /// List teams registered for the tournament
    Teams {
        /// Only teams awaiting approval
        #[arg(long)]
        pending: bool,
        /// Include rosters
        #[arg(long)]
        players: bool,
    },
    /// Approve a team registration
    Approve(TeamDecision),
    /// Reject a team registration
    Reject(TeamDecision),
    /// Register a team you captain
    RegisterTeam {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Roster entry NAME,AGE,GENDER[,EMAIL]; repeat for each player
        #[arg(long = "player", value_parser = parse_player)]
        players: Vec<NewPlayer>,
    },
    /// List the tournament's matches
    Matches,
    /// Schedule a match
    CreateMatch {
        #[arg(long)]
        team_a: String,
        #[arg(long)]
        team_b: String,
        #[arg(long)]
        field: String,
        /// Start time, RFC 3339 or "YYYY-MM-DD HH:MM" local
        #[arg(long, value_parser = parse_datetime)]
        at: DateTime<Utc>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Keep score for a match
    Score {
        match_id: String,
        /// Publish right after applying the action
        #[arg(long)]
        save: bool,
        #[command(subcommand)]
        action: Option<ScoreAction>,
    },
    /// Submit a spirit score for a completed match
    Spirit(SpiritArgs),
    /// List coaching sessions, or one session's attendance
    Sessions {
        session_id: Option<String>,
    },
    /// Schedule a coaching session
    CreateSession {
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long)]
        location: String,
        #[arg(long, value_enum)]
        program: ProgramType,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark attendance for a session
    Attendance {
        session_id: String,
        #[arg(long, value_name = "CHILD_ID")]
        present: Vec<String>,
        #[arg(long, value_name = "CHILD_ID")]
        absent: Vec<String>,
    },
    /// List children in the coaching programme, or show one
    Children {
        child_id: Option<String>,
        /// Include inactive children
        #[arg(long)]
        all: bool,
        #[arg(long, value_name = "CHILD_ID", conflicts_with = "deactivate")]
        activate: Option<String>,
        #[arg(long, value_name = "CHILD_ID")]
        deactivate: Option<String>,
    },
    /// Enrol a child
    AddChild {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        parent_name: String,
        #[arg(long)]
        parent_phone: String,
        #[arg(long)]
        parent_whatsapp: Option<String>,
        #[arg(long)]
        medical_notes: Option<String>,
        /// Defaults to today
        #[arg(long)]
        join_date: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
struct TeamDecision {
    team_id: String,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args, Debug)]
struct SpiritArgs {
    match_id: String,
    /// Team giving the score
    #[arg(long)]
    from: String,
    /// Team being scored
    #[arg(long)]
    to: String,
    #[arg(long)]
    rules: u32,
    #[arg(long)]
    fouls: u32,
    #[arg(long)]
    fairness: u32,
    #[arg(long)]
    attitude: u32,
    #[arg(long)]
    communication: u32,
    #[arg(long)]
    comments: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum ScoreAction {
    /// Show the match with any unsaved draft (default)
    Show,
    /// Add a point
    Inc {
        #[arg(value_enum)]
        side: Side,
    },
    /// Take a point away
    Dec {
        #[arg(value_enum)]
        side: Side,
    },
    /// Overwrite both scores
    Set { team_a: u32, team_b: u32 },
    /// Mark the match live
    Start,
    /// Back to upcoming
    Pause,
    /// Mark the match completed
    Finish,
    /// Publish the draft
    Save,
    /// Throw the draft away
    Discard,
}

#[derive(Parser, Debug)]
#[command(name = "y-ultimate")]
#[command(about = "Ultimate Frisbee tournament standings, live scoring and coaching", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/y-ultimate/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Tournament id (defaults to `tournament:` in the config file)
    #[arg(short, long, global = true)]
    tournament: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| {
        let names: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        format!("unknown role '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn parse_player(s: &str) -> Result<NewPlayer, String> {
    NewPlayer::parse(s).map_err(|e| e.to_string())
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}' (expected HH:MM)", s))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("invalid time '{}' (expected RFC 3339 or \"YYYY-MM-DD HH:MM\")", s))?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' is ambiguous or skipped in the local timezone", s))
}

/// Map a failure to the process exit code
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(backend) = err.downcast_ref::<BackendError>() {
        return match backend {
            BackendError::Unauthorized(_) | BackendError::Forbidden(_) => EXIT_AUTH,
            BackendError::RateLimited => EXIT_RATE_LIMIT,
            BackendError::NotFound(_) | BackendError::Api { .. } => EXIT_NETWORK,
        };
    }
    if err.downcast_ref::<CredentialError>().is_some() {
        return EXIT_AUTH;
    }
    if err.downcast_ref::<reqwest::Error>().is_some() || err.downcast_ref::<serde_json::Error>().is_some() {
        return EXIT_NETWORK;
    }
    EXIT_CONFIG
}

#[tokio::main]
async fn main() {
    // Err only means a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let config_path = cli.config.as_ref().map(PathBuf::from);

    if let Some(Commands::Init) = cli.command {
        if let Err(e) = config::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate standings config at startup
    let standings_config = config.standings();
    if let Err(errors) = validate_standings(&standings_config) {
        eprintln!("Standings config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if cli.verbose {
        eprintln!("Backend: {}", config.backend.url);
        eprintln!(
            "Standings: performance {} / spirit {} (max spirit {}, ties {:?})",
            standings_config.performance_weight,
            standings_config.spirit_weight,
            standings_config.max_spirit_total,
            standings_config.tie_policy
        );
    }

    match run(cli, config, standings_config).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

/// Settings every command handler shares
struct Ctx {
    client: BackendClient,
    config: Config,
    standings: StandingsConfig,
    session_path: PathBuf,
    tournament: Option<String>,
    verbose: bool,
    use_colors: bool,
}

impl Ctx {
    fn tournament_id(&self) -> Result<&str> {
        self.config.tournament_id(self.tournament.as_deref())
    }

    /// Signed-in identity with profile; fails when running anonymously
    async fn auth(&self) -> Result<AuthContext> {
        if !self.client.is_authenticated() {
            return Err(CredentialError::NotLoggedIn.into());
        }
        let user = auth::current_user(&self.client).await?;
        let profile = tables::fetch_profile(&self.client, &user.id).await?;
        if self.verbose {
            eprintln!(
                "Signed in as {} ({})",
                user.email.as_deref().unwrap_or(&user.id),
                profile.as_ref().map(|p| p.role.as_str()).unwrap_or("no profile")
            );
        }
        Ok(AuthContext::new(user, profile))
    }

    fn app_url(&self) -> Result<&str> {
        self.config
            .app_url
            .as_deref()
            .context("Set `app_url` in the config file to open the web app")
    }
}

async fn run(cli: Cli, config: Config, standings: StandingsConfig) -> Result<()> {
    let anonymous = create_client(&config.backend, None)?;
    let session_path = credentials::get_session_path();
    let command = cli.command.unwrap_or(Commands::Standings {
        view: StandingsView::default(),
        format: OutputFormat::default(),
    });

    // Session management works without an existing session
    match &command {
        Commands::Login { sign_up, name, role } => {
            return login(&anonymous, &session_path, *sign_up, name.as_deref(), *role).await;
        }
        Commands::Logout => {
            if credentials::clear_session(&session_path)? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
            return Ok(());
        }
        _ => {}
    }

    let client = match credentials::get_token_from_env() {
        Some(token) => {
            if cli.verbose {
                eprintln!("Using access token from {}", credentials::ENV_TOKEN_VAR);
            }
            anonymous.with_access_token(token)
        }
        None => match credentials::ensure_session(&anonymous, &session_path, cli.verbose).await? {
            Some(session) => anonymous.with_access_token(session.access_token),
            None => {
                if cli.verbose {
                    eprintln!("Not signed in; using public access");
                }
                anonymous
            }
        },
    };

    let ctx = Ctx {
        client,
        config,
        standings,
        session_path,
        tournament: cli.tournament,
        verbose: cli.verbose,
        use_colors: !cli.no_color && output::should_use_colors(),
    };

    match command {
        Commands::Init | Commands::Login { .. } | Commands::Logout => Ok(()),
        Commands::Whoami => whoami(&ctx).await,
        Commands::Dashboard => dashboard(&ctx).await,
        Commands::Tournaments { all } => {
            let tournaments = tables::list_tournaments(&ctx.client, all).await?;
            println!("{}", output::format_tournament_list(&tournaments, ctx.use_colors));
            Ok(())
        }
        Commands::CreateTournament {
            name,
            location,
            start,
            end,
            max_teams,
            status,
            description,
        } => {
            let auth = ctx.auth().await?;
            roles::require(roles::can_create_tournaments(auth.role()), "create tournaments")?;
            let new = NewTournament {
                name,
                location,
                start_date: start,
                end_date: end,
                status,
                max_teams,
                description,
            };
            let created = tables::create_tournament(&ctx.client, &auth, &new).await?;
            println!("Created tournament {} ({})", created.name, created.id);
            Ok(())
        }
        Commands::Standings { view, format } => standings_command(&ctx, view, format).await,
        Commands::Tui { theme } => {
            let tournament_id = ctx.tournament_id()?.to_string();
            let tournament_name = match tables::get_tournament(&ctx.client, &tournament_id).await {
                Ok(t) => Some(t.name),
                Err(e) => {
                    if ctx.verbose {
                        eprintln!("Could not load tournament name: {:#}", e);
                    }
                    None
                }
            };
            // Theme detection talks to the terminal, so it runs before the TUI starts
            let colors = tui::resolve_theme(theme);
            let app = tui::App::new_loading(
                ctx.config.clone(),
                tournament_id,
                tournament_name,
                colors,
                ctx.verbose,
            );
            tui::run_tui(app, ctx.client.clone(), ctx.session_path.clone()).await
        }
        Commands::Open { target, id } => open(&ctx, target, id.as_deref()),
        Commands::Teams { pending, players } => teams(&ctx, pending, players).await,
        Commands::Approve(decision) => decide_team(&ctx, decision, TeamStatus::Approved).await,
        Commands::Reject(decision) => decide_team(&ctx, decision, TeamStatus::Rejected).await,
        Commands::RegisterTeam {
            name,
            email,
            phone,
            logo_url,
            notes,
            players,
        } => {
            let auth = ctx.auth().await?;
            let team = NewTeam {
                tournament_id: ctx.tournament_id()?.to_string(),
                name,
                email,
                phone,
                logo_url,
                notes,
            };
            let created = tables::register_team(&ctx.client, &auth, &team, &players).await?;
            println!(
                "Registered {} with {} player{}; awaiting approval ({})",
                created.name,
                players.len(),
                if players.len() == 1 { "" } else { "s" },
                created.id
            );
            Ok(())
        }
        Commands::Matches => {
            let matches = tables::fetch_matches(&ctx.client, ctx.tournament_id()?).await?;
            println!("{}", output::format_match_list(&matches, ctx.use_colors));
            Ok(())
        }
        Commands::CreateMatch {
            team_a,
            team_b,
            field,
            at,
            notes,
        } => {
            let auth = ctx.auth().await?;
            roles::require(roles::can_create_tournaments(auth.role()), "schedule matches")?;
            let new = NewMatch {
                tournament_id: ctx.tournament_id()?.to_string(),
                team_a_id: team_a,
                team_b_id: team_b,
                field,
                scheduled_time: at,
                notes,
            };
            let created = tables::create_match(&ctx.client, &new).await?;
            println!("{}", output::format_match_detail(&created, None, ctx.use_colors));
            Ok(())
        }
        Commands::Score {
            match_id,
            save,
            action,
        } => score(&ctx, &match_id, action.unwrap_or(ScoreAction::Show), save).await,
        Commands::Spirit(args) => submit_spirit(&ctx, args).await,
        Commands::Sessions { session_id } => match session_id {
            Some(id) => {
                let records = tables::fetch_session_attendance(&ctx.client, &id).await?;
                println!("{}", output::format_attendance(&records, ctx.use_colors));
                Ok(())
            }
            None => {
                let sessions = tables::list_sessions(&ctx.client).await?;
                println!("{}", output::format_session_list(&sessions, ctx.use_colors));
                Ok(())
            }
        },
        Commands::CreateSession {
            date,
            time,
            location,
            program,
            notes,
        } => {
            let auth = ctx.auth().await?;
            roles::require(roles::can_manage_coaching(auth.role()), "schedule coaching sessions")?;
            let new = NewSession {
                date,
                time,
                location,
                program_type: program,
                notes,
            };
            let created = tables::create_session(&ctx.client, &auth, &new).await?;
            println!(
                "Scheduled {} session on {} at {} ({})",
                created.program_type,
                created.date,
                created.time.format("%H:%M"),
                created.id
            );
            Ok(())
        }
        Commands::Attendance {
            session_id,
            present,
            absent,
        } => attendance(&ctx, &session_id, present, absent).await,
        Commands::Children {
            child_id: Some(id),
            ..
        } => {
            let child = tables::get_child(&ctx.client, &id).await?;
            println!(
                "{}",
                output::format_child_list(std::slice::from_ref(&child), ctx.use_colors)
            );
            if let Some(whatsapp) = &child.parent_whatsapp {
                println!("  whatsapp: {}", whatsapp);
            }
            if let Some(notes) = &child.medical_notes {
                println!("  medical:  {}", notes);
            }
            Ok(())
        }
        Commands::Children {
            child_id: None,
            all,
            activate,
            deactivate,
        } => children(&ctx, all, activate, deactivate).await,
        Commands::AddChild {
            name,
            age,
            gender,
            parent_name,
            parent_phone,
            parent_whatsapp,
            medical_notes,
            join_date,
        } => {
            let auth = ctx.auth().await?;
            roles::require(roles::can_manage_coaching(auth.role()), "enrol children")?;
            let new = NewChild {
                name,
                age,
                gender,
                parent_name,
                parent_phone,
                parent_whatsapp,
                medical_notes,
                join_date: join_date.unwrap_or_else(|| Local::now().date_naive()),
                active: true,
            };
            let created = tables::create_child(&ctx.client, &new).await?;
            println!("Enrolled {} ({})", created.name, created.id);
            Ok(())
        }
    }
}

async fn login(
    client: &BackendClient,
    session_path: &Path,
    sign_up: bool,
    name: Option<&str>,
    role: Option<Role>,
) -> Result<()> {
    if !sign_up {
        let session = credentials::login_interactive(client, session_path).await?;
        println!(
            "Signed in as {}.",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        );
        return Ok(());
    }

    let name = name.context("--name is required with --sign-up")?;
    let role = role.unwrap_or(Role::Player);
    let (email, password) = credentials::prompt_for_credentials()?;
    match auth::sign_up(client, &email, &password, name, role).await? {
        Some(session) => {
            credentials::store_session(session_path, &session)?;
            println!("Account created. Signed in as {} ({}).", email, role);
        }
        None => {
            println!("Account created. Confirm your email, then run `y-ultimate login`.");
        }
    }
    Ok(())
}

async fn whoami(ctx: &Ctx) -> Result<()> {
    let auth = ctx.auth().await?;
    println!("{}", auth.display_name());
    if let Some(email) = &auth.user.email {
        println!("  email: {}", email);
    }
    match auth.role() {
        Some(role) => println!("  role:  {}", role),
        None => println!("  role:  (no profile)"),
    }
    println!("  id:    {}", auth.user_id());
    if let Ok(session) = credentials::load_session(&ctx.session_path) {
        println!(
            "  session expires {}",
            session.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn dashboard(ctx: &Ctx) -> Result<()> {
    let started = Instant::now();
    let auth = ctx.auth().await?;
    let board = roles::load_dashboard(
        &ctx.client,
        &auth,
        Local::now().date_naive(),
        &ctx.standings,
        ctx.verbose,
    )
    .await?;
    println!(
        "{}",
        output::format_dashboard(
            &board,
            auth.display_name(),
            ctx.standings.max_spirit_total,
            ctx.use_colors
        )
    );
    if ctx.verbose {
        eprintln!("Dashboard loaded in {:?}", started.elapsed());
    }
    Ok(())
}

async fn standings_command(ctx: &Ctx, view: StandingsView, format: OutputFormat) -> Result<()> {
    let started = Instant::now();
    let tournament_id = ctx.tournament_id()?;
    let standings =
        y_ultimate::fetch::fetch_standings(&ctx.client, tournament_id, &ctx.standings, ctx.verbose)
            .await?;

    match format {
        OutputFormat::Table => println!(
            "{}",
            output::format_standings(&standings, view, &ctx.standings, ctx.verbose, ctx.use_colors)
        ),
        OutputFormat::Tsv => println!("{}", output::format_tsv(&standings, view)),
        OutputFormat::Json => println!(
            "{}",
            output::format_json(&standings).context("Failed to encode standings")?
        ),
    }

    if ctx.verbose {
        eprintln!();
        eprintln!("{} standings in {:?}", view.title(), started.elapsed());
    }
    Ok(())
}

fn open(ctx: &Ctx, target: OpenTarget, id: Option<&str>) -> Result<()> {
    let app_url = ctx.app_url()?;
    let page = match target {
        OpenTarget::Leaderboard => Page::Leaderboard(id.or(ctx.tournament_id().ok())),
        OpenTarget::Tournament => Page::Tournament(match id {
            Some(id) => id,
            None => ctx.tournament_id()?,
        }),
        OpenTarget::Scoring => Page::Scoring(id.context("`open scoring` needs a match id")?),
        OpenTarget::Dashboard => Page::Dashboard,
    };
    let url = browser::page_url(app_url, &page);
    browser::open_url(&url)?;
    println!("Opening {}", url);
    Ok(())
}

async fn teams(ctx: &Ctx, pending_only: bool, with_players: bool) -> Result<()> {
    let mut teams = tables::fetch_teams(&ctx.client, ctx.tournament_id()?).await?;
    if pending_only {
        teams.retain(|t| t.status == TeamStatus::Pending);
    }
    println!("{}", output::format_team_list(&teams, ctx.use_colors));

    if with_players {
        for team in &teams {
            let players = tables::fetch_team_players(&ctx.client, &team.id).await?;
            println!();
            println!("{}", team.name);
            println!("{}", output::format_player_list(&players));
        }
    }
    Ok(())
}

async fn decide_team(ctx: &Ctx, decision: TeamDecision, status: TeamStatus) -> Result<()> {
    let auth = ctx.auth().await?;
    roles::require(roles::can_manage_teams(auth.role()), "approve or reject teams")?;
    let team = tables::update_team_status(
        &ctx.client,
        &decision.team_id,
        status,
        decision.notes.as_deref(),
    )
    .await?;
    println!("{}: {}", team.name, team.status);
    Ok(())
}

async fn score(ctx: &Ctx, match_id: &str, action: ScoreAction, save_after: bool) -> Result<()> {
    let drafts_path = live::get_drafts_path();
    let mut book = live::load_drafts(&drafts_path)?;
    let current = tables::get_match(&ctx.client, match_id).await?;

    let mut draft = match book.get(match_id) {
        Some(existing) => {
            let mut draft = existing.clone();
            if draft.saved_a != current.team_a_score
                || draft.saved_b != current.team_b_score
                || draft.status != current.status
            {
                eprintln!("Note: this match changed on the server since the draft was started; saving overwrites its score.");
                if !matches!(action, ScoreAction::Discard) {
                    draft.rebase(&current).with_context(|| {
                        format!(
                            "Draft for match {} is out of date; run `y-ultimate score {} discard`",
                            match_id, match_id
                        )
                    })?;
                }
            }
            draft
        }
        None => ScoreDraft::from_match(&current),
    };

    let publish = save_after || matches!(action, ScoreAction::Save);
    let edited = match action {
        ScoreAction::Show => false,
        ScoreAction::Inc { side } => {
            draft.increment(side);
            true
        }
        ScoreAction::Dec { side } => {
            draft.decrement(side);
            true
        }
        ScoreAction::Set { team_a, team_b } => {
            draft.set(team_a, team_b);
            true
        }
        ScoreAction::Start => {
            draft.request_status(MatchStatus::Live)?;
            true
        }
        ScoreAction::Pause => {
            draft.request_status(MatchStatus::Upcoming)?;
            true
        }
        ScoreAction::Finish => {
            draft.request_status(MatchStatus::Completed)?;
            true
        }
        ScoreAction::Save => false,
        ScoreAction::Discard => {
            if book.remove(match_id).is_some() {
                live::save_drafts(&drafts_path, &book)?;
                println!("Discarded unsaved changes.");
            } else {
                println!("No unsaved changes.");
            }
            println!("{}", output::format_match_detail(&current, None, ctx.use_colors));
            return Ok(());
        }
    };

    if !publish {
        if edited {
            book.put(draft.clone());
            live::save_drafts(&drafts_path, &book)?;
        }
        let shown = book.get(match_id).filter(|d| d.is_dirty());
        println!("{}", output::format_match_detail(&current, shown, ctx.use_colors));
        if shown.is_some() {
            println!("Run `y-ultimate score {} save` to publish.", match_id);
        }
        return Ok(());
    }

    if !draft.is_dirty() {
        book.remove(match_id);
        live::save_drafts(&drafts_path, &book)?;
        println!("Nothing to save.");
        println!("{}", output::format_match_detail(&current, None, ctx.use_colors));
        return Ok(());
    }

    let auth = ctx.auth().await?;
    roles::require(roles::can_score_matches(auth.role()), "keep score")?;

    // Keep the draft on disk until the server has accepted it
    book.put(draft.clone());
    live::save_drafts(&drafts_path, &book)?;

    let updated = tables::update_match_score(&ctx.client, match_id, &draft.snapshot()).await?;
    draft.mark_saved();
    book.remove(match_id);
    live::save_drafts(&drafts_path, &book)?;

    if ctx.verbose {
        eprintln!(
            "Saved {}-{} ({})",
            draft.team_a_score, draft.team_b_score, draft.status
        );
    }
    println!("{}", output::format_match_detail(&updated, None, ctx.use_colors));
    Ok(())
}

async fn submit_spirit(ctx: &Ctx, args: SpiritArgs) -> Result<()> {
    let auth = ctx.auth().await?;
    let sheet = SpiritSheet::new(
        args.rules,
        args.fouls,
        args.fairness,
        args.attitude,
        args.communication,
    )?;
    let submission = SpiritSubmission::new(&args.match_id, &args.from, &args.to, sheet, args.comments)?;

    let played = tables::get_match(&ctx.client, &args.match_id).await?;
    submission.check_teams(&played.team_a_id, &played.team_b_id)?;
    if played.status != MatchStatus::Completed {
        anyhow::bail!("Spirit scores can only be submitted for completed matches");
    }

    let stored = tables::submit_spirit_score(&ctx.client, &submission).await?;
    let to_name = if stored.to_team_id == played.team_a_id {
        played.team_a_name()
    } else {
        played.team_b_name()
    };
    println!(
        "Spirit score {}/{} for {} submitted by {}",
        stored.effective_total(),
        ctx.standings.max_spirit_total,
        to_name,
        auth.display_name()
    );
    Ok(())
}

async fn attendance(ctx: &Ctx, session_id: &str, present: Vec<String>, absent: Vec<String>) -> Result<()> {
    if !present.is_empty() || !absent.is_empty() {
        let auth = ctx.auth().await?;
        roles::require(roles::can_manage_coaching(auth.role()), "mark attendance")?;
        let marks: Vec<tables::AttendanceMark> = present
            .into_iter()
            .map(|child_id| tables::AttendanceMark {
                child_id,
                present: true,
            })
            .chain(absent.into_iter().map(|child_id| tables::AttendanceMark {
                child_id,
                present: false,
            }))
            .collect();
        tables::mark_attendance(&ctx.client, session_id, &marks).await?;
        if ctx.verbose {
            eprintln!("Marked {} children", marks.len());
        }
    }

    let records = tables::fetch_session_attendance(&ctx.client, session_id).await?;
    println!("{}", output::format_attendance(&records, ctx.use_colors));
    Ok(())
}

async fn children(
    ctx: &Ctx,
    include_inactive: bool,
    activate: Option<String>,
    deactivate: Option<String>,
) -> Result<()> {
    let toggle = activate.map(|id| (id, true)).or(deactivate.map(|id| (id, false)));
    if let Some((id, active)) = toggle {
        let auth = ctx.auth().await?;
        roles::require(roles::can_manage_coaching(auth.role()), "update children")?;
        let child = tables::set_child_active(&ctx.client, &id, active).await?;
        println!(
            "{} is now {}",
            child.name,
            if child.active { "active" } else { "inactive" }
        );
        return Ok(());
    }

    let mut children = tables::list_children(&ctx.client).await?;
    if !include_inactive {
        children.retain(|c| c.active);
    }
    println!("{}", output::format_child_list(&children, ctx.use_colors));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_standings() {
        let cli = Cli::try_parse_from(["y-ultimate"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_standings_flags() {
        let cli = Cli::try_parse_from([
            "y-ultimate",
            "standings",
            "--view",
            "spirit",
            "--format",
            "tsv",
            "-t",
            "t1",
        ])
        .unwrap();
        assert_eq!(cli.tournament.as_deref(), Some("t1"));
        match cli.command {
            Some(Commands::Standings { view, format }) => {
                assert_eq!(view, StandingsView::Spirit);
                assert_eq!(format, OutputFormat::Tsv);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_register_team_collects_players() {
        let cli = Cli::try_parse_from([
            "y-ultimate",
            "register-team",
            "--name",
            "Hucks",
            "--email",
            "cap@example.org",
            "--phone",
            "555",
            "--player",
            "Asha,24,F",
            "--player",
            "Ben,27,M,ben@example.org",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::RegisterTeam { players, .. }) => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[1].email.as_deref(), Some("ben@example.org"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_player_is_rejected_by_parser() {
        let result = Cli::try_parse_from([
            "y-ultimate",
            "register-team",
            "--name",
            "Hucks",
            "--email",
            "a@b.c",
            "--phone",
            "1",
            "--player",
            "Asha,old,F",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_score_subcommands() {
        let cli = Cli::try_parse_from(["y-ultimate", "score", "m1", "--save", "inc", "b"]).unwrap();
        match cli.command {
            Some(Commands::Score {
                match_id,
                save,
                action: Some(ScoreAction::Inc { side }),
            }) => {
                assert_eq!(match_id, "m1");
                assert!(save);
                assert_eq!(side, Side::B);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["y-ultimate", "score", "m1", "set", "7", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Score {
                action: Some(ScoreAction::Set { team_a: 7, team_b: 5 }),
                ..
            })
        ));
    }

    #[test]
    fn test_sign_up_flags_require_sign_up() {
        assert!(Cli::try_parse_from(["y-ultimate", "login", "--name", "Priya"]).is_err());
        let cli = Cli::try_parse_from([
            "y-ultimate",
            "login",
            "--sign-up",
            "--name",
            "Priya",
            "--role",
            "program-manager",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Login {
                sign_up: true,
                role: Some(Role::ProgramManager),
                ..
            })
        ));
    }

    #[test]
    fn test_parse_role_error_lists_roles() {
        let err = parse_role("referee").unwrap_err();
        assert!(err.contains("tournament_director"));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("16:30").unwrap(), NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(parse_time("07:05:10").unwrap(), NaiveTime::from_hms_opt(7, 5, 10).unwrap());
        assert!(parse_time("4pm").is_err());
    }

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = parse_datetime("2025-03-01T09:30:00+05:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 4, 0, 0).unwrap());
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[test]
    fn test_exit_codes() {
        let auth: anyhow::Error = BackendError::Unauthorized("expired".to_string()).into();
        assert_eq!(exit_code_for(&auth), EXIT_AUTH);

        let limited = anyhow::Error::from(BackendError::RateLimited).context("Failed to read teams");
        assert_eq!(exit_code_for(&limited), EXIT_RATE_LIMIT);

        let server: anyhow::Error = BackendError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(exit_code_for(&server), EXIT_NETWORK);

        let creds: anyhow::Error = CredentialError::NotLoggedIn.into();
        assert_eq!(exit_code_for(&creds), EXIT_AUTH);

        let usage = anyhow::anyhow!("No tournament selected");
        assert_eq!(exit_code_for(&usage), EXIT_CONFIG);
    }
}
