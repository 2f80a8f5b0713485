use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, BackendConfig, Config};
use crate::standings::{validate_standings, StandingsConfig, TiePolicy};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt with a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt for an optional value; empty input means none.
fn prompt_optional(message: &str) -> Result<Option<String>> {
    let input = prompt(&format!("{} (leave empty to skip): ", message))?;
    Ok(if input.is_empty() { None } else { Some(input) })
}

fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

fn check_backend_url(url: &str) -> Result<(), String> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err("must start with http:// or https://".to_string())
    }
}

fn parse_weight(input: &str) -> Result<f64, String> {
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Ok(_) => Err("must be a non-negative number".to_string()),
        Err(_) => Err("not a number".to_string()),
    }
}

fn prompt_weight(message: &str, default: f64) -> Result<f64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match parse_weight(&input) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Y-Ultimate Configuration Wizard");
    println!("===============================");
    println!();

    // 1. Backend
    typewriter("First, where is your Y-Ultimate backend? You'll find the project URL and the public anon key in the project's API settings.");
    let url = loop {
        let input = prompt("Backend URL: ")?;
        match check_backend_url(&input) {
            Ok(()) => break input.trim_end_matches('/').to_string(),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };
    let anon_key = loop {
        let input = prompt("Anon key: ")?;
        if !input.is_empty() {
            break input;
        }
        println!("  Anon key is required.");
    };

    // 2. Optional defaults
    println!();
    typewriter("The web app URL lets `y-ultimate open` jump to a leaderboard in your browser.");
    let app_url = prompt_optional("Web app URL")?;
    typewriter("A default tournament saves typing --tournament on every command.");
    let tournament = prompt_optional("Default tournament id")?;

    println!();
    let auto_refresh_interval = loop {
        let input = prompt_with_default("Leaderboard refresh interval in seconds", "30")?;
        match input.parse::<u64>() {
            Ok(v) if v > 0 => break v,
            _ => println!("  Invalid: must be a positive whole number. Try again."),
        }
    };

    // 3. Standings weights
    println!();
    typewriter("The combined leaderboard blends match wins with spirit scores. By default wins count for 70 points and spirit for 30.");
    let standings = if prompt_yes_no("Customize standings weights? (n accepts defaults)", false)? {
        let defaults = StandingsConfig::default();
        loop {
            let performance_weight = prompt_weight("Performance weight", defaults.performance_weight)?;
            let spirit_weight = prompt_weight("Spirit weight", defaults.spirit_weight)?;
            typewriter("A tied game can count as a loss for both teams (as the web app does) or as a draw.");
            let tie_policy = if prompt_yes_no("Count tied games as draws?", false)? {
                TiePolicy::Draw
            } else {
                TiePolicy::Loss
            };
            let candidate = StandingsConfig {
                performance_weight,
                spirit_weight,
                tie_policy,
                ..defaults.clone()
            };
            match validate_standings(&candidate) {
                Ok(()) => break Some(candidate),
                Err(errors) => {
                    for e in errors {
                        println!("  Invalid: {}", e);
                    }
                    println!("  Try again.");
                }
            }
        }
    } else {
        None
    };

    // 4. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 5. Write config
    let config = Config {
        backend: BackendConfig { url, anon_key },
        app_url,
        tournament,
        auto_refresh_interval,
        standings,
    };

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `y-ultimate login` to sign in, then `y-ultimate standings`.");

    Ok(())
}
