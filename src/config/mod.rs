mod init;
mod schema;

pub use init::run_init_wizard;
pub use schema::{BackendConfig, Config, ENV_ANON_KEY, ENV_BACKEND_URL};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path (~/.config/y-ultimate/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("y-ultimate")
}

/// Get the default config file path (~/.config/y-ultimate/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<()> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory at {}", config_dir.display()))?;
    }
    Ok(())
}

/// Load configuration from a YAML file, then apply environment overrides.
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `y-ultimate init` to create one.",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let mut config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_under_app_dir() {
        let path = get_config_path();
        assert!(path.ends_with("y-ultimate/config.yaml"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let path = std::env::temp_dir().join("y-ultimate-test-missing-config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("y-ultimate init"));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join("y-ultimate-test-load-config.yaml");
        fs::write(
            &path,
            "backend:\n  url: https://project.example.co\n  anon_key: anon\ntournament: t1\n",
        )
        .unwrap();
        let config = load_config(Some(path.clone())).unwrap();
        assert_eq!(config.tournament.as_deref(), Some("t1"));
        let _ = fs::remove_file(&path);
    }
}
