pub mod prompt;

use atomic_write_file::AtomicWriteFile;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::backend::AuthSession;

/// Environment variable name for providing an access token without logging in
pub const ENV_TOKEN_VAR: &str = "Y_ULTIMATE_ACCESS_TOKEN";

pub use prompt::{ensure_session, login_interactive, prompt_for_credentials, reprompt_for_login};

/// Check for an access token in the Y_ULTIMATE_ACCESS_TOKEN environment variable.
/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env() -> Option<String> {
    match std::env::var(ENV_TOKEN_VAR) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

#[derive(Debug)]
pub enum CredentialError {
    NotLoggedIn,
    Unreadable(String),
    StoreFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::NotLoggedIn => {
                write!(f, "Not logged in. Run `y-ultimate login` first.")
            }
            CredentialError::Unreadable(msg) => write!(f, "Stored session is unreadable: {}", msg),
            CredentialError::StoreFailed(msg) => write!(f, "Failed to store session: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

/// ~/.config/y-ultimate/session.json
pub fn get_session_path() -> PathBuf {
    crate::config::get_config_dir().join("session.json")
}

pub fn load_session(path: &Path) -> Result<AuthSession, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::NotLoggedIn);
    }
    let file = File::open(path).map_err(|e| CredentialError::Unreadable(e.to_string()))?;
    serde_json::from_reader(file).map_err(|e| CredentialError::Unreadable(e.to_string()))
}

pub fn store_session(path: &Path, session: &AuthSession) -> Result<(), CredentialError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CredentialError::StoreFailed(e.to_string()))?;
    }
    let mut file =
        AtomicWriteFile::open(path).map_err(|e| CredentialError::StoreFailed(e.to_string()))?;
    serde_json::to_writer_pretty(&mut file, session)
        .map_err(|e| CredentialError::StoreFailed(e.to_string()))?;
    file.commit()
        .map_err(|e| CredentialError::StoreFailed(e.to_string()))?;
    restrict_permissions(path);
    Ok(())
}

/// Remove the stored session. Returns whether one existed.
pub fn clear_session(path: &Path) -> Result<bool, CredentialError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path).map_err(|e| CredentialError::StoreFailed(e.to_string()))?;
    Ok(true)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    // owner read/write only
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
