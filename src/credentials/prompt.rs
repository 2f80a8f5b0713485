use anyhow::{Context, Result};
use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::Path;

use super::{load_session, store_session, CredentialError};
use crate::backend::{auth, AuthSession, BackendClient};

/// Prompts for email and password. The password is not echoed.
pub fn prompt_for_credentials() -> Result<(String, String)> {
    print!("Email: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut email = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut email)
        .context("Failed to read email from stdin")?;
    let email = email.trim().to_string();
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }

    let password = rpassword::prompt_password("Password: ")
        .context("Failed to read password from stdin")?;
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok((email, password))
}

/// Sign in interactively and store the new session
pub async fn login_interactive(client: &BackendClient, path: &Path) -> Result<AuthSession> {
    let (email, password) = prompt_for_credentials()?;
    let session = auth::sign_in(client, &email, &password).await?;
    store_session(path, &session).context("Failed to store session")?;
    Ok(session)
}

/// Re-prompts when the backend rejects the stored session
pub async fn reprompt_for_login(client: &BackendClient, path: &Path) -> Result<AuthSession> {
    eprintln!();
    eprintln!("Your session was rejected (invalid or expired).");
    eprintln!("Please sign in again.");
    eprintln!();

    let session = login_interactive(client, path).await?;
    eprintln!("Signed in as {}.", session.user.email.as_deref().unwrap_or(&session.user.id));
    Ok(session)
}

/// Load the stored session, refreshing it when it is about to expire.
///
/// Returns None when nobody is logged in; callers then fall back to
/// anonymous (public) access.
pub async fn ensure_session(
    client: &BackendClient,
    path: &Path,
    verbose: bool,
) -> Result<Option<AuthSession>> {
    let session = match load_session(path) {
        Ok(session) => session,
        Err(CredentialError::NotLoggedIn) => return Ok(None),
        Err(e) => {
            eprintln!("Warning: {}. Run `y-ultimate login` again.", e);
            return Ok(None);
        }
    };

    if !session.is_expired(Utc::now()) {
        return Ok(Some(session));
    }

    if verbose {
        eprintln!("Session expired at {}, refreshing", session.expires_at);
    }
    match auth::refresh(client, &session.refresh_token).await {
        Ok(refreshed) => {
            store_session(path, &refreshed).context("Failed to store refreshed session")?;
            Ok(Some(refreshed))
        }
        Err(e) => {
            eprintln!("Warning: could not refresh session: {:#}", e);
            eprintln!("Continuing without signing in. Run `y-ultimate login` to sign in again.");
            Ok(None)
        }
    }
}
