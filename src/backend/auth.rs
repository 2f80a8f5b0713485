use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::client::BackendClient;
use super::types::{Profile, Role};

/// Identity of the signed-in user as returned by the auth endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Stored login: tokens plus the absolute expiry computed at sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Expired, or expiring within the next minute
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(60) <= now
    }
}

/// Wire shape of a token-grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
            user: self.user,
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

/// Profile fields the backend copies into `profiles` on sign-up
#[derive(Serialize)]
struct SignUpMetadata<'a> {
    name: &'a str,
    role: Role,
}

pub async fn sign_in(client: &BackendClient, email: &str, password: &str) -> Result<AuthSession> {
    let response: TokenResponse = client
        .post_auth("token", Some("password"), &PasswordGrant { email, password })
        .await
        .context("Sign-in failed")?;
    Ok(response.into_session(Utc::now()))
}

/// Register a new account. Returns a session when the backend signs the
/// user in immediately, `None` when it requires email confirmation first.
pub async fn sign_up(
    client: &BackendClient,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> Result<Option<AuthSession>> {
    let body = SignUpRequest {
        email,
        password,
        data: SignUpMetadata { name, role },
    };
    let value: serde_json::Value = client
        .post_auth("signup", None, &body)
        .await
        .context("Sign-up failed")?;

    if value.get("access_token").is_some() {
        let response: TokenResponse =
            serde_json::from_value(value).context("Failed to parse sign-up session")?;
        Ok(Some(response.into_session(Utc::now())))
    } else {
        Ok(None)
    }
}

pub async fn refresh(client: &BackendClient, refresh_token: &str) -> Result<AuthSession> {
    let response: TokenResponse = client
        .post_auth("token", Some("refresh_token"), &RefreshGrant { refresh_token })
        .await
        .context("Session refresh failed")?;
    Ok(response.into_session(Utc::now()))
}

/// Identity behind the client's access token
pub async fn current_user(client: &BackendClient) -> Result<AuthUser> {
    client
        .get_auth("user")
        .await
        .context("Failed to look up the signed-in user")
}

/// The current identity, passed explicitly to every operation that acts on
/// behalf of the user.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthUser,
    pub profile: Option<Profile>,
}

impl AuthContext {
    pub fn new(user: AuthUser, profile: Option<Profile>) -> Self {
        Self { user, profile }
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    /// Profile name, else email, else user id
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.name.as_str())
            .or(self.user.email.as_deref())
            .unwrap_or(&self.user.id)
    }
}
