use std::fmt;

/// Failure reported by the hosted backend, classified by HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Missing, invalid or expired access token
    Unauthorized(String),
    /// Authenticated, but row-level security refused the request
    Forbidden(String),
    NotFound(String),
    RateLimited,
    Api { status: u16, message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unauthorized(msg) => {
                write!(f, "Authentication failed ({}). Run `y-ultimate login`.", msg)
            }
            BackendError::Forbidden(msg) => {
                write!(f, "Permission denied: {}", msg)
            }
            BackendError::NotFound(what) => write!(f, "Not found: {}", what),
            BackendError::RateLimited => {
                write!(f, "Backend rate limit exceeded. Wait a few minutes and try again.")
            }
            BackendError::Api { status, message } => {
                write!(f, "Backend error (HTTP {}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    /// Classify a non-success response from its status code and raw body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => BackendError::Unauthorized(message),
            403 => BackendError::Forbidden(message),
            404 => BackendError::NotFound(message),
            429 => BackendError::RateLimited,
            _ => BackendError::Api { status, message },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, BackendError::Unauthorized(_))
    }
}

/// Pull a human-readable message out of a REST or auth error body.
///
/// The REST layer uses `message`, the auth layer uses `msg`,
/// `error_description` or `error`. Falls back to the raw body.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}
