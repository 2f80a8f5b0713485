pub mod auth;
pub mod client;
pub mod error;
pub mod tables;
pub mod types;

pub use auth::{AuthContext, AuthSession, AuthUser};
pub use client::{create_client, BackendClient, TableQuery};
pub use error::BackendError;
pub use types::*;
