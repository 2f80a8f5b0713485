pub mod backend;
pub mod browser;
pub mod config;
pub mod credentials;
pub mod fetch;
pub mod live;
pub mod output;
pub mod roles;
pub mod spirit;
pub mod standings;
pub mod stderr_buffer;
pub mod tui;
