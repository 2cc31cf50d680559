//! Switcher game server.
//!
//! Hosts [`switcher_core`] games over HTTP. Every command runs as a per-game
//! transaction in [`GameService`]; state lives in a [`MemoryStore`], callers
//! authenticate with bearer tokens from [`TokenAuth`], and each game's events
//! are fanned out by [`BroadcastNotifier`] as server-sent events.
//!
//! # Architecture
//!
//! - **Service**: single-writer command execution and event publishing
//! - **Routes**: axum REST handlers and the SSE stream
//! - **Adapters**: in-memory persistence, token auth, broadcast notifier
//! - **Config**: TOML settings with command-line overrides

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod auth;
mod config;
mod notifier;
mod routes;
mod service;
mod store;

// Crate-level exports - Adapters
pub use auth::TokenAuth;
pub use notifier::BroadcastNotifier;
pub use store::MemoryStore;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - HTTP
pub use routes::{
    ApiError, AppState, Caller, CreateGameRequest, ErrorBody, ListQuery, MoveRequest,
    RegisterRequest, router,
};

// Crate-level exports - Service
pub use service::{GameService, Registration};
