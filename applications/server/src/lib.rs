//! Nest Server Library
//!
//! HTTP surface for nested playlist trees: JWT-scoped owners, the mutation
//! engine over SQLite, and catalog-backed track listings.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{auth::AuthService, catalog::HttpCatalog};
pub use state::AppState;
