//! Tubely API Library
//!
//! HTTP handlers, authentication and application setup for the upload service.

mod api_doc;
mod handlers;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
