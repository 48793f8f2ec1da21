//! Error handling
//!
//! Defines error types and their translation to HTTP responses.

pub mod handlers;
pub mod types;

pub use handlers::{client_message, error_to_status};
pub use types::*;
