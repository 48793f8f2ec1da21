//! Server core functionality
//!
//! Holds the shared drive context that request handlers run against.

pub mod core;

pub use self::core::Drive;
