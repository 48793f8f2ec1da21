//! Request middleware
//!
//! Provides request logging around the protocol handlers.

pub mod logging;
