//! Logging middleware
//!
//! Provides request logging functionality.

use log::{info, warn};

use crate::auth::Role;
use crate::protocol::Request;

/// Log an incoming request
pub fn log_request(role: Role, request: &Request) {
    match request.target_path() {
        Some(path) => info!("{} request {} {:?}", role.as_str(), request.name(), path),
        None => info!("{} request {}", role.as_str(), request.name()),
    }
}

/// Log the outcome of a request
pub fn log_response(request_name: &str, status: u16) {
    if status >= 400 {
        warn!("{} -> {}", request_name, status);
    } else {
        info!("{} -> {}", request_name, status);
    }
}
