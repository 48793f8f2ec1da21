//! Logging utilities
//!
//! Provides logging setup and configuration.

use log::LevelFilter;

/// Setup logging for the host process
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once;
/// later calls are ignored.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Logging for tests: captured by the test harness, debug level.
pub fn setup_test_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
