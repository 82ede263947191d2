//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide tracing with JSON output.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(LogFormat::Json);
}

pub use tracing::{LogFormat, init_with};

/// Subscriber configuration (filters, formatters).
pub mod tracing;
