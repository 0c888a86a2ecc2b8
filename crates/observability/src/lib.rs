//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide observability (structured logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
