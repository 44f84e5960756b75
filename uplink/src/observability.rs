//! Tracing setup for embedding applications.

use tracing_subscriber::EnvFilter;

/// Initializes a tracing subscriber honoring `RUST_LOG`, defaulting to
/// the given directive.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("info");
        init_tracing("debug");
    }
}
