//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Honour `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Human-readable fmt layer; fields carry the machine-readable parts

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given level.
pub fn default_filter(level: &str) -> String {
    format!("reagent_site={level},og_image={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = default_filter("debug");
        assert!(filter.contains("reagent_site=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
