//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site
//! tooling. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The site server whose responses are rewritten.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// HTML response rewriting.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Build-time OG image generation.
    pub og_image: OgImageConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream site server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// HTML rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Master switch. When false every response passes through.
    pub enabled: bool,

    /// Strip `maximum-scale` and `user-scalable=no` from the viewport meta tag.
    pub viewport_fix: bool,

    /// Hosts whose `<link rel="preconnect">` hints are removed.
    pub preconnect_denylist: Vec<String>,

    /// Rewrite non-critical stylesheets into preload links.
    ///
    /// Off by default: deferring caused a flash of unstyled content on reload.
    pub defer_stylesheets: bool,

    /// Bodies larger than this are forwarded without rewriting.
    pub max_body_bytes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            viewport_fix: true,
            preconnect_denylist: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            defer_stylesheets: false,
            max_body_bytes: 4 * 1024 * 1024, // 4MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// OG image generation inputs and output.
///
/// Relative paths are resolved against the project root given to `og-image`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OgImageConfig {
    /// Source file holding the `export const asciiArt = `...`;` literal.
    pub ascii_art_path: String,

    /// Monospace font used for the ASCII art.
    pub mono_font_path: String,

    /// Thin display face (registered, not drawn).
    pub thin_font_path: String,

    /// Variable display face used for the labels.
    pub display_font_path: String,

    /// Where the PNG is written.
    pub output_path: String,

    pub title: String,
    pub subtitle: String,
}

impl Default for OgImageConfig {
    fn default() -> Self {
        Self {
            ascii_art_path: "src/lib/ascii-art.ts".to_string(),
            mono_font_path: "static/fonts/IBMPlexMono-Bold.ttf".to_string(),
            thin_font_path: "static/fonts/Raleway-Thin.ttf".to_string(),
            display_font_path: "static/fonts/Raleway-VariableFont_wght.ttf".to_string(),
            output_path: "static/og-image.png".to_string(),
            title: "reagent systems".to_string(),
            subtitle: "the idea factory".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.rewrite.enabled);
        assert!(!config.rewrite.defer_stylesheets);
        assert_eq!(config.rewrite.preconnect_denylist.len(), 2);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
            [rewrite]
            defer_stylesheets = true

            [upstream]
            address = "10.0.0.2:5173"
            "#,
        )
        .unwrap();
        assert!(config.rewrite.defer_stylesheets);
        assert!(config.rewrite.viewport_fix);
        assert_eq!(config.upstream.address, "10.0.0.2:5173");
        assert_eq!(config.og_image.title, "reagent systems");
    }
}
