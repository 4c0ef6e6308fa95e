//! HTML response rewriting.
//!
//! # Data Flow
//! ```text
//! upstream HTML body (text)
//!     → viewport.rs   (drop maximum-scale / user-scalable=no)
//!     → preconnect.rs (remove denylisted preconnect hints)
//!     → stylesheet.rs (opt-in: preload/onload swap + loadCSS polyfill)
//!     → rewritten body
//! ```
//!
//! # Design Decisions
//! - Tag surgery is attribute-level pattern matching, not a DOM round trip:
//!   untouched bytes are emitted exactly as received
//! - Every transform is idempotent and infallible; no match means no change
//! - `Cow::Borrowed` signals "unchanged" so the common case never allocates
//! - Stylesheet deferral stays off unless configured; it caused a flash of
//!   unstyled content on reload

pub mod attrs;
pub mod preconnect;
pub mod stylesheet;
pub mod viewport;

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Match, Regex};

use crate::config::RewriteConfig;

pub use preconnect::PreconnectPruner;
pub use stylesheet::StylesheetDeferral;
pub use viewport::ViewportFix;

/// Matches a whole `<link ...>` start tag.
pub(crate) static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*>").expect("valid link tag regex"));

/// Matches a whole `<meta ...>` start tag.
pub(crate) static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<meta\b[^>]*>").expect("valid meta tag regex"));

/// A single text transformation over an HTML document.
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Rewrite the document. Returns `Cow::Borrowed` when nothing changed.
    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str>;
}

/// Result of running the pipeline over one document.
#[derive(Debug)]
pub struct Rewritten<'a> {
    pub html: Cow<'a, str>,
    /// Names of the transforms that changed the document, in order.
    pub applied: Vec<&'static str>,
}

impl Rewritten<'_> {
    pub fn is_changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Ordered set of transforms applied to every HTML response.
#[derive(Debug, Default)]
pub struct RewritePipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl RewritePipeline {
    /// Build the pipeline described by the `[rewrite]` config section.
    pub fn from_config(config: &RewriteConfig) -> Self {
        let mut pipeline = Self::default();
        if !config.enabled {
            return pipeline;
        }

        if config.viewport_fix {
            pipeline = pipeline.with(ViewportFix);
        }
        if !config.preconnect_denylist.is_empty() {
            pipeline = pipeline.with(PreconnectPruner::new(&config.preconnect_denylist));
        }
        if config.defer_stylesheets {
            pipeline = pipeline.with(StylesheetDeferral);
        }
        pipeline
    }

    /// Append a transform to the end of the pipeline.
    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Names of the configured transforms, in application order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Run every transform in order.
    pub fn apply<'a>(&self, html: &'a str) -> Rewritten<'a> {
        let mut current = Cow::Borrowed(html);
        let mut applied = Vec::new();

        for transform in &self.transforms {
            let changed = match transform.apply(&current) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(next) = changed {
                applied.push(transform.name());
                current = Cow::Owned(next);
            }
        }

        Rewritten { html: current, applied }
    }
}

/// Replace every match of `tag` in `html` for which `f` returns `Some`.
///
/// Returns the input borrowed when no tag was replaced.
pub(crate) fn replace_tags<'a, F>(html: &'a str, tag: &Regex, mut f: F) -> Cow<'a, str>
where
    F: FnMut(Match<'_>) -> Option<String>,
{
    let mut out: Option<String> = None;
    let mut last = 0;

    for m in tag.find_iter(html) {
        if let Some(replacement) = f(m) {
            let buf = out.get_or_insert_with(|| String::with_capacity(html.len()));
            buf.push_str(&html[last..m.start()]);
            buf.push_str(&replacement);
            last = m.end();
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&html[last..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1, user-scalable=no">
<link rel="preconnect" href="https://fonts.googleapis.com">
<link crossorigin href="https://fonts.gstatic.com" rel="preconnect">
<link rel="preconnect" href="https://api.example.com">
<link href="/_app/immutable/assets/0.abc.css" rel="stylesheet">
<link href="/_app/immutable/assets/5.def.css" rel="stylesheet">
</head>
<body></body>
</html>"#;

    #[test]
    fn test_default_pipeline_order() {
        let pipeline = RewritePipeline::from_config(&RewriteConfig::default());
        assert_eq!(pipeline.names(), vec!["viewport", "preconnect"]);
    }

    #[test]
    fn test_disabled_pipeline_is_empty() {
        let config = RewriteConfig {
            enabled: false,
            ..RewriteConfig::default()
        };
        assert!(RewritePipeline::from_config(&config).is_empty());
    }

    #[test]
    fn test_default_pipeline_leaves_stylesheets_alone() {
        let pipeline = RewritePipeline::from_config(&RewriteConfig::default());
        let out = pipeline.apply(PAGE);

        assert_eq!(out.applied, vec!["viewport", "preconnect"]);
        assert!(out.html.contains(
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
        ));
        assert!(!out.html.contains("fonts.googleapis.com"));
        assert!(!out.html.contains("fonts.gstatic.com"));
        assert!(out.html.contains(r#"<link rel="preconnect" href="https://api.example.com">"#));
        assert!(out
            .html
            .contains(r#"<link href="/_app/immutable/assets/5.def.css" rel="stylesheet">"#));
        assert!(!out.html.contains("preload"));
    }

    #[test]
    fn test_document_without_targets_is_borrowed() {
        let html = "<html><head><title>x</title></head><body>hi</body></html>";
        let pipeline = RewritePipeline::from_config(&RewriteConfig::default());
        let out = pipeline.apply(html);

        assert!(!out.is_changed());
        assert!(matches!(out.html, Cow::Borrowed(_)));
        assert_eq!(out.html, html);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let config = RewriteConfig {
            defer_stylesheets: true,
            ..RewriteConfig::default()
        };
        let pipeline = RewritePipeline::from_config(&config);
        let once = pipeline.apply(PAGE).html.into_owned();
        let twice = pipeline.apply(&once);

        assert!(!twice.is_changed());
        assert_eq!(twice.html, once);
    }

    #[test]
    fn test_replace_tags_only_touches_selected_matches() {
        let html = "<link a><link b><link c>";
        let out = replace_tags(html, &LINK_TAG, |m| {
            (m.as_str() == "<link b>").then(String::new)
        });
        assert_eq!(out, "<link a><link c>");
    }
}
