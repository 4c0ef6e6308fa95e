//! Stylesheet deferral (opt-in).
//!
//! Non-critical `<link rel="stylesheet">` tags become
//! `<link rel="preload" as="style" onload=...>` with a `<noscript>` fallback,
//! and the loadCSS polyfill is injected before `</head>` for browsers that
//! never fire `onload` on `<link>`.
//!
//! Disabled by default: swapping `rel` after load produced a flash of
//! unstyled content on reload.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::attrs::Attributes;
use super::{replace_tags, Transform, LINK_TAG};

/// loadCSS polyfill for `<link>` elements without `onload` support.
pub const LOAD_CSS_POLYFILL: &str = r#"<script>!function(e){"use strict";var t=function(t,n,o){var i,r=e.document,a=r.createElement("link");if(o)i=o;else{var l=(r.body||r.getElementsByTagName("head")[0]).childNodes;i=l[l.length-1]}var d=r.styleSheets;a.rel="stylesheet",a.href=t,a.media="only x",function e(t){if(r.body)return t();setTimeout(function(){e(t)})}(function(){i.parentNode.insertBefore(a,o?i:i.nextSibling)});var f=function(e){for(var t=a.href,n=d.length;n--;)if(d[n].href===t)return e();setTimeout(function(){f(e)})};return a.addEventListener&&a.addEventListener("load",function(){this.media=o||"all"}),a.onloadcssdefined=f,f(function(){a.media!==o&&(a.media=o||"all")}),a};"undefined"!=typeof exports?exports.loadCSS=t:e.loadCSS=t}("undefined"!=typeof global?global:this);</script>"#;

/// Marker whose presence means the polyfill is already in the document.
const POLYFILL_MARKER: &str = "loadCSS";

/// Href fragments that identify the critical (first-paint) stylesheet.
const CRITICAL_HINTS: [&str; 3] = ["_layout", "app", "0."];

static NOSCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>").expect("valid noscript regex")
});

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("valid head regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct StylesheetDeferral;

impl Transform for StylesheetDeferral {
    fn name(&self) -> &'static str {
        "stylesheet"
    }

    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str> {
        let fallbacks: Vec<Range<usize>> = NOSCRIPT.find_iter(html).map(|m| m.range()).collect();

        let mut seen_first = false;
        let mut deferred = 0usize;

        let rewritten = replace_tags(html, &LINK_TAG, |m| {
            if fallbacks.iter().any(|r| r.contains(&m.start())) {
                return None;
            }

            let attrs = Attributes::parse(m.as_str());
            if !attrs.rel_contains("stylesheet")
                || attrs.rel_contains("preload")
                || attrs.has("defer")
                || attrs.has("async")
            {
                return None;
            }

            let first = !seen_first;
            seen_first = true;

            let href = attrs.value("href")?;
            if first && is_critical(href) {
                return None;
            }

            deferred += 1;
            Some(preload_link(&attrs, href))
        });

        if deferred == 0 || html.contains(POLYFILL_MARKER) {
            return rewritten;
        }

        tracing::trace!(deferred, "Deferred stylesheets");
        inject_polyfill(rewritten)
    }
}

fn is_critical(href: &str) -> bool {
    CRITICAL_HINTS.iter().any(|hint| href.contains(hint))
}

fn preload_link(attrs: &Attributes<'_>, href: &str) -> String {
    let href = href.replace('"', "&quot;");
    let extra: String = attrs
        .iter()
        .filter(|a| !a.is("rel") && !a.is("href"))
        .map(|a| format!(" {}", attrs.source(a)))
        .collect();

    format!(
        r#"<link rel="preload" as="style" href="{href}"{extra} onload="this.onload=null;this.rel='stylesheet'"><noscript><link rel="stylesheet" href="{href}"{extra}></noscript>"#
    )
}

/// Insert the polyfill before the first `</head>`; no-op when there is none.
fn inject_polyfill(html: Cow<'_, str>) -> Cow<'_, str> {
    let Some(at) = HEAD_CLOSE.find(&html).map(|m| m.start()) else {
        return html;
    };

    let mut out = String::with_capacity(html.len() + LOAD_CSS_POLYFILL.len());
    out.push_str(&html[..at]);
    out.push_str(LOAD_CSS_POLYFILL);
    out.push_str(&html[at..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defer(html: &str) -> String {
        StylesheetDeferral.apply(html).into_owned()
    }

    #[test]
    fn test_critical_first_sheet_stays_synchronous() {
        let html = r#"<head><link rel="stylesheet" href="/_app/assets/_layout.css"><link rel="stylesheet" href="/extra.css" media="print"></head>"#;
        let out = defer(html);

        assert!(out.starts_with(r#"<head><link rel="stylesheet" href="/_app/assets/_layout.css">"#));
        assert!(out.contains(
            r#"<link rel="preload" as="style" href="/extra.css" media="print" onload="this.onload=null;this.rel='stylesheet'"><noscript><link rel="stylesheet" href="/extra.css" media="print"></noscript>"#
        ));
        assert!(out.ends_with(&format!("{LOAD_CSS_POLYFILL}</head>")));
    }

    #[test]
    fn test_unrecognized_first_sheet_is_deferred() {
        let out = defer(r#"<head><link rel="stylesheet" href="/theme.css"></head>"#);
        assert!(out.contains(r#"<link rel="preload" as="style" href="/theme.css""#));
    }

    #[test]
    fn test_only_first_sheet_can_be_critical() {
        let html = r#"<head><link rel="stylesheet" href="/theme.css"><link rel="stylesheet" href="/app.css"></head>"#;
        let out = defer(html);
        assert_eq!(out.matches(r#"rel="preload""#).count(), 2);
    }

    #[test]
    fn test_already_async_sheets_are_skipped() {
        let html = r#"<head><link rel="stylesheet" href="/a.css" async><link rel="preload stylesheet" href="/b.css"></head>"#;
        assert!(matches!(StylesheetDeferral.apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_polyfill_injected_once() {
        let html = r#"<head><link rel="stylesheet" href="/x.css"><link rel="stylesheet" href="/y.css"></head>"#;
        let out = defer(html);
        assert_eq!(out.matches(POLYFILL_MARKER).count(), 2); // export + global assignment
        assert_eq!(out.matches("<script>").count(), 1);
    }

    #[test]
    fn test_existing_polyfill_is_not_duplicated() {
        let html = format!(r#"<head>{LOAD_CSS_POLYFILL}<link rel="stylesheet" href="/x.css"></head>"#);
        let out = defer(&html);
        assert_eq!(out.matches("<script>").count(), 1);
        assert!(out.contains(r#"rel="preload""#));
    }

    #[test]
    fn test_missing_head_close_skips_injection() {
        let out = defer(r#"<link rel="stylesheet" href="/x.css"><body>"#);
        assert!(out.contains(r#"rel="preload""#));
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn test_noscript_fallback_is_not_reprocessed() {
        let once = defer(r#"<head><link rel="stylesheet" href="/x.css"></head>"#);
        assert!(matches!(StylesheetDeferral.apply(&once), Cow::Borrowed(_)));
    }

    #[test]
    fn test_no_stylesheets_is_untouched() {
        let html = r#"<head><link rel="icon" href="/favicon.png"></head>"#;
        assert!(matches!(StylesheetDeferral.apply(html), Cow::Borrowed(_)));
    }
}
