//! Preconnect hint pruning.
//!
//! The site self-hosts its fonts, so preconnect hints left behind for the
//! third-party font hosts only open sockets that are never used.

use std::borrow::Cow;

use url::Url;

use super::attrs::Attributes;
use super::{replace_tags, Transform, LINK_TAG};

/// Removes `<link rel="preconnect">` tags that point at denylisted hosts.
#[derive(Debug, Clone)]
pub struct PreconnectPruner {
    hosts: Vec<String>,
}

impl PreconnectPruner {
    pub fn new<S: AsRef<str>>(hosts: &[S]) -> Self {
        Self {
            hosts: hosts
                .iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    fn is_denied(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == host)
    }

    fn should_remove(&self, tag: &str) -> bool {
        let attrs = Attributes::parse(tag);
        if !attrs.rel_contains("preconnect") {
            return false;
        }
        attrs
            .value("href")
            .and_then(href_host)
            .is_some_and(|host| self.is_denied(&host))
    }
}

impl Transform for PreconnectPruner {
    fn name(&self) -> &'static str {
        "preconnect"
    }

    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str> {
        replace_tags(html, &LINK_TAG, |m| {
            self.should_remove(m.as_str()).then(String::new)
        })
    }
}

/// Lowercased host of an absolute or protocol-relative href.
fn href_host(href: &str) -> Option<String> {
    let href = href.trim();
    let url = if href.starts_with("//") {
        Url::parse(&format!("https:{href}")).ok()?
    } else {
        Url::parse(href).ok()?
    };
    url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pruner() -> PreconnectPruner {
        PreconnectPruner::new(&["fonts.googleapis.com", "Fonts.GStatic.com"])
    }

    #[test]
    fn test_removes_denylisted_hosts_in_any_attribute_order() {
        let html = concat!(
            r#"<link rel="preconnect" href="https://fonts.googleapis.com">"#,
            r#"<link href="https://fonts.gstatic.com" crossorigin rel="preconnect">"#,
            r#"<link crossorigin='anonymous' href='//fonts.gstatic.com/' rel='preconnect'>"#,
            "<title>t</title>",
        );
        assert_eq!(pruner().apply(html), "<title>t</title>");
    }

    #[test]
    fn test_unrelated_preconnect_is_untouched() {
        let html = r#"<link rel="preconnect" href="https://cdn.example.com" crossorigin>"#;
        assert!(matches!(pruner().apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_other_rels_pointing_at_denied_host_are_kept() {
        let html = r#"<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Raleway">"#;
        assert!(matches!(pruner().apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_subdomain_does_not_match() {
        let html = r#"<link rel="preconnect" href="https://evil.fonts.googleapis.com.example">"#;
        assert!(matches!(pruner().apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_relative_href_is_ignored() {
        assert_eq!(href_host("/fonts/inter.woff2"), None);
        assert_eq!(href_host("//FONTS.gstatic.com"), Some("fonts.gstatic.com".into()));
    }
}
