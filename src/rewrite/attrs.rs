//! Attribute scanning for a single start tag.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});

/// One attribute of a start tag, with byte offsets into the tag text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    /// Span of the whole `name="value"` text.
    pub span: Range<usize>,
    /// Span of the value without its quotes.
    pub value_span: Option<Range<usize>>,
    pub quoted: bool,
}

impl Attribute<'_> {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Parsed attributes of a start tag such as `<link rel="x" href=y>`.
#[derive(Debug)]
pub struct Attributes<'a> {
    tag: &'a str,
    items: Vec<Attribute<'a>>,
}

impl<'a> Attributes<'a> {
    pub fn parse(tag: &'a str) -> Self {
        let inner_end = tag.strip_suffix('>').map_or(tag.len(), str::len);
        let inner_start = tag
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_whitespace() || *c == '/' || *c == '>')
            .map_or(inner_end, |(i, _)| i)
            .min(inner_end);

        let items = ATTRIBUTE
            .captures_iter(&tag[inner_start..inner_end])
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                let (value, quoted) = match (caps.get(2), caps.get(3), caps.get(4)) {
                    (Some(v), _, _) | (_, Some(v), _) => (Some(v), true),
                    (_, _, Some(v)) => (Some(v), false),
                    _ => (None, false),
                };
                Some(Attribute {
                    name: &tag[inner_start + name.start()..inner_start + name.end()],
                    value: value.map(|v| &tag[inner_start + v.start()..inner_start + v.end()]),
                    span: inner_start + whole.start()..inner_start + whole.end(),
                    value_span: value.map(|v| inner_start + v.start()..inner_start + v.end()),
                    quoted,
                })
            })
            .collect();

        Self { tag, items }
    }

    /// First attribute with the given name (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Attribute<'a>> {
        self.items.iter().find(|a| a.is(name))
    }

    pub fn value(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(|a| a.value)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when the whitespace-separated `rel` list contains `token`.
    pub fn rel_contains(&self, token: &str) -> bool {
        self.value("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute<'a>> {
        self.items.iter()
    }

    /// Raw source text of an attribute.
    pub fn source(&self, attr: &Attribute<'_>) -> &'a str {
        &self.tag[attr.span.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_quoting_and_bare_attributes() {
        let tag = r#"<link crossorigin href='https://a.test' rel=preconnect data-x="1">"#;
        let attrs = Attributes::parse(tag);

        let names: Vec<_> = attrs.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["crossorigin", "href", "rel", "data-x"]);
        assert_eq!(attrs.value("href"), Some("https://a.test"));
        assert_eq!(attrs.value("REL"), Some("preconnect"));
        assert!(attrs.has("crossorigin"));
        assert_eq!(attrs.value("crossorigin"), None);
    }

    #[test]
    fn test_spans_point_into_tag() {
        let tag = r#"<meta name="viewport" content="width=device-width">"#;
        let attrs = Attributes::parse(tag);
        let content = attrs.get("content").unwrap();

        assert_eq!(&tag[content.value_span.clone().unwrap()], "width=device-width");
        assert_eq!(attrs.source(content), r#"content="width=device-width""#);
        assert!(content.quoted);
    }

    #[test]
    fn test_self_closing_tag() {
        let attrs = Attributes::parse(r#"<link rel="stylesheet" href="/a.css" />"#);
        assert!(attrs.rel_contains("stylesheet"));
        assert_eq!(attrs.iter().count(), 2);
    }

    #[test]
    fn test_rel_token_list() {
        let attrs = Attributes::parse(r#"<link rel="preload stylesheet" href="/a.css">"#);
        assert!(attrs.rel_contains("preload"));
        assert!(attrs.rel_contains("stylesheet"));
        assert!(!attrs.rel_contains("preconnect"));
    }
}
