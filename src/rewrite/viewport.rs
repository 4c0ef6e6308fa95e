//! Viewport meta tag fix.
//!
//! Pages shipped with `maximum-scale=1, user-scalable=no`, which blocks
//! pinch-zoom. The directives are removed and the remaining list is
//! re-emitted as `a=b, c=d`.

use std::borrow::Cow;

use super::attrs::Attributes;
use super::{replace_tags, Transform, META_TAG};

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportFix;

impl Transform for ViewportFix {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn apply<'a>(&self, html: &'a str) -> Cow<'a, str> {
        replace_tags(html, &META_TAG, |m| fix_tag(m.as_str()))
    }
}

fn fix_tag(tag: &str) -> Option<String> {
    let attrs = Attributes::parse(tag);
    if !attrs.value("name")?.trim().eq_ignore_ascii_case("viewport") {
        return None;
    }

    let content = attrs.get("content")?;
    let value = content.value?;
    let span = content.value_span.clone()?;

    let fixed = normalize_content(value);
    if fixed == value {
        return None;
    }

    let mut out = String::with_capacity(tag.len());
    out.push_str(&tag[..span.start]);
    if content.quoted {
        out.push_str(&fixed);
    } else {
        out.push('"');
        out.push_str(&fixed);
        out.push('"');
    }
    out.push_str(&tag[span.end..]);
    Some(out)
}

/// Drop zoom-locking directives and normalize separators.
pub fn normalize_content(content: &str) -> String {
    content
        .split(',')
        .filter_map(|directive| {
            let directive = directive.trim();
            match directive.split_once('=') {
                _ if directive.is_empty() => None,
                Some((key, value)) => {
                    let (key, value) = (key.trim(), value.trim());
                    (!locks_zoom(key, value)).then(|| format!("{key}={value}"))
                }
                None => Some(directive.to_string()),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn locks_zoom(key: &str, value: &str) -> bool {
    key.eq_ignore_ascii_case("maximum-scale")
        || (key.eq_ignore_ascii_case("user-scalable")
            && (value.eq_ignore_ascii_case("no") || value == "0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(html: &str) -> String {
        ViewportFix.apply(html).into_owned()
    }

    #[test]
    fn test_strips_zoom_lock() {
        let html = r#"<meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1, user-scalable=no">"#;
        assert_eq!(
            fix(html),
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
        );
    }

    #[test]
    fn test_no_double_separators_when_directives_are_in_the_middle() {
        let html = r#"<meta content="maximum-scale=5,width=device-width ,  user-scalable=no,initial-scale=1" name="viewport">"#;
        assert_eq!(
            fix(html),
            r#"<meta content="width=device-width, initial-scale=1" name="viewport">"#
        );
    }

    #[test]
    fn test_user_scalable_yes_is_kept() {
        assert_eq!(
            normalize_content("width=device-width, user-scalable=yes"),
            "width=device-width, user-scalable=yes"
        );
    }

    #[test]
    fn test_document_without_viewport_is_untouched() {
        let html = r#"<head><meta charset="utf-8"><meta name="description" content="maximum-scale=1"></head>"#;
        assert!(matches!(ViewportFix.apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_already_clean_tag_is_untouched() {
        let html = r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#;
        assert!(matches!(ViewportFix.apply(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_single_quotes_and_case() {
        let html = r#"<META NAME='Viewport' CONTENT='width=device-width, Maximum-Scale=1.0'>"#;
        assert_eq!(fix(html), r#"<META NAME='Viewport' CONTENT='width=device-width'>"#);
    }
}
