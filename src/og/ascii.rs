//! ASCII-art asset extraction.

use std::sync::LazyLock;

use regex::Regex;

static ASCII_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"export const asciiArt = `([\s\S]*?)`;").expect("valid ascii export regex")
});

/// Pull the template literal out of `export const asciiArt = `...`;`.
pub fn extract_ascii_art(source: &str) -> Option<&str> {
    ASCII_EXPORT
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Non-blank lines of the art with trailing whitespace removed.
pub fn art_lines(art: &str) -> Vec<&str> {
    art.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_end)
        .collect()
}
