//! Line-level extraction: hashtags, title, and the leading date of a file name.
//!
//! Ordering matters: run [`extract_tags`] first and feed its `stripped` line to
//! [`extract_title`], otherwise tags leak into the title.

use regex::Regex;
use std::sync::LazyLock;

// `#` followed by a non-whitespace run. A second `#` right after the first is a
// heading marker, not a tag.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([^\s#]\S*)").expect("tag regex"));

// Leading heading / list / checkbox markers, in that order.
static MARKER_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#+\s*)?(?:[-*+]\s+)?(?:\[.\]\s*)?").expect("marker regex")
});

// First char that is not a marker, up to the end of that line.
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^#\s\-\[\]*].*").expect("title regex"));

// YYYY sep MM sep DD. The regex crate has no backreferences, so both
// separators are captured and compared after the match.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:19|20)\d\d)([- /.])(0[1-9]|1[012])([- /.])(0[1-9]|[12][0-9]|3[01])")
        .expect("date regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedTags {
    /// Tag bodies in order of appearance, followed by any extra labels.
    pub tags: Vec<String>,
    /// The input line with every matched `#token` removed.
    pub stripped: String,
}

impl ExtractedTags {
    pub fn joined(&self) -> String {
        self.tags.join(",")
    }
}

/// Pull `#token` tags out of `line` and append the non-empty `extra` labels.
pub fn extract_tags(line: &str, extra: &[String]) -> ExtractedTags {
    let mut tags: Vec<String> = TAG_RE
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect();

    tags.extend(
        extra
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );

    let stripped = TAG_RE.replace_all(line, "").into_owned();
    ExtractedTags { tags, stripped }
}

/// Title of a tag-free line: everything after the leading markers, first line only.
pub fn extract_title(line: &str) -> String {
    let first_line = line.lines().next().unwrap_or("");
    let rest = MARKER_PREFIX_RE.replace(first_line, "");
    TITLE_RE
        .find(&rest)
        .map(|m| m.as_str().trim_end().to_string())
        .unwrap_or_default()
}

/// Leading `YYYY-MM-DD`-style date (separators `-`, space, `/` or `.`).
/// Calendar-naive: `2023-02-31` is accepted.
pub fn extract_date(name: &str) -> String {
    match DATE_RE.captures(name) {
        Some(caps) if caps[2] == caps[4] => caps[0].to_string(),
        _ => String::new(),
    }
}

/// Strip leading heading, list and checkbox markers.
pub fn strip_markers(line: &str) -> &str {
    match MARKER_PREFIX_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}
