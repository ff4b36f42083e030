//! Document frontmatter: parsing the leading YAML block and resolving the
//! `project` / `context` alias families from it.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;
use tracing::warn;

static PROJECT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^project?$").expect("project key regex"));
static CONTEXT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^context?$").expect("context key regex"));

/// Key families looked up in the frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasFamily {
    Project,
    Context,
}

impl AliasFamily {
    fn key_pattern(self) -> &'static Regex {
        match self {
            AliasFamily::Project => &*PROJECT_KEY_RE,
            AliasFamily::Context => &*CONTEXT_KEY_RE,
        }
    }
}

/// Read-only view over a document's metadata mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    map: Mapping,
}

impl Frontmatter {
    /// Parse the `---` delimited YAML block at the top of `document`.
    ///
    /// Missing, unterminated or malformed frontmatter yields an empty mapping.
    pub fn parse(document: &str) -> Self {
        let Some(yaml) = frontmatter_block(document) else {
            return Self::default();
        };

        match serde_yaml::from_str::<Value>(&yaml) {
            Ok(Value::Mapping(map)) => Self { map },
            Ok(Value::Null) => Self::default(),
            Ok(_) => {
                warn!("frontmatter is not a mapping; ignoring it");
                Self::default()
            }
            Err(err) => {
                warn!(error = %err, "malformed frontmatter; ignoring it");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Values of the first key matching `family`, split and trimmed.
    ///
    /// A string value is split on commas; a list keeps only its string
    /// elements. Empty entries are dropped.
    pub fn aliases(&self, family: AliasFamily) -> Vec<String> {
        let pattern = family.key_pattern();
        let value = self
            .map
            .iter()
            .find(|(k, _)| k.as_str().is_some_and(|k| pattern.is_match(k)))
            .map(|(_, v)| v);

        let raw: Vec<&str> = match value {
            Some(Value::String(s)) => s.split(',').collect(),
            Some(Value::Sequence(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The label a family resolves to.
    ///
    /// The alias list is walked end-to-first and the final assignment wins,
    /// so this is the first listed alias.
    pub fn resolve(&self, family: AliasFamily) -> Option<String> {
        let mut resolved = None;
        for alias in self.aliases(family).into_iter().rev() {
            resolved = Some(alias);
        }
        resolved
    }

    pub fn project(&self) -> Option<String> {
        self.resolve(AliasFamily::Project)
    }

    pub fn context(&self) -> Option<String> {
        self.resolve(AliasFamily::Context)
    }
}

fn frontmatter_block(document: &str) -> Option<String> {
    let lines: Vec<&str> = document.lines().collect();
    let first = lines.first()?;
    if !first.trim().starts_with("---") {
        return None;
    }

    // The closing delimiter must sit at the opening delimiter's indentation.
    let opening_indent = first.len() - first.trim_start().len();
    let end_idx = lines.iter().enumerate().skip(1).find_map(|(idx, line)| {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        (trimmed.starts_with("---") && indent == opening_indent).then_some(idx)
    })?;

    Some(lines[1..end_idx].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_lookup_list() {
        let doc = "---\nproject: [Work, Personal]\ncontext: home\n---\n# Now\n";
        let fm = Frontmatter::parse(doc);
        assert_eq!(fm.aliases(AliasFamily::Project), vec!["Work", "Personal"]);
        assert_eq!(fm.context().as_deref(), Some("home"));
    }

    #[test]
    fn test_multiple_projects_resolve_to_first_listed() {
        let fm = Frontmatter::parse("---\nproject: [Work, Personal]\n---\n");
        assert_eq!(fm.project().as_deref(), Some("Work"));
    }

    #[test]
    fn test_string_value_is_comma_split() {
        let fm = Frontmatter::parse("---\nProject: ' alpha , beta ,'\n---\n");
        assert_eq!(fm.aliases(AliasFamily::Project), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_key_match_is_case_insensitive_and_exact() {
        let fm = Frontmatter::parse("---\nprojects: nope\nCONTEXT: errands\n---\n");
        assert!(fm.aliases(AliasFamily::Project).is_empty());
        assert_eq!(fm.context().as_deref(), Some("errands"));
    }

    #[test]
    fn test_non_string_list_items_are_skipped() {
        let fm = Frontmatter::parse("---\nproject: [1, Work, true]\n---\n");
        assert_eq!(fm.aliases(AliasFamily::Project), vec!["Work"]);
    }

    #[test]
    fn test_missing_or_malformed_frontmatter_is_empty() {
        assert!(Frontmatter::parse("# Now\n- [ ] a").is_empty());
        assert!(Frontmatter::parse("---\nproject: [unclosed\n---\n").is_empty());
        assert!(Frontmatter::parse("---\nproject: x\n# never closed").is_empty());
        assert_eq!(Frontmatter::parse("").project(), None);
    }
}
