//! The `# Now` block: the section whose checklist items are created and
//! synced in bulk.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

pub const NOW_HEADING: &str = "# Now";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}(?:\s|$)").expect("heading regex"));

static TOP_LEVEL_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[[ xX]\](?:\s|$)").expect("checklist regex"));

static BACK_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(things:///show\?id=\w+\)").expect("back-reference regex"));

/// A captured `# Now` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowBlock {
    /// Checklist items in document order, each with its indented continuation lines.
    pub tasks: Vec<String>,
    /// Exact text of the section body, heading excluded.
    pub raw: String,
    /// Byte range of `raw` within the document it was collected from.
    pub range: Range<usize>,
}

impl NowBlock {
    /// First line of every task that has no back-reference yet.
    pub fn unlinked_tasks(&self) -> impl Iterator<Item = &str> {
        self.tasks
            .iter()
            .filter(|task| task.lines().next().is_some_and(is_unlinked_item))
            .map(String::as_str)
    }
}

/// A checklist item starting at column zero.
pub fn is_top_level_item(line: &str) -> bool {
    TOP_LEVEL_ITEM_RE.is_match(line)
}

/// A line already carrying a `[..](things:///show?id=..)` link.
pub fn has_back_reference(line: &str) -> bool {
    BACK_REFERENCE_RE.is_match(line)
}

/// A top-level checklist item that still needs an id. Bulk creation and the
/// bulk callback both walk the block with this predicate, so their orders agree.
pub fn is_unlinked_item(line: &str) -> bool {
    is_top_level_item(line) && !has_back_reference(line)
}

fn is_heading(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

/// Locate the `# Now` section and gather its checklist items.
///
/// Returns `None` when the document has no `# Now` heading.
pub fn collect_todos(document: &str) -> Option<NowBlock> {
    let mut offset = 0usize;
    let mut start = None;
    let mut end = document.len();

    for line in document.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        match start {
            None if content.trim_end() == NOW_HEADING => start = Some(offset + line.len()),
            Some(_) if is_heading(content) => {
                end = offset;
                break;
            }
            _ => {}
        }
        offset += line.len();
    }

    let start = start?;
    let raw = &document[start..end];

    let mut tasks: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    for line in raw.lines() {
        if is_top_level_item(line) {
            tasks.extend(current.take());
            current = Some(line.to_string());
        } else if line.starts_with([' ', '\t']) && !line.trim().is_empty() {
            if let Some(task) = current.as_mut() {
                task.push('\n');
                task.push_str(line);
            }
        } else {
            tasks.extend(current.take());
        }
    }
    tasks.extend(current);

    Some(NowBlock {
        tasks,
        raw: raw.to_string(),
        range: start..end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\nproject: Home\n---\n# Inbox\n- [ ] not now\n# Now\n- [ ] Buy milk\n\t- oat\n- [x] Call mom [things](things:///show?id=ABC123)\n\nsome prose\n  - [ ] nested\n# Later\n- [ ] Paint fence\n";

    #[test]
    fn test_collects_only_now_section() {
        let block = collect_todos(DOC).unwrap();
        assert_eq!(
            block.tasks,
            vec![
                "- [ ] Buy milk\n\t- oat",
                "- [x] Call mom [things](things:///show?id=ABC123)",
            ]
        );
        assert!(block.raw.starts_with("- [ ] Buy milk"));
        assert!(!block.raw.contains("Paint fence"));
        assert_eq!(&DOC[block.range.clone()], block.raw);
    }

    #[test]
    fn test_unlinked_tasks_skip_linked() {
        let block = collect_todos(DOC).unwrap();
        let unlinked: Vec<&str> = block.unlinked_tasks().collect();
        assert_eq!(unlinked, vec!["- [ ] Buy milk\n\t- oat"]);
    }

    #[test]
    fn test_block_runs_to_end_without_next_heading() {
        let doc = "# Now\n- [ ] a\n- [ ] b";
        let block = collect_todos(doc).unwrap();
        assert_eq!(block.tasks, vec!["- [ ] a", "- [ ] b"]);
        assert_eq!(block.raw, "- [ ] a\n- [ ] b");
    }

    #[test]
    fn test_no_now_heading() {
        assert_eq!(collect_todos("# Nowish\n- [ ] a\n## Now\n- [ ] b"), None);
        assert_eq!(collect_todos(""), None);
    }

    #[test]
    fn test_hashtag_line_is_not_a_heading() {
        let doc = "# Now\n- [ ] a\n#someday\n- [ ] b\n";
        let block = collect_todos(doc).unwrap();
        assert_eq!(block.tasks.len(), 2);
    }

    #[test]
    fn test_predicates() {
        assert!(is_unlinked_item("- [ ] task"));
        assert!(is_unlinked_item("- [x] done"));
        assert!(!is_unlinked_item("\t- [ ] nested"));
        assert!(!is_unlinked_item("- plain bullet"));
        assert!(!is_unlinked_item("- [ ] t [things](things:///show?id=X1)"));
    }
}
