//! Sub-note collection for a single task line.

const ITEM_DELIMITER: &str = "\n- ";
const SUB_ITEM_MARKER: &str = "\t- ";

/// Collect the tab-indented sub-items that follow `task_line` in `document`.
///
/// The document is split into list items on `"\n- "`; the first item whose
/// text contains the task line (minus its leading `- `) is taken, its first
/// line dropped and every remaining line containing `"\t- "` kept. Duplicate
/// task text is not disambiguated: the first match wins.
pub fn extract_notes(task_line: &str, document: &str) -> String {
    let trimmed = task_line.trim();
    let key = trimmed.strip_prefix("- ").unwrap_or(trimmed);
    if key.is_empty() {
        return String::new();
    }

    let Some(item) = document.split(ITEM_DELIMITER).find(|item| item.contains(key)) else {
        return String::new();
    };

    item.lines()
        .skip(1)
        .filter(|line| line.contains(SUB_ITEM_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}
