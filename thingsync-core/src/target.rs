//! Recovering the Things id and checkbox state from an already-synced line.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=(\w+)").expect("id regex"));
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.)\]").expect("status regex"));
static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*[-*+] )\[([ xX])\]").expect("checkbox regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    /// Empty when the line carries no `id=` fragment.
    pub todo_id: String,
    /// Completion state to send next: the complement of the checkbox.
    pub after_status: bool,
}

impl TargetInfo {
    pub fn is_tracked(&self) -> bool {
        !self.todo_id.is_empty()
    }

    /// Current completion state as written in the note.
    pub fn completed(&self) -> bool {
        !self.after_status
    }
}

pub fn extract_target(line: &str) -> TargetInfo {
    let todo_id = ID_RE
        .captures(line)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let after_status = STATUS_RE
        .captures(line)
        .is_some_and(|caps| &caps[1] == " ");

    TargetInfo {
        todo_id,
        after_status,
    }
}

/// Flip the leading checklist marker: `[ ]` becomes `[x]`, `[x]`/`[X]` becomes `[ ]`.
/// Lines without a checklist marker come back unchanged.
pub fn toggle_checkbox(line: &str) -> String {
    CHECKBOX_RE
        .replace(line, |caps: &regex::Captures| {
            let next = if &caps[2] == " " { "x" } else { " " };
            format!("{}[{}]", &caps[1], next)
        })
        .into_owned()
}
