//! Task records: what one checklist line becomes before it is sent to Things.

use serde::Serialize;
use tracing::debug;

use crate::extract::{extract_date, extract_tags, extract_title};
use crate::frontmatter::Frontmatter;
use crate::notes::extract_notes;
use crate::settings::SyncSettings;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskRecord {
    pub title: String,
    pub tags: Vec<String>,
    /// Leading date of the file name, empty if it has none.
    pub date: String,
    /// Resolved frontmatter project, empty if none.
    pub project: String,
    /// Tab-indented sub-items, newline-joined.
    pub notes: String,
}

impl TaskRecord {
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}

/// Everything a task is built from. The host supplies all of it explicitly.
#[derive(Debug, Clone, Copy)]
pub struct TaskSource<'a> {
    pub line: &'a str,
    /// File name without extension; only its leading date is used.
    pub file_name: &'a str,
    pub document: &'a str,
    pub frontmatter: &'a Frontmatter,
}

/// Compose the extractors into a [`TaskRecord`].
///
/// The document context label is added as a tag when present, otherwise the
/// configured default tags are.
pub fn build_task(source: &TaskSource<'_>, settings: &SyncSettings) -> TaskRecord {
    let line = source.line.trim();

    let extra = match source.frontmatter.context() {
        Some(context) => vec![context],
        None => settings.default_tags.clone(),
    };

    // Tags come off first so they never reach the title.
    let tags = extract_tags(line, &extra);
    let record = TaskRecord {
        title: extract_title(&tags.stripped),
        tags: tags.tags,
        date: extract_date(source.file_name),
        project: source.frontmatter.project().unwrap_or_default(),
        notes: extract_notes(line, source.document),
    };

    debug!(title = %record.title, tags = ?record.tags, project = %record.project, "built task record");
    record
}
