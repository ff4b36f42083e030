//! Outbound requests: URL-scheme calls to Things and to the companion
//! Shortcuts automations.
//!
//! Every JSON payload is a typed record serialized once, then percent-encoded
//! into a single query parameter.

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::block::NowBlock;
use crate::encode::build_url;
use crate::error::Result;
use crate::settings::CallbackTargets;
use crate::target::extract_target;
use crate::task::TaskRecord;

const THINGS_ADD: &str = "things:///add";
const THINGS_JSON: &str = "things:///json";
const THINGS_UPDATE: &str = "things:///update";
const RUN_SHORTCUT: &str = "shortcuts://run-shortcut";

/// Caller-supplied correlation value carried from a creation request to the
/// callback that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Booleans travel as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireBool(pub bool);

impl Serialize for WireBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "true" } else { "false" })
    }
}

fn callback_url(base: String, token: &RequestToken) -> String {
    build_url(&base, &[("request", token.as_str())], false)
}

/// `things:///add` for one task. The deep link is appended to the notes.
pub fn single_create(
    task: &TaskRecord,
    deep_link: &str,
    token: &RequestToken,
    callbacks: &CallbackTargets,
) -> String {
    let notes = format!("{}\n\n{}", task.notes, deep_link);
    let success = callback_url(callbacks.single_url(), token);
    let tags = task.joined_tags();

    let url = build_url(
        THINGS_ADD,
        &[
            ("title", task.title.as_str()),
            ("list", task.project.as_str()),
            ("notes", notes.as_str()),
            ("when", task.date.as_str()),
            ("x-success", success.as_str()),
            ("tags", tags.as_str()),
        ],
        true,
    );
    debug!(%url, "single create request");
    url
}

#[derive(Debug, Serialize)]
struct ThingsItem<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: TodoAttributes<'a>,
}

#[derive(Debug, Serialize)]
struct TodoAttributes<'a> {
    title: &'a str,
    tags: &'a [String],
    #[serde(skip_serializing_if = "is_blank")]
    list: &'a str,
    notes: String,
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

fn bulk_notes(task: &TaskRecord, deep_link: &str) -> String {
    [task.project.as_str(), task.notes.as_str(), deep_link]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `things:///json` creating every task in one call.
///
/// `tasks` must be in the order the bulk callback will assign ids, i.e. the
/// scan order of [`NowBlock::unlinked_tasks`].
///
/// Each to-do's notes are its project, sub-notes and the deep link joined by
/// blank lines, with empty parts left out: a task with no project or
/// sub-notes gets just the deep link.
pub fn bulk_create(
    tasks: &[TaskRecord],
    deep_link: &str,
    token: &RequestToken,
    callbacks: &CallbackTargets,
) -> Result<String> {
    let items: Vec<ThingsItem<'_>> = tasks
        .iter()
        .map(|task| ThingsItem {
            kind: "to-do",
            attributes: TodoAttributes {
                title: &task.title,
                tags: &task.tags,
                list: &task.project,
                notes: bulk_notes(task, deep_link),
            },
        })
        .collect();

    let data = serde_json::to_string(&items)?;
    let success = callback_url(callbacks.bulk_url(), token);
    let url = build_url(
        THINGS_JSON,
        &[
            ("data", data.as_str()),
            ("reveal", "true"),
            ("x-success", success.as_str()),
        ],
        false,
    );
    debug!(count = tasks.len(), "bulk create request");
    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionUpdate {
    pub filename: String,
    pub id: String,
    pub completed: WireBool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkThing {
    pub task: String,
    pub id: String,
    pub status: WireBool,
}

/// Payload for the bulk completion shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkPayload {
    pub things: Vec<BulkThing>,
    pub block: String,
    pub file: String,
}

impl BulkPayload {
    /// Every tracked task of the block with its checkbox state as written.
    pub fn from_block(block: &NowBlock, file: &str) -> Self {
        let things = block
            .tasks
            .iter()
            .filter_map(|task| task.lines().next())
            .filter_map(|line| {
                let target = extract_target(line);
                target.is_tracked().then(|| BulkThing {
                    task: line.to_string(),
                    id: target.todo_id.clone(),
                    status: WireBool(target.completed()),
                })
            })
            .collect();

        Self {
            things,
            block: block.raw.clone(),
            file: file.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }
}

fn run_shortcut<T: Serialize>(shortcut: &str, payload: &T) -> Result<String> {
    let text = serde_json::to_string(payload)?;
    Ok(build_url(
        RUN_SHORTCUT,
        &[("name", shortcut), ("input", "text"), ("text", text.as_str())],
        false,
    ))
}

/// Run the single completion shortcut for one task.
pub fn single_update(shortcut: &str, update: &CompletionUpdate) -> Result<String> {
    let url = run_shortcut(shortcut, update)?;
    debug!(%url, "single update request");
    Ok(url)
}

/// Run the bulk completion shortcut for a whole block.
pub fn bulk_update(shortcut: &str, payload: &BulkPayload) -> Result<String> {
    let url = run_shortcut(shortcut, payload)?;
    debug!(count = payload.things.len(), "bulk update request");
    Ok(url)
}

/// `things:///update` marking one to-do complete. Requires the Things auth token.
pub fn mark_complete(todo_id: &str, auth_token: &str) -> String {
    build_url(
        THINGS_UPDATE,
        &[("id", todo_id), ("completed", "true"), ("auth-token", auth_token)],
        false,
    )
}

/// Tasks of `block` still needing a Things id, as raw first lines.
pub fn pending_lines(block: &NowBlock) -> Vec<&str> {
    block
        .unlinked_tasks()
        .filter_map(|task| task.lines().next())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::collect_todos;
    use crate::target::TargetInfo;

    fn task() -> TaskRecord {
        TaskRecord {
            title: "Buy milk".to_string(),
            tags: vec!["errand".to_string(), "home".to_string()],
            date: "2024-06-05".to_string(),
            project: "Chores".to_string(),
            notes: "\t- oat".to_string(),
        }
    }

    #[test]
    fn test_single_create_url() {
        let url = single_create(
            &task(),
            "obsidian://open?vault=v&file=f",
            &RequestToken::new("tok1"),
            &CallbackTargets::default(),
        );
        assert_eq!(
            url,
            "things:///add?title=Buy%20milk&list=Chores\
             &notes=%09-%20oat%0A%0Aobsidian%3A%2F%2Fopen%3Fvault%3Dv%26file%3Df\
             &when=2024-06-05\
             &x-success=obsidian%3A%2F%2Fthings-sync-id%3Frequest%3Dtok1\
             &tags=errand%2Chome"
        );
    }

    #[test]
    fn test_single_create_omits_empty_fields() {
        let t = TaskRecord {
            title: "Plain".to_string(),
            ..TaskRecord::default()
        };
        let url = single_create(&t, "dl", &RequestToken::new("t"), &CallbackTargets::default());
        assert!(!url.contains("list="));
        assert!(!url.contains("when="));
        assert!(!url.contains("tags="));
        assert!(url.contains("notes=%0A%0Adl"));
    }

    #[test]
    fn test_bulk_create_json() {
        let mut second = task();
        second.title = "Call mom".to_string();
        second.project = String::new();
        second.notes = String::new();

        let url = bulk_create(
            &[task(), second],
            "dl",
            &RequestToken::new("tok2"),
            &CallbackTargets::default(),
        )
        .unwrap();

        let data = url
            .strip_prefix("things:///json?data=")
            .and_then(|rest| rest.split('&').next())
            .unwrap();
        let decoded = percent_encoding::percent_decode_str(data).decode_utf8().unwrap();
        let json: serde_json::Value = serde_json::from_str(&decoded).unwrap();

        assert_eq!(json[0]["type"], "to-do");
        assert_eq!(json[0]["attributes"]["title"], "Buy milk");
        assert_eq!(json[0]["attributes"]["tags"][1], "home");
        assert_eq!(json[0]["attributes"]["list"], "Chores");
        assert_eq!(json[0]["attributes"]["notes"], "Chores\n\n\t- oat\n\ndl");
        assert!(json[1]["attributes"].get("list").is_none());
        assert_eq!(json[1]["attributes"]["notes"], "dl");
        assert!(url.ends_with("&x-success=obsidian%3A%2F%2Fthings-sync-ids%3Frequest%3Dtok2"));
    }

    #[test]
    fn test_single_update_payload() {
        let target = TargetInfo {
            todo_id: "ABC123".to_string(),
            after_status: true,
        };
        let update = CompletionUpdate {
            filename: "daily/2024-06-05".to_string(),
            id: target.todo_id.clone(),
            completed: WireBool(target.after_status),
        };
        let url = single_update("ThingsObsidianDesktop", &update).unwrap();
        let expected_text = r#"{"filename":"daily/2024-06-05","id":"ABC123","completed":"true"}"#;
        assert_eq!(
            url,
            format!(
                "shortcuts://run-shortcut?name=ThingsObsidianDesktop&input=text&text={}",
                crate::encode::encode_component(expected_text)
            )
        );
    }

    #[test]
    fn test_bulk_payload_from_block() {
        let doc = "# Now\n- [x] Call mom [things](things:///show?id=A1)\n- [ ] New one\n- [ ] Pay rent [things](things:///show?id=B2)\n";
        let block = collect_todos(doc).unwrap();
        let payload = BulkPayload::from_block(&block, "daily");

        assert_eq!(payload.things.len(), 2);
        assert_eq!(payload.things[0].id, "A1");
        assert_eq!(payload.things[0].status, WireBool(true));
        assert_eq!(payload.things[1].id, "B2");
        assert_eq!(payload.things[1].status, WireBool(false));
        assert_eq!(payload.block, block.raw);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["things"][0]["status"], "true");
        assert_eq!(json["file"], "daily");
        assert!(bulk_update("Bulk", &payload).unwrap().starts_with("shortcuts://run-shortcut?name=Bulk&"));
    }

    #[test]
    fn test_pending_lines_in_scan_order() {
        let doc = "# Now\n- [ ] a\n- [ ] b [things](things:///show?id=X)\n- [x] c\n";
        let block = collect_todos(doc).unwrap();
        assert_eq!(pending_lines(&block), vec!["- [ ] a", "- [x] c"]);
    }

    #[test]
    fn test_mark_complete_url() {
        assert_eq!(
            mark_complete("ABC123", "tok en"),
            "things:///update?id=ABC123&completed=true&auth-token=tok%20en"
        );
    }
}
