use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::Path;
use thingsync_core::{
    BulkPayload, CompletionUpdate, InboundCallback, RequestToken, TargetInfo, TaskRecord,
    TaskSource, WireBool,
    apply_bulk_ids, apply_single_id, build_task, bulk_create, bulk_update, collect_todos,
    extract_target, mark_complete, pending_lines, single_create, single_update, toggle_checkbox,
};
use tracing::{info, warn};

use crate::config::{Config, load_config};
use crate::dispatch::open_url;
use crate::document::{Note, VaultLocation};
use crate::pending::{PendingKind, PendingRequest, PendingStore, new_token};

const NOT_TRACKED: &str = "This is not a things3 todo";

/// Config, note and vault location for one command run.
struct Session {
    cfg: Config,
    note: Note,
    location: VaultLocation,
}

impl Session {
    fn open(file: &Path) -> Result<Self> {
        let cfg = load_config()?;
        let note = Note::load(file)?;
        let location = VaultLocation::locate(&note.path, cfg.vault_name());
        Ok(Self {
            cfg,
            note,
            location,
        })
    }

    fn task_line(&self, line: usize) -> Option<&str> {
        let text = self.note.line(line);
        if text.is_none() {
            println!("{} has no line {}", self.note.path.display(), line);
        }
        text
    }

    fn build(&self, line: &str) -> TaskRecord {
        let fm = self.note.frontmatter();
        let file_name = self.note.file_stem();
        build_task(
            &TaskSource {
                line,
                file_name: &file_name,
                document: &self.note.text,
                frontmatter: &fm,
            },
            &self.cfg.sync_settings(),
        )
    }
}

pub fn create(file: &Path, line: usize, dry_run: bool) -> Result<()> {
    let session = Session::open(file)?;
    let Some(text) = session.task_line(line) else {
        return Ok(());
    };

    let task = session.build(text);
    if task.title.is_empty() {
        println!("Line {line} has no task text");
        return Ok(());
    }

    let token = new_token();
    let settings = session.cfg.sync_settings();
    let url = single_create(&task, &session.location.deep_link(), &token, &settings.callbacks);

    info!(%token, title = %task.title, "creating todo");
    if dry_run {
        return open_url(&url, true);
    }

    let request = PendingRequest::new(
        &session.note.path,
        PendingKind::Single {
            line_number: line,
            line: text.to_string(),
        },
    );
    let mut store = PendingStore::open_default()?;
    dispatch_recorded(&mut store, &token, request, || open_url(&url, false))
}

pub fn create_now(file: &Path, dry_run: bool) -> Result<()> {
    let session = Session::open(file)?;
    let Some(block) = collect_todos(&session.note.text) else {
        println!("No \"# Now\" section in {}", session.note.path.display());
        return Ok(());
    };

    let lines = pending_lines(&block);
    if lines.is_empty() {
        println!("Every task under \"# Now\" is already linked");
        return Ok(());
    }

    let tasks: Vec<TaskRecord> = lines.iter().map(|line| session.build(line)).collect();
    let token = new_token();
    let settings = session.cfg.sync_settings();
    let url = bulk_create(&tasks, &session.location.deep_link(), &token, &settings.callbacks)?;

    info!(%token, count = tasks.len(), "creating todos from # Now");
    if dry_run {
        return open_url(&url, true);
    }

    let request = PendingRequest::new(
        &session.note.path,
        PendingKind::Bulk {
            block: block.raw.clone(),
            expected: tasks.len(),
        },
    );
    let mut store = PendingStore::open_default()?;
    dispatch_recorded(&mut store, &token, request, || open_url(&url, false))
}

/// Record `request` under `token`, then dispatch. The record is only useful
/// if the request actually left, so a failed dispatch removes it again.
fn dispatch_recorded(
    store: &mut PendingStore,
    token: &RequestToken,
    request: PendingRequest,
    dispatch: impl FnOnce() -> Result<()>,
) -> Result<()> {
    store.insert(token, request);
    store.save()?;

    if let Err(err) = dispatch() {
        store.remove(token);
        store.save()?;
        return Err(err);
    }
    Ok(())
}

pub fn toggle(file: &Path, line: usize, dry_run: bool) -> Result<()> {
    let session = Session::open(file)?;
    let Some(text) = session.task_line(line) else {
        return Ok(());
    };

    let target = extract_target(text);
    if !target.is_tracked() {
        println!("{NOT_TRACKED}");
        return Ok(());
    }

    let update = CompletionUpdate {
        filename: session.location.relative.clone(),
        id: target.todo_id.clone(),
        completed: WireBool(target.after_status),
    };
    let url = single_update(session.cfg.update_shortcut(), &update)?;
    open_url(&url, dry_run)
}

pub fn complete(file: &Path, line: usize, dry_run: bool) -> Result<()> {
    let mut session = Session::open(file)?;
    let Some(text) = session.task_line(line).map(str::to_string) else {
        return Ok(());
    };

    let target = extract_target(&text);
    if !target.is_tracked() {
        println!("{NOT_TRACKED}");
        return Ok(());
    }

    if session.cfg.things.auth_token.is_empty() {
        bail!("things.auth_token is not set; run `thingsync config show` for details");
    }

    let url = mark_complete(&target.todo_id, &session.cfg.things.auth_token);
    open_url(&url, dry_run)?;

    if !dry_run && !target.completed() {
        session.note.replace_line(line, &toggle_checkbox(&text))?;
        session.note.save()?;
        println!("Marked {} complete", target.todo_id);
    }
    Ok(())
}

pub fn sync_now(file: &Path, dry_run: bool) -> Result<()> {
    let session = Session::open(file)?;
    let Some(block) = collect_todos(&session.note.text) else {
        println!("No \"# Now\" section in {}", session.note.path.display());
        return Ok(());
    };

    let payload = BulkPayload::from_block(&block, &session.location.relative);
    if payload.is_empty() {
        println!("No linked tasks under \"# Now\"");
        return Ok(());
    }

    let url = bulk_update(&session.cfg.shortcuts.bulk, &payload)?;
    open_url(&url, dry_run)
}

pub fn callback(url: &str) -> Result<()> {
    let cfg = load_config()?;
    let mut store = PendingStore::open_default()?;
    let message = apply_callback(url, &cfg, &mut store)?;
    println!("{message}");
    Ok(())
}

/// Apply an inbound callback to the note its pending request came from.
///
/// The pending entry is consumed only when the note was updated; any
/// rejection leaves both the note and the store as they were.
fn apply_callback(url: &str, cfg: &Config, store: &mut PendingStore) -> Result<String> {
    let inbound = InboundCallback::parse(url, &cfg.callback)?;
    let token = inbound
        .request()
        .cloned()
        .context("callback carries no request token")?;

    let Some(pending) = store.get(&token).cloned() else {
        bail!("no pending request for token {token}");
    };

    let mut note = Note::load(&pending.file)?;
    let message = match (inbound, pending.kind) {
        (InboundCallback::Single { id, .. }, PendingKind::Single { line_number, line }) => {
            let number = if note.line(line_number) == Some(line.as_str()) {
                line_number
            } else {
                let moved = note
                    .find_line(&line)
                    .with_context(|| format!("task line no longer in {}: {line}", note.path.display()))?;
                warn!(from = line_number, to = moved, "task line moved since the request");
                moved
            };

            let rewrite = apply_single_id(&line, &id);
            if rewrite.changed {
                note.replace_line(number, &rewrite.line)?;
                note.save()?;
            }
            format!("Linked line {number} to {id}")
        }
        (InboundCallback::Bulk { ids, .. }, PendingKind::Bulk { block, expected }) => {
            if ids.len() != expected {
                warn!(expected, got = ids.len(), "id count differs from the request");
            }
            note.text = apply_bulk_ids(&note.text, &block, &ids)?;
            note.save()?;
            format!("Linked {} tasks in {}", ids.len(), note.path.display())
        }
        _ => bail!("callback kind does not match the pending request {token}"),
    };

    store.remove(&token);
    store.save()?;
    info!(%token, remaining = store.len(), "callback applied");
    Ok(message)
}

#[derive(Serialize)]
struct ShowOutput {
    task: TaskRecord,
    target: TargetInfo,
    deep_link: String,
}

pub fn show(file: &Path, line: usize) -> Result<()> {
    let session = Session::open(file)?;
    let Some(text) = session.task_line(line) else {
        return Ok(());
    };

    let out = ShowOutput {
        task: session.build(text),
        target: extract_target(text),
        deep_link: session.location.deep_link(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
