//! Creation requests waiting for their Things callback, keyed by request token.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thingsync_core::RequestToken;
use tracing::debug;

use crate::state::pending_path;

/// Requests older than this never get their callback and are dropped on open.
pub const MAX_PENDING_AGE_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingKind {
    /// `line` is the text the request was built from, at 1-based `line_number`.
    Single { line_number: usize, line: String },
    /// `block` is the raw `# Now` body; `expected` the ids it needs.
    Bulk { block: String, expected: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub file: PathBuf,
    pub created_at_utc: String,
    #[serde(flatten)]
    pub kind: PendingKind,
}

impl PendingRequest {
    pub fn new(file: &Path, kind: PendingKind) -> Self {
        Self {
            file: file.to_path_buf(),
            created_at_utc: Utc::now().to_rfc3339(),
            kind,
        }
    }

    /// Created at or after `cutoff`. An unreadable timestamp counts as stale.
    fn is_fresh(&self, cutoff: DateTime<Utc>) -> bool {
        DateTime::parse_from_rfc3339(&self.created_at_utc)
            .is_ok_and(|created| created.with_timezone(&Utc) >= cutoff)
    }
}

#[derive(Debug)]
pub struct PendingStore {
    path: PathBuf,
    requests: BTreeMap<String, PendingRequest>,
}

impl PendingStore {
    pub fn open_default() -> Result<Self> {
        Self::open(pending_path()?)
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let mut requests: BTreeMap<String, PendingRequest> = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        let cutoff = Utc::now() - Duration::days(MAX_PENDING_AGE_DAYS);
        let before = requests.len();
        requests.retain(|_, request| request.is_fresh(cutoff));
        if requests.len() < before {
            debug!(pruned = before - requests.len(), "dropped stale pending requests");
        }

        Ok(Self { path, requests })
    }

    pub fn insert(&mut self, token: &RequestToken, request: PendingRequest) {
        self.requests.insert(token.as_str().to_string(), request);
    }

    pub fn get(&self, token: &RequestToken) -> Option<&PendingRequest> {
        self.requests.get(token.as_str())
    }

    pub fn remove(&mut self, token: &RequestToken) -> Option<PendingRequest> {
        self.requests.remove(token.as_str())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.requests)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

/// Fresh correlation token for an outbound creation request.
pub fn new_token() -> RequestToken {
    RequestToken::new(uuid::Uuid::new_v4().simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_persists_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let token = new_token();

        let mut store = PendingStore::open(path.clone()).unwrap();
        store.insert(
            &token,
            PendingRequest::new(
                Path::new("/vault/daily.md"),
                PendingKind::Bulk {
                    block: "- [ ] a\n".to_string(),
                    expected: 1,
                },
            ),
        );
        store.save().unwrap();

        let mut reopened = PendingStore::open(path.clone()).unwrap();
        assert_eq!(reopened.len(), 1);
        let req = reopened.remove(&token).unwrap();
        assert_eq!(req.file, PathBuf::from("/vault/daily.md"));
        assert!(matches!(req.kind, PendingKind::Bulk { expected: 1, .. }));
        reopened.save().unwrap();

        assert_eq!(PendingStore::open(path).unwrap().len(), 0);
    }

    #[test]
    fn open_prunes_stale_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let fresh = new_token();
        let stale = new_token();
        let broken = new_token();

        let mut store = PendingStore::open(path.clone()).unwrap();
        let kind = PendingKind::Single {
            line_number: 1,
            line: "- [ ] a".to_string(),
        };
        store.insert(&fresh, PendingRequest::new(Path::new("a.md"), kind.clone()));

        let mut old = PendingRequest::new(Path::new("a.md"), kind.clone());
        old.created_at_utc = (Utc::now() - Duration::days(MAX_PENDING_AGE_DAYS + 1)).to_rfc3339();
        store.insert(&stale, old);

        let mut unreadable = PendingRequest::new(Path::new("a.md"), kind);
        unreadable.created_at_utc = "yesterday".to_string();
        store.insert(&broken, unreadable);
        store.save().unwrap();

        let reopened = PendingStore::open(path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get(&fresh).is_some());
        assert!(reopened.get(&stale).is_none());
        assert!(reopened.get(&broken).is_none());
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }
}
