//! Inbound callbacks from Things and the rewrites they drive.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use crate::block::{has_back_reference, is_unlinked_item};
use crate::error::{Result, SyncError};
use crate::extract::strip_markers;
use crate::request::RequestToken;
use crate::settings::CallbackTargets;

pub const SINGLE_ID_PARAM: &str = "x-things-id";
pub const BULK_IDS_PARAM: &str = "x-things-ids";
pub const REQUEST_PARAM: &str = "request";

// Same shape the back-reference and `id=` scans recognise.
static THINGS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("things id regex"));

static CHECKLIST_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+] \[.\]").expect("checklist prefix regex"));

/// An id that round-trips through a back-reference link unchanged.
pub fn is_valid_id(id: &str) -> bool {
    THINGS_ID_RE.is_match(id)
}

fn checked_id(id: String) -> Result<String> {
    if is_valid_id(&id) {
        Ok(id)
    } else {
        Err(SyncError::InvalidId(id))
    }
}

/// Markdown link pointing back at a Things to-do.
pub fn back_reference(id: &str) -> String {
    format!("[things](things:///show?id={id})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCallback {
    Single {
        id: String,
        request: Option<RequestToken>,
    },
    Bulk {
        ids: Vec<String>,
        request: Option<RequestToken>,
    },
}

impl InboundCallback {
    /// Parse a callback URL such as
    /// `obsidian://things-sync-id?request=..&x-things-id=..`.
    pub fn parse(raw: &str, targets: &CallbackTargets) -> Result<Self> {
        let invalid = |reason: String| SyncError::InvalidCallback {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
        if url.scheme() != targets.scheme {
            return Err(invalid(format!("expected scheme {:?}", targets.scheme)));
        }

        let handler = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => url.path().trim_matches('/').to_string(),
        };

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let request = params.get(REQUEST_PARAM).map(RequestToken::new);

        if handler == targets.single_handler {
            let id = params
                .get(SINGLE_ID_PARAM)
                .filter(|id| !id.is_empty())
                .ok_or(SyncError::MissingParameter(SINGLE_ID_PARAM))?;
            Ok(Self::Single {
                id: checked_id(id.clone())?,
                request,
            })
        } else if handler == targets.bulk_handler {
            let raw_ids = params
                .get(BULK_IDS_PARAM)
                .ok_or(SyncError::MissingParameter(BULK_IDS_PARAM))?;
            let ids: Vec<String> = serde_json::from_str(raw_ids).map_err(SyncError::MalformedIds)?;
            let ids = ids.into_iter().map(checked_id).collect::<Result<Vec<_>>>()?;
            Ok(Self::Bulk { ids, request })
        } else {
            Err(SyncError::UnknownHandler(handler))
        }
    }

    pub fn request(&self) -> Option<&RequestToken> {
        match self {
            Self::Single { request, .. } | Self::Bulk { request, .. } => request.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRewrite {
    pub line: String,
    pub changed: bool,
}

/// Attach the back-reference for `id` to the task line.
///
/// A checklist line gets the link appended; any other line is turned into a
/// checklist item first. Lines that already carry a back-reference are left
/// alone, so re-delivering a callback is harmless.
pub fn apply_single_id(line: &str, id: &str) -> LineRewrite {
    if has_back_reference(line) {
        debug!(id, "line already linked; leaving it unchanged");
        return LineRewrite {
            line: line.to_string(),
            changed: false,
        };
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let link = back_reference(id);

    let rewritten = if CHECKLIST_PREFIX_RE.is_match(body) {
        format!("{} {}", line.trim_end(), link)
    } else {
        let text = strip_markers(body).trim_end();
        if text.is_empty() {
            format!("{indent}- [ ] {link}")
        } else {
            format!("{indent}- [ ] {text} {link}")
        }
    };

    LineRewrite {
        line: rewritten,
        changed: true,
    }
}

/// Append ids, in order, to every unlinked top-level checklist line of `raw`.
///
/// Other lines are kept byte for byte and do not consume an id. The count of
/// unlinked lines must equal `ids.len()`.
pub fn rewrite_block(raw: &str, ids: &[String]) -> Result<String> {
    let expected = raw.lines().filter(|line| is_unlinked_item(line)).count();
    if expected != ids.len() {
        return Err(SyncError::IdCountMismatch {
            expected,
            got: ids.len(),
        });
    }

    let mut next_id = ids.iter();
    let mut out = String::with_capacity(raw.len() + ids.len() * 48);
    for line in raw.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let ending = &line[content.len()..];
        let id = if is_unlinked_item(content) {
            next_id.next()
        } else {
            None
        };
        match id {
            Some(id) => {
                out.push_str(content.trim_end());
                out.push(' ');
                out.push_str(&back_reference(id));
                out.push_str(ending);
            }
            None => out.push_str(line),
        }
    }

    Ok(out)
}

/// Rewrite the first occurrence of `raw` in `document` with the ids applied.
pub fn apply_bulk_ids(document: &str, raw: &str, ids: &[String]) -> Result<String> {
    if !document.contains(raw) {
        return Err(SyncError::BlockNotFound);
    }

    let rewritten = rewrite_block(raw, ids)?;
    info!(count = ids.len(), "applied bulk ids to block");
    Ok(document.replacen(raw, &rewritten, 1))
}
