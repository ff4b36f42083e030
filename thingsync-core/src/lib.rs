//! thingsync-core: task extraction from markdown notes and the URL-scheme
//! round trip with Things.
//!
//! Everything here is a pure function of its inputs. The host (editor or CLI)
//! supplies the document text, the task line and the frontmatter, dispatches
//! the produced URLs, and feeds inbound callbacks back in.

pub mod block;
pub mod callback;
pub mod encode;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod notes;
pub mod request;
pub mod settings;
pub mod target;
pub mod task;

pub use block::{NowBlock, collect_todos, has_back_reference, is_unlinked_item};
pub use callback::{
    InboundCallback, LineRewrite, apply_bulk_ids, apply_single_id, back_reference, is_valid_id,
    rewrite_block,
};
pub use error::{Result, SyncError};
pub use extract::{ExtractedTags, extract_date, extract_tags, extract_title};
pub use frontmatter::{AliasFamily, Frontmatter};
pub use notes::extract_notes;
pub use request::{
    BulkPayload, BulkThing, CompletionUpdate, RequestToken, WireBool, bulk_create, bulk_update,
    mark_complete, pending_lines, single_create, single_update,
};
pub use settings::{CallbackTargets, SyncSettings};
pub use target::{TargetInfo, extract_target, toggle_checkbox};
pub use task::{TaskRecord, TaskSource, build_task};
