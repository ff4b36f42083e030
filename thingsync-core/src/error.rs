//! Error type for the fallible edges of the sync core.
//!
//! Extraction never fails: a missing match resolves to an empty value. Only
//! callback parsing, block rewriting and payload serialization report errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid callback url {url:?}: {reason}")]
    InvalidCallback { url: String, reason: String },

    #[error("callback handler {0:?} is not registered")]
    UnknownHandler(String),

    #[error("callback is missing the {0:?} parameter")]
    MissingParameter(&'static str),

    #[error("callback id {0:?} is not a plain word id")]
    InvalidId(String),

    #[error("callback ids are not a JSON array of strings")]
    MalformedIds(#[source] serde_json::Error),

    #[error("block has {expected} unlinked tasks but the callback carried {got} ids")]
    IdCountMismatch { expected: usize, got: usize },

    #[error("captured block no longer appears in the document")]
    BlockNotFound,

    #[error("failed to encode request payload")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
