//! Error types for the annotation engine
//!
//! The public surface is deliberately hard to crash: the storage read path
//! degrades to empty data, write failures resolve to a returned status, and
//! reconciliation skips what it cannot paint. The enums here cover the few
//! places where a caller-visible error is the right answer.

use thiserror::Error;

use crate::document::NodeId;

/// Errors from creating or capturing an annotation.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("selection is empty or whitespace-only")]
    EmptySelection,

    #[error("invalid text range: start {start} > end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("selection does not resolve inside the content root")]
    Unresolvable,
}

/// Errors from the key-value backend underneath the store.
///
/// The store itself never propagates these; it maps them to empty data or a
/// [`SaveOutcome`](crate::storage::SaveOutcome) and logs the detail.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from structural document-tree mutations.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("node {0:?} is not a text node")]
    NotAText(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("offsets {start}..{end} out of bounds for text of length {len}")]
    OffsetOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("node {0:?} has no parent")]
    Detached(NodeId),
}

/// Errors from serializing an export document.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize annotations: {0}")]
    Serialize(#[from] serde_json::Error),
}
