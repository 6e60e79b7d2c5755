//! Marginalia - content-anchored text annotations
//!
//! A reader selects a span of rendered text, attaches a note to it, and the
//! note survives reloads as a highlight overlay anchored to the same text.
//! Anchors are plain `{start, end}` character offsets into the flattened
//! text of a document root, so they stay valid across arbitrary structural
//! re-renders as long as the text itself is unchanged.
//!
//! The crate is organized around a small set of collaborators:
//!
//! - [`document`] - arena-based document tree the host materializes its
//!   rendered content into; supports text-node splitting and marker removal.
//! - [`anchor`] - converts between live selections and absolute character
//!   offsets, and back to the text nodes an offset interval intersects.
//! - [`storage`] - namespaced key-value persistence of a versioned
//!   annotation list, with migration of the legacy (bare array) shape.
//! - [`annotations`] - the annotation data model and CRUD repository.
//! - [`reconcile`] - strip-and-repaint rebuild of highlight markers against
//!   freshly rendered content, tolerant of content drift.
//! - [`export`] - JSON and Markdown dumps of a page's annotations.
//! - [`session`] - the `Annotator` facade tying the above together for a
//!   single mounted page.

pub mod anchor;
pub mod annotations;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod reconcile;
pub mod session;
pub mod storage;

pub use anchor::{Segment, SelectionRange, TextIndex};
pub use annotations::{Annotation, AnnotationUpdate, Repository, StorageRecord, TextRange};
pub use config::OverlayConfig;
pub use document::{Document, NodeId, NodeKind};
pub use error::{AnnotationError, BackendError, DocumentError, ExportError};
pub use export::ExportFormat;
pub use reconcile::{ReconcileReport, Reconciler};
pub use session::{Annotator, SelectionContext};
pub use storage::{AnnotationStore, FileBackend, KeyValue, MemoryBackend, SaveOutcome};
