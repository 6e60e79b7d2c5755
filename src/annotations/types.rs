//! Annotation data model
//!
//! One annotation per user note, anchored to a half-open character-offset
//! interval into the flattened text of the page's content root. The wire
//! shape (camelCase field names, RFC 3339 timestamps) matches the persisted
//! record format exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version of the persisted record envelope.
pub const STORAGE_VERSION: u32 = 1;

/// Half-open `[start, end)` character-offset interval into the flattened
/// text content of the document root.
///
/// Offsets count Unicode scalar values. Computed once at creation and never
/// recomputed; the anchor is the offsets, not the captured text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Basic ordering invariant; `start >= 0` holds by type.
    pub fn is_ordered(&self) -> bool {
        self.end >= self.start
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A user note anchored to a text span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique within its page's collection; assigned at creation.
    pub id: String,
    /// Page the annotation belongs to.
    #[serde(rename = "pageUrl")]
    pub page_url: String,
    /// Exact text captured at creation time. Used only for validation
    /// during reconciliation, never as the anchor itself.
    #[serde(rename = "selectedText")]
    pub selected_text: String,
    /// User-editable note; may be empty.
    pub note: String,
    /// The anchor. Immutable once created.
    #[serde(rename = "textRange")]
    pub text_range: TextRange,
    /// Creation time, fixed at creation.
    pub timestamp: DateTime<Utc>,
    /// Advisory cache: whether the last reconciliation pass painted this
    /// anchor. Never authoritative for validity.
    pub highlighted: bool,
}

impl Annotation {
    /// Build a new annotation with a fresh id and the current time.
    pub fn new(page_url: &str, selected_text: &str, note: &str, text_range: TextRange) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_url: page_url.to_string(),
            selected_text: selected_text.to_string(),
            note: note.to_string(),
            text_range,
            timestamp: Utc::now(),
            highlighted: false,
        }
    }
}

/// The versioned per-page envelope actually written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRecord {
    pub version: u32,
    /// Insertion order = display order, oldest first.
    pub annotations: Vec<Annotation>,
}

impl StorageRecord {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self {
            version: STORAGE_VERSION,
            annotations,
        }
    }
}

/// The only two fields an update may touch. Everything else on an
/// [`Annotation`] is immutable after creation, by construction.
#[derive(Debug, Clone, Default)]
pub struct AnnotationUpdate {
    pub note: Option<String>,
    pub highlighted: Option<bool>,
}

impl AnnotationUpdate {
    pub fn note(note: &str) -> Self {
        Self {
            note: Some(note.to_string()),
            ..Default::default()
        }
    }

    pub fn highlighted(highlighted: bool) -> Self {
        Self {
            highlighted: Some(highlighted),
            ..Default::default()
        }
    }

    /// Merge into an annotation, touching only the mutable fields.
    pub fn apply(&self, annotation: &mut Annotation) {
        if let Some(note) = &self.note {
            annotation.note = note.clone();
        }
        if let Some(highlighted) = self.highlighted {
            annotation.highlighted = highlighted;
        }
    }
}
