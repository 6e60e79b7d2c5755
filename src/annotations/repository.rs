//! Annotation repository
//!
//! CRUD orchestration layered on the store. The unit of change is the
//! whole per-page list: every mutation loads, edits, and writes back
//! (read-modify-write, single-writer last-write-wins).

use tracing::debug;

use crate::annotations::{Annotation, AnnotationUpdate, TextRange};
use crate::error::AnnotationError;
use crate::storage::{AnnotationStore, KeyValue, SaveOutcome};

/// Per-page annotation CRUD over an [`AnnotationStore`].
#[derive(Debug)]
pub struct Repository<B: KeyValue> {
    store: AnnotationStore<B>,
    page_key: String,
    last_save: SaveOutcome,
}

impl<B: KeyValue> Repository<B> {
    pub fn new(store: AnnotationStore<B>, page_key: &str) -> Self {
        Self {
            store,
            page_key: page_key.to_string(),
            last_save: SaveOutcome::Persisted,
        }
    }

    pub fn page_key(&self) -> &str {
        &self.page_key
    }

    /// Outcome of the most recent write. [`SaveOutcome::QuotaExceeded`] is
    /// the caller's cue to warn the user; in-memory state is not rolled
    /// back, so freeing space and retrying works.
    pub fn last_save(&self) -> SaveOutcome {
        self.last_save
    }

    /// The current list, oldest first.
    pub fn list(&mut self) -> Vec<Annotation> {
        self.store.load(&self.page_key)
    }

    pub fn count(&mut self) -> usize {
        self.list().len()
    }

    /// Create and persist a new annotation, appended to the page's list.
    ///
    /// Rejects empty captured text and inverted ranges; both indicate a
    /// selection that should never have reached the repository.
    pub fn create(
        &mut self,
        selected_text: &str,
        note: &str,
        text_range: TextRange,
        page_url: &str,
    ) -> Result<Annotation, AnnotationError> {
        if selected_text.trim().is_empty() {
            return Err(AnnotationError::EmptySelection);
        }
        if !text_range.is_ordered() || text_range.is_empty() {
            return Err(AnnotationError::InvalidRange {
                start: text_range.start,
                end: text_range.end,
            });
        }

        let annotation = Annotation::new(page_url, selected_text, note, text_range);
        let mut annotations = self.list();
        annotations.push(annotation.clone());
        self.last_save = self.store.save(&self.page_key, &annotations);
        debug!(id = %annotation.id, page_key = %self.page_key, "created annotation");
        Ok(annotation)
    }

    pub fn get_by_id(&mut self, id: &str) -> Option<Annotation> {
        self.list().into_iter().find(|a| a.id == id)
    }

    /// Merge the mutable fields into the annotation with the given id.
    /// `false` when the id is unknown.
    pub fn update(&mut self, id: &str, update: AnnotationUpdate) -> bool {
        let mut annotations = self.list();
        let Some(annotation) = annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        update.apply(annotation);
        self.last_save = self.store.save(&self.page_key, &annotations);
        true
    }

    /// Remove by id. `false` when the id is unknown.
    pub fn delete(&mut self, id: &str) -> bool {
        let mut annotations = self.list();
        let before = annotations.len();
        annotations.retain(|a| a.id != id);
        if annotations.len() == before {
            return false;
        }
        self.last_save = self.store.save(&self.page_key, &annotations);
        true
    }

    /// Drop the page's entire record.
    pub fn delete_all(&mut self) -> bool {
        self.store.remove(&self.page_key);
        true
    }
}
