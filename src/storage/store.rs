//! Versioned annotation store
//!
//! Reads and writes one [`StorageRecord`] per page key, tolerant of absent
//! or legacy storage. Every operation is total: failures degrade to empty
//! data or a returned soft-error status, never a propagated error. The
//! detail goes to the log.

use serde_json::Value;
use tracing::{debug, warn};

use crate::annotations::{Annotation, StorageRecord, STORAGE_VERSION};
use crate::storage::KeyValue;

/// Outcome of a write. Quota exhaustion is the one failure the caller is
/// expected to surface to the user; `Failed` is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveOutcome {
    #[default]
    Persisted,
    QuotaExceeded,
    Failed,
}

/// Namespaced storage of versioned annotation lists.
#[derive(Debug)]
pub struct AnnotationStore<B: KeyValue> {
    backend: B,
}

impl<B: KeyValue> AnnotationStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Load the annotation list for a page.
    ///
    /// Absent or unparsable payloads yield an empty list. A bare-array
    /// legacy payload is wrapped into a versioned record, written back
    /// once, and returned as-is. A version other than the current schema
    /// is unrecognized and yields an empty list; no rollback migration is
    /// attempted.
    pub fn load(&mut self, page_key: &str) -> Vec<Annotation> {
        let raw = match self.backend.get(page_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(page_key, error = %e, "annotation storage unavailable, treating as empty");
                return Vec::new();
            }
        };

        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(page_key, error = %e, "unparsable annotation payload, treating as empty");
                return Vec::new();
            }
        };

        if parsed.is_array() {
            return self.migrate_legacy(page_key, parsed);
        }

        match serde_json::from_value::<StorageRecord>(parsed) {
            Ok(record) if record.version == STORAGE_VERSION => record.annotations,
            Ok(record) => {
                warn!(
                    page_key,
                    version = record.version,
                    "unrecognized annotation schema version, treating as empty"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(page_key, error = %e, "malformed annotation record, treating as empty");
                Vec::new()
            }
        }
    }

    /// Wrap a legacy bare-array payload into the versioned envelope and
    /// write it back once. The legacy shape is never re-emitted.
    fn migrate_legacy(&mut self, page_key: &str, parsed: Value) -> Vec<Annotation> {
        let annotations: Vec<Annotation> = match serde_json::from_value(parsed) {
            Ok(list) => list,
            Err(e) => {
                warn!(page_key, error = %e, "malformed legacy annotation list, treating as empty");
                return Vec::new();
            }
        };
        debug!(page_key, count = annotations.len(), "migrating legacy annotation list");
        self.save(page_key, &annotations);
        annotations
    }

    /// Persist a version-tagged record for a page.
    pub fn save(&mut self, page_key: &str, annotations: &[Annotation]) -> SaveOutcome {
        let record = StorageRecord::new(annotations.to_vec());
        let payload = match serde_json::to_string(&record) {
            Ok(p) => p,
            Err(e) => {
                warn!(page_key, error = %e, "failed to serialize annotation record");
                return SaveOutcome::Failed;
            }
        };
        match self.backend.set(page_key, &payload) {
            Ok(()) => SaveOutcome::Persisted,
            Err(crate::error::BackendError::QuotaExceeded) => {
                warn!(page_key, "annotation storage quota exceeded");
                SaveOutcome::QuotaExceeded
            }
            Err(e) => {
                warn!(page_key, error = %e, "failed to write annotation record");
                SaveOutcome::Failed
            }
        }
    }

    /// Delete the record for a page outright. A missing key is not an
    /// error; other failures are logged and swallowed.
    pub fn remove(&mut self, page_key: &str) {
        if let Err(e) = self.backend.remove(page_key) {
            warn!(page_key, error = %e, "failed to remove annotation record");
        }
    }
}
