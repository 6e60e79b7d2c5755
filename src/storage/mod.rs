//! Persistence: key-value backends and the versioned annotation store.

mod backend;
mod store;

pub use backend::{FileBackend, KeyValue, MemoryBackend};
pub use store::{AnnotationStore, SaveOutcome};
