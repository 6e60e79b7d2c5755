//! Annotation data model and per-page CRUD repository.

mod repository;
mod types;

pub use repository::Repository;
pub use types::{Annotation, AnnotationUpdate, StorageRecord, TextRange, STORAGE_VERSION};
