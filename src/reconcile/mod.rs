//! Reconciliation: strip-and-repaint of highlight overlays
//!
//! A pass always starts from a clean document: every existing marker is
//! dissolved back into plain text and adjacent text runs are merged before
//! anything is repainted. Passes are therefore idempotent and never
//! incrementally patched, which keeps overlay state from drifting against
//! the underlying content after arbitrary re-renders.
//!
//! An annotation whose anchor no longer matches the live content is skipped
//! for the pass but kept in storage; content may match again later.

use tracing::{debug, warn};

use crate::anchor::TextIndex;
use crate::annotations::{Annotation, AnnotationUpdate, Repository};
use crate::config::OverlayConfig;
use crate::document::{Document, NodeId, NodeKind};
use crate::error::DocumentError;
use crate::storage::KeyValue;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Annotations successfully painted.
    pub painted: usize,
    /// Ids skipped this pass (invalid anchor or split failure).
    pub skipped: Vec<String>,
}

/// Rebuilds highlight overlays from persisted anchors.
#[derive(Debug, Default)]
pub struct Reconciler {
    config: OverlayConfig,
}

impl Reconciler {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Dissolve every overlay marker under `root` back into plain text and
    /// merge the resulting adjacent text runs.
    pub fn strip_markers(&self, doc: &mut Document, root: NodeId) {
        let markers: Vec<NodeId> = doc
            .descendants(root)
            .into_iter()
            .filter(|&n| {
                matches!(doc.kind(n), NodeKind::Element { tag, .. } if tag == &self.config.marker_tag)
                    && doc.attr(n, &self.config.id_attribute).is_some()
            })
            .collect();
        for marker in markers {
            if let Err(e) = doc.unwrap_element(marker) {
                // Nested markers can detach an outer one before we get to
                // it; nothing left to dissolve then.
                debug!(error = %e, "marker already detached during strip");
            }
        }
        doc.normalize(root);
    }

    /// One full pass: strip, then validate and paint every stored
    /// annotation. A failure on one annotation never aborts the batch.
    pub fn reconcile<B: KeyValue>(
        &self,
        doc: &mut Document,
        root: NodeId,
        repo: &mut Repository<B>,
    ) -> ReconcileReport {
        self.strip_markers(doc, root);

        let mut report = ReconcileReport::default();
        for annotation in repo.list() {
            if !self.validate(doc, root, &annotation) {
                report.skipped.push(annotation.id.clone());
                continue;
            }
            match self.paint(doc, root, &annotation) {
                Ok(0) => {
                    warn!(id = %annotation.id, "anchor intersects no text node, skipping");
                    report.skipped.push(annotation.id.clone());
                }
                Ok(_) => {
                    repo.update(&annotation.id, AnnotationUpdate::highlighted(true));
                    report.painted += 1;
                }
                Err(e) => {
                    warn!(id = %annotation.id, error = %e, "failed to paint annotation");
                    report.skipped.push(annotation.id.clone());
                }
            }
        }

        if !report.skipped.is_empty() {
            warn!(
                count = report.skipped.len(),
                "annotations could not be highlighted this pass"
            );
        }
        report
    }

    /// Anchor validation: the ordering invariant must hold and the live
    /// substring at the anchor must equal the stored captured text, both
    /// sides whitespace-normalized. Whitespace-only drift is accepted.
    fn validate(&self, doc: &Document, root: NodeId, annotation: &Annotation) -> bool {
        let range = annotation.text_range;
        if !range.is_ordered() {
            warn!(id = %annotation.id, start = range.start, end = range.end, "invalid text range");
            return false;
        }

        let content = doc.text_content(root);
        let live: String = content
            .chars()
            .skip(range.start)
            .take(range.len())
            .collect();

        let live_normalized = normalize_whitespace(&live);
        let stored_normalized = normalize_whitespace(&annotation.selected_text);
        if live_normalized != stored_normalized {
            warn!(
                id = %annotation.id,
                expected = %stored_normalized,
                found = %live_normalized,
                "content mismatch at anchor"
            );
            return false;
        }
        true
    }

    /// Wrap every text segment the anchor intersects in a marker element.
    /// Returns the number of markers created.
    ///
    /// The index is rebuilt per annotation: painting splits text nodes, so
    /// spans from a previous annotation's paint are stale.
    fn paint(
        &self,
        doc: &mut Document,
        root: NodeId,
        annotation: &Annotation,
    ) -> Result<usize, DocumentError> {
        let index = TextIndex::build(doc, root);
        let segments = index.segments(annotation.text_range.start, annotation.text_range.end);

        for segment in &segments {
            let marker =
                doc.split_and_wrap(segment.node, segment.local_start, segment.local_end, &self.config.marker_tag)?;
            doc.set_attr(marker, "class", &self.config.class_name)?;
            doc.set_attr(marker, &self.config.id_attribute, &annotation.id)?;
            let hover = if annotation.note.is_empty() {
                &self.config.empty_note_hint
            } else {
                &annotation.note
            };
            doc.set_attr(marker, &self.config.note_attribute, hover)?;
        }
        Ok(segments.len())
    }

    /// All marker elements under `root` for a given annotation id, in
    /// document order. Fragments of one annotation share the id and form
    /// one logical unit.
    pub fn markers_for(&self, doc: &Document, root: NodeId, id: &str) -> Vec<NodeId> {
        doc.descendants(root)
            .into_iter()
            .filter(|&n| doc.attr(n, &self.config.id_attribute) == Some(id))
            .collect()
    }
}

/// Collapse whitespace runs to single spaces and trim the ends.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::TextRange;
    use crate::storage::{AnnotationStore, MemoryBackend};

    fn repo() -> Repository<MemoryBackend> {
        Repository::new(AnnotationStore::new(MemoryBackend::new()), "test-page")
    }

    fn single_paragraph() -> Document {
        let mut doc = Document::new("article");
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, "Hello world");
        doc
    }

    fn marker_texts(doc: &Document, reconciler: &Reconciler, id: &str) -> Vec<String> {
        reconciler
            .markers_for(doc, doc.root(), id)
            .into_iter()
            .map(|m| doc.text_content(m))
            .collect()
    }

    #[test]
    fn test_exact_single_node_anchor() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let a = repo.create("world", "", TextRange::new(6, 11), "/p").unwrap();

        let reconciler = Reconciler::default();
        let root = doc.root();
        let report = reconciler.reconcile(&mut doc, root, &mut repo);

        assert_eq!(report.painted, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(marker_texts(&doc, &reconciler, &a.id), vec!["world"]);
        assert!(repo.get_by_id(&a.id).unwrap().highlighted);
        // The flattened text is untouched by painting.
        assert_eq!(doc.text_content(doc.root()), "Hello world");
    }

    #[test]
    fn test_multi_node_anchor_shares_one_id() {
        let mut doc = Document::new("article");
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, "Hello ");
        let em = doc.append_element(p, "em");
        doc.append_text(em, "brave");
        doc.append_text(p, " world");

        let mut repo = repo();
        // "lo brave wo" spans all three text nodes.
        let a = repo.create("lo brave wo", "", TextRange::new(3, 14), "/p").unwrap();

        let reconciler = Reconciler::default();
        let root = doc.root();
        let report = reconciler.reconcile(&mut doc, root, &mut repo);

        assert_eq!(report.painted, 1);
        let texts = marker_texts(&doc, &reconciler, &a.id);
        assert!(texts.len() >= 2);
        assert_eq!(texts.concat(), "lo brave wo");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let a = repo.create("world", "", TextRange::new(6, 11), "/p").unwrap();

        let reconciler = Reconciler::default();
        let root = doc.root();
        reconciler.reconcile(&mut doc, root, &mut repo);
        let first: Vec<String> = marker_texts(&doc, &reconciler, &a.id);

        let root = doc.root();
        reconciler.reconcile(&mut doc, root, &mut repo);
        let second: Vec<String> = marker_texts(&doc, &reconciler, &a.id);

        assert_eq!(first, second);
        assert_eq!(doc.text_content(doc.root()), "Hello world");
    }

    #[test]
    fn test_drifted_content_is_skipped_not_deleted() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let a = repo.create("world", "", TextRange::new(6, 11), "/p").unwrap();

        // The page re-rendered with different content at the anchor.
        let mut drifted = Document::new("article");
        let p = drifted.append_element(drifted.root(), "p");
        drifted.append_text(p, "Hello planet");

        let reconciler = Reconciler::default();
        let root = drifted.root();
        let report = reconciler.reconcile(&mut drifted, root, &mut repo);

        assert_eq!(report.painted, 0);
        assert_eq!(report.skipped, vec![a.id.clone()]);
        assert!(reconciler.markers_for(&drifted, drifted.root(), &a.id).is_empty());
        // Still retrievable; a future pass may paint it again.
        assert!(repo.get_by_id(&a.id).is_some());

        let root = doc.root();
        let report = reconciler.reconcile(&mut doc, root, &mut repo);
        assert_eq!(report.painted, 1);
    }

    #[test]
    fn test_whitespace_only_drift_still_matches() {
        let mut doc = Document::new("article");
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, "Hello  big\nworld");

        let mut repo = repo();
        // Captured with collapsed whitespace, as a UI would hand it over.
        repo.create("big world", "", TextRange::new(7, 16), "/p").unwrap();

        let root = doc.root();
        let report = Reconciler::default().reconcile(&mut doc, root, &mut repo);
        assert_eq!(report.painted, 1);
    }

    #[test]
    fn test_inverted_range_in_storage_is_skipped() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let a = repo.create("world", "", TextRange::new(6, 11), "/p").unwrap();

        // Corrupt the stored range directly through the storage layer to
        // simulate a bad record; the repository itself refuses these.
        let mut store = AnnotationStore::new(MemoryBackend::new());
        let mut broken = a.clone();
        broken.text_range = TextRange::new(11, 6);
        store.save("test-page", &[broken]);
        let mut repo = Repository::new(store, "test-page");

        let root = doc.root();
        let report = Reconciler::default().reconcile(&mut doc, root, &mut repo);
        assert_eq!(report.painted, 0);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_one_bad_annotation_does_not_abort_batch() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let mut drifting = repo.create("Hello", "", TextRange::new(0, 5), "/p").unwrap();
        repo.create("world", "", TextRange::new(6, 11), "/p").unwrap();

        // Make the first annotation's captured text stale.
        drifting.selected_text = "Goodbye".to_string();
        let store = {
            let mut list = repo.list();
            list[0] = drifting;
            let mut s = AnnotationStore::new(MemoryBackend::new());
            s.save("test-page", &list);
            s
        };
        let mut repo = Repository::new(store, "test-page");

        let root = doc.root();
        let report = Reconciler::default().reconcile(&mut doc, root, &mut repo);
        assert_eq!(report.painted, 1);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_note_becomes_hover_text() {
        let mut doc = single_paragraph();
        let mut repo = repo();
        let a = repo.create("world", "remember this", TextRange::new(6, 11), "/p").unwrap();

        let reconciler = Reconciler::default();
        let root = doc.root();
        reconciler.reconcile(&mut doc, root, &mut repo);

        let marker = reconciler.markers_for(&doc, doc.root(), &a.id)[0];
        assert_eq!(doc.attr(marker, "title"), Some("remember this"));
        assert_eq!(doc.attr(marker, "class"), Some("annotation-highlight"));
    }
}
