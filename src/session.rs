//! Page session facade
//!
//! The host owns the rendered document and the navigation lifecycle; after
//! every content swap it materializes the content root into a [`Document`]
//! and calls [`Annotator::mount`], which runs the initial reconciliation
//! pass. (Any brief wait for rendering to settle is the host's business -
//! mount when the content is in place.) Tearing the page down means
//! consuming the handle via [`Annotator::unmount`], the single teardown
//! point for everything set up at mount.
//!
//! Selections are carried as short-lived [`SelectionContext`] values,
//! created when the selection happens and passed to the save action; there
//! is no process-wide "current selection" state.

use chrono::Utc;
use tracing::debug;

use crate::anchor::{SelectionRange, TextIndex};
use crate::annotations::{Annotation, AnnotationUpdate, Repository, TextRange};
use crate::config::OverlayConfig;
use crate::document::{Document, NodeId};
use crate::error::{AnnotationError, ExportError};
use crate::export::{self, ExportFormat};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::storage::{AnnotationStore, KeyValue, SaveOutcome};

/// A captured selection: the trimmed text and its resolved anchor.
///
/// Created by the selection handler, consumed by the save action.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    selected_text: String,
    range: TextRange,
}

impl SelectionContext {
    /// Resolve a live selection against the content root.
    ///
    /// Rejects selections that do not resolve inside the root, collapse to
    /// an empty interval, or cover only whitespace - none of those may
    /// become annotations.
    pub fn capture(
        doc: &Document,
        root: NodeId,
        selection: SelectionRange,
    ) -> Result<Self, AnnotationError> {
        let index = TextIndex::build(doc, root);
        let range = index
            .range_to_offsets(&selection)
            .ok_or(AnnotationError::Unresolvable)?;
        if !range.is_ordered() {
            return Err(AnnotationError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.is_empty() {
            return Err(AnnotationError::EmptySelection);
        }

        let content = doc.text_content(root);
        let selected: String = content.chars().skip(range.start).take(range.len()).collect();
        let trimmed = selected.trim();
        if trimmed.is_empty() {
            return Err(AnnotationError::EmptySelection);
        }

        Ok(Self {
            selected_text: trimmed.to_string(),
            range,
        })
    }

    pub fn selected_text(&self) -> &str {
        &self.selected_text
    }

    pub fn range(&self) -> TextRange {
        self.range
    }
}

/// Everything a mounted page needs: repository, reconciler, and page
/// identity. One per content root, recreated after every content swap.
#[derive(Debug)]
pub struct Annotator<B: KeyValue> {
    repo: Repository<B>,
    reconciler: Reconciler,
    page_url: String,
}

impl<B: KeyValue> Annotator<B> {
    /// Set up a page session and run the initial reconciliation pass.
    pub fn mount(
        store: AnnotationStore<B>,
        config: OverlayConfig,
        page_key: &str,
        page_url: &str,
        doc: &mut Document,
        root: NodeId,
    ) -> Self {
        let mut annotator = Self {
            repo: Repository::new(store, page_key),
            reconciler: Reconciler::new(config),
            page_url: page_url.to_string(),
        };
        let report = annotator.reconcile(doc, root);
        debug!(
            page_key,
            painted = report.painted,
            skipped = report.skipped.len(),
            "mounted annotator"
        );
        annotator
    }

    /// Capture a selection against the mounted content root.
    pub fn capture(
        &self,
        doc: &Document,
        root: NodeId,
        selection: SelectionRange,
    ) -> Result<SelectionContext, AnnotationError> {
        SelectionContext::capture(doc, root, selection)
    }

    /// Save a captured selection with a note, then repaint so the new
    /// highlight appears immediately.
    pub fn annotate(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        ctx: SelectionContext,
        note: &str,
    ) -> Result<Annotation, AnnotationError> {
        let annotation =
            self.repo
                .create(&ctx.selected_text, note.trim(), ctx.range, &self.page_url)?;
        self.reconcile(doc, root);
        Ok(annotation)
    }

    /// Change the note on an existing annotation.
    pub fn edit_note(&mut self, id: &str, note: &str) -> bool {
        self.repo.update(id, AnnotationUpdate::note(note.trim()))
    }

    /// Delete one annotation and repaint.
    pub fn remove(&mut self, doc: &mut Document, root: NodeId, id: &str) -> bool {
        let removed = self.repo.delete(id);
        if removed {
            self.reconcile(doc, root);
        }
        removed
    }

    /// Delete the page's entire record and strip all overlays.
    pub fn clear(&mut self, doc: &mut Document, root: NodeId) -> bool {
        let cleared = self.repo.delete_all();
        self.reconcile(doc, root);
        cleared
    }

    /// Run a full strip-and-repaint pass.
    pub fn reconcile(&mut self, doc: &mut Document, root: NodeId) -> ReconcileReport {
        self.reconciler.reconcile(doc, root, &mut self.repo)
    }

    /// Export the page's annotations in the given format.
    pub fn export(&mut self, format: ExportFormat) -> Result<String, ExportError> {
        let annotations = self.repo.list();
        match format {
            ExportFormat::Json => export::to_json(&annotations),
            ExportFormat::Markdown => Ok(export::to_markdown(
                &self.page_url,
                &annotations,
                Utc::now(),
            )),
        }
    }

    pub fn annotation_count(&mut self) -> usize {
        self.repo.count()
    }

    /// Outcome of the last write; [`SaveOutcome::QuotaExceeded`] is the cue
    /// for a user-visible warning.
    pub fn last_save(&self) -> SaveOutcome {
        self.repo.last_save()
    }

    pub fn repository(&mut self) -> &mut Repository<B> {
        &mut self.repo
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Tear the session down. Consuming the handle is the single teardown
    /// point; nothing set up at mount survives it.
    pub fn unmount(self) {
        debug!(page_key = %self.repo.page_key(), "unmounted annotator");
    }
}
