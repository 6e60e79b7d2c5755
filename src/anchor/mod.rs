//! Anchor resolution
//!
//! Converts between live selection coordinates and content-stable absolute
//! character offsets, and back to the text nodes an offset interval
//! intersects. Both directions run over the same [`TextIndex`]: an ordered
//! arena of `{node, start, end}` spans built by one iterative pre-order
//! walk with a running prefix sum, so deep documents never recurse.
//!
//! The index is a snapshot. Rebuild it after any structural edit; stale
//! indexes resolve against nodes that may no longer be attached.

use crate::annotations::TextRange;
use crate::document::{Document, NodeId};

/// One text leaf and the absolute offsets it occupies in the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// A text node together with the clamped local sub-interval an anchor
/// covers inside it. Local offsets are `char` counts into the node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub node: NodeId,
    pub local_start: usize,
    pub local_end: usize,
}

/// A live selection: (node, local offset) pairs for both ends, in document
/// order. The crate's stand-in for a DOM range.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRange {
    pub start_node: NodeId,
    pub start_offset: usize,
    pub end_node: NodeId,
    pub end_offset: usize,
}

/// Prefix-sum index over the text leaves under a root.
#[derive(Debug)]
pub struct TextIndex {
    spans: Vec<TextSpan>,
    total: usize,
}

impl TextIndex {
    /// Walk the text leaves under `root` in document order, accumulating
    /// lengths. Non-text nodes contribute no characters.
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut spans = Vec::new();
        let mut pos = 0;
        for node in doc.text_nodes(root) {
            let len = doc.text(node).map(|t| t.chars().count()).unwrap_or(0);
            spans.push(TextSpan {
                node,
                start: pos,
                end: pos + len,
            });
            pos += len;
        }
        Self { spans, total: pos }
    }

    /// Total character count of the flattened text.
    pub fn total_len(&self) -> usize {
        self.total
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Absolute offset at which `node`'s `local`-th character falls.
    ///
    /// `None` when the node is not a text leaf under the indexed root.
    /// A local offset past the node's end clamps to the node's length, so
    /// an end-of-node selection anchor resolves to the node's upper bound.
    pub fn offset_at(&self, node: NodeId, local: usize) -> Option<usize> {
        self.spans
            .iter()
            .find(|s| s.node == node)
            .map(|s| s.start + local.min(s.end - s.start))
    }

    /// Resolve both ends of a selection to an absolute offset interval.
    pub fn range_to_offsets(&self, sel: &SelectionRange) -> Option<TextRange> {
        let start = self.offset_at(sel.start_node, sel.start_offset)?;
        let end = self.offset_at(sel.end_node, sel.end_offset)?;
        Some(TextRange::new(start, end))
    }

    /// Every text node whose interval overlaps `[start, end)`, with the
    /// clamped local sub-interval per node. The inverse operation used
    /// during overlay painting.
    ///
    /// Empty when nothing overlaps - including the `start == end` case,
    /// which intersects no node by construction.
    pub fn segments(&self, start: usize, end: usize) -> Vec<Segment> {
        self.spans
            .iter()
            .filter(|s| s.end > start && s.start < end)
            .map(|s| Segment {
                node: s.node,
                local_start: start.saturating_sub(s.start),
                local_end: (s.end - s.start).min(end - s.start),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// <article><p>"Hello "<em>"brave"</em>" world"</p><p>"Next"</p></article>
    fn sample() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("article");
        let p1 = doc.append_element(doc.root(), "p");
        let t1 = doc.append_text(p1, "Hello ");
        let em = doc.append_element(p1, "em");
        let t2 = doc.append_text(em, "brave");
        let t3 = doc.append_text(p1, " world");
        let p2 = doc.append_element(doc.root(), "p");
        let t4 = doc.append_text(p2, "Next");
        (doc, vec![t1, t2, t3, t4])
    }

    #[test]
    fn test_prefix_sums_follow_document_order() {
        let (doc, texts) = sample();
        let index = TextIndex::build(&doc, doc.root());

        assert_eq!(index.total_len(), "Hello brave worldNext".chars().count());
        assert_eq!(index.spans()[0], TextSpan { node: texts[0], start: 0, end: 6 });
        assert_eq!(index.spans()[1], TextSpan { node: texts[1], start: 6, end: 11 });
        assert_eq!(index.spans()[2], TextSpan { node: texts[2], start: 11, end: 17 });
        assert_eq!(index.spans()[3], TextSpan { node: texts[3], start: 17, end: 21 });
    }

    #[test]
    fn test_offset_at_resolves_local_positions() {
        let (doc, texts) = sample();
        let index = TextIndex::build(&doc, doc.root());

        assert_eq!(index.offset_at(texts[0], 0), Some(0));
        assert_eq!(index.offset_at(texts[1], 3), Some(9));
        // End-of-node anchor clamps to the node's upper bound.
        assert_eq!(index.offset_at(texts[1], 99), Some(11));
    }

    #[test]
    fn test_offset_at_unknown_node_is_none() {
        let (doc, _) = sample();
        let index = TextIndex::build(&doc, doc.root());
        // The root is an element, never indexed.
        assert_eq!(index.offset_at(doc.root(), 0), None);
    }

    #[test]
    fn test_range_to_offsets_spans_nodes() {
        let (doc, texts) = sample();
        let index = TextIndex::build(&doc, doc.root());

        let sel = SelectionRange {
            start_node: texts[0],
            start_offset: 2,
            end_node: texts[2],
            end_offset: 3,
        };
        assert_eq!(index.range_to_offsets(&sel), Some(TextRange::new(2, 14)));
    }

    #[test]
    fn test_segments_clamp_per_node() {
        let (doc, texts) = sample();
        let index = TextIndex::build(&doc, doc.root());

        // "lo brave wo" = [3, 14)
        let segments = index.segments(3, 14);
        assert_eq!(
            segments,
            vec![
                Segment { node: texts[0], local_start: 3, local_end: 6 },
                Segment { node: texts[1], local_start: 0, local_end: 5 },
                Segment { node: texts[2], local_start: 0, local_end: 3 },
            ]
        );
    }

    #[test]
    fn test_empty_interval_intersects_nothing() {
        let (doc, _) = sample();
        let index = TextIndex::build(&doc, doc.root());
        assert!(index.segments(5, 5).is_empty());
    }

    #[test]
    fn test_interval_past_content_yields_no_segments() {
        let (doc, _) = sample();
        let index = TextIndex::build(&doc, doc.root());
        assert!(index.segments(100, 120).is_empty());
    }
}
