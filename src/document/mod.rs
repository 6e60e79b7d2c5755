//! Arena-based document tree
//!
//! Stand-in for the host's rendered content root. The host materializes its
//! document into this tree (elements and text leaves); anchoring and overlay
//! painting are defined against it. Nodes live in a flat arena and are
//! addressed by [`NodeId`], so splitting a text node or unwrapping a marker
//! never invalidates handles to unrelated nodes.
//!
//! All offsets into text nodes count Unicode scalar values (`char`s), not
//! bytes, so slicing is always on a character boundary.

use std::collections::BTreeMap;

use crate::error::DocumentError;

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a node is: an element with a tag and attributes, or a text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A document tree with a single root element.
///
/// Nodes detached by structural edits stay in the arena but are unreachable
/// from the root; traversals only ever see the live tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document whose root is an element with the given tag.
    pub fn new(root_tag: &str) -> Self {
        let root_node = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: root_tag.to_string(),
                attrs: BTreeMap::new(),
            },
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Element tag, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Text of a text node, or `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    /// Set an attribute on an element node.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            NodeKind::Text(_) => Err(DocumentError::NotAnElement(id)),
        }
    }

    /// Append a new element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attrs: BTreeMap::new(),
            },
        )
    }

    /// Append a new text leaf as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_node(parent, NodeKind::Text(text.to_string()))
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn alloc_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// All nodes under `id` (excluding `id` itself) in pre-order.
    ///
    /// Iterative traversal; deep documents must not blow the stack.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev());
        }
        out
    }

    /// Text leaves under `id` in document (pre-) order.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.nodes[n.0].kind, NodeKind::Text(_)))
            .collect()
    }

    /// Flattened text content under `id`: the concatenation of every text
    /// leaf in document order. Elements contribute no characters.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(t) = &self.nodes[id.0].kind {
            out.push_str(t);
        }
        for n in self.descendants(id) {
            if let NodeKind::Text(t) = &self.nodes[n.0].kind {
                out.push_str(t);
            }
        }
        out
    }

    /// Split a text node at `[local_start, local_end)` and wrap the middle
    /// part in a new element with the given tag.
    ///
    /// The original text node is replaced in its parent by up to three
    /// nodes: a leading text node (if any), the wrapper element containing
    /// the covered text, and a trailing text node (if any). Returns the
    /// wrapper's id. Offsets are `char` counts into the node's text.
    pub fn split_and_wrap(
        &mut self,
        text_id: NodeId,
        local_start: usize,
        local_end: usize,
        wrapper_tag: &str,
    ) -> Result<NodeId, DocumentError> {
        let text = match &self.nodes[text_id.0].kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::Element { .. } => return Err(DocumentError::NotAText(text_id)),
        };
        let len = text.chars().count();
        if local_start > local_end || local_end > len {
            return Err(DocumentError::OffsetOutOfBounds {
                start: local_start,
                end: local_end,
                len,
            });
        }
        let parent = self.nodes[text_id.0]
            .parent
            .ok_or(DocumentError::Detached(text_id))?;

        let before: String = text.chars().take(local_start).collect();
        let covered: String = text
            .chars()
            .skip(local_start)
            .take(local_end - local_start)
            .collect();
        let after: String = text.chars().skip(local_end).collect();

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(self.alloc_detached(NodeKind::Text(before)));
        }
        let wrapper = self.alloc_detached(NodeKind::Element {
            tag: wrapper_tag.to_string(),
            attrs: BTreeMap::new(),
        });
        let inner = self.alloc_detached(NodeKind::Text(covered));
        self.nodes[inner.0].parent = Some(wrapper);
        self.nodes[wrapper.0].children.push(inner);
        replacement.push(wrapper);
        if !after.is_empty() {
            replacement.push(self.alloc_detached(NodeKind::Text(after)));
        }

        self.replace_child(parent, text_id, replacement)?;
        Ok(wrapper)
    }

    /// Replace an element with a single text node holding its flattened
    /// text content. Used to dissolve overlay markers back into plain text.
    pub fn unwrap_element(&mut self, id: NodeId) -> Result<NodeId, DocumentError> {
        if !matches!(self.nodes[id.0].kind, NodeKind::Element { .. }) {
            return Err(DocumentError::NotAnElement(id));
        }
        let parent = self.nodes[id.0].parent.ok_or(DocumentError::Detached(id))?;
        let text = self.text_content(id);
        let replacement = self.alloc_detached(NodeKind::Text(text));
        self.replace_child(parent, id, vec![replacement])?;
        Ok(replacement)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        replacement: Vec<NodeId>,
    ) -> Result<(), DocumentError> {
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or(DocumentError::Detached(old))?;
        self.nodes[parent.0].children.remove(pos);
        for (i, id) in replacement.iter().enumerate() {
            self.nodes[id.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(pos + i, *id);
        }
        self.nodes[old.0].parent = None;
        Ok(())
    }

    /// Merge adjacent sibling text nodes and drop empty ones, recursively
    /// under `id`. The analog of `Node.normalize()`.
    pub fn normalize(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let children = self.nodes[cur.0].children.clone();
            let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
            for child in children {
                let child_text = match &self.nodes[child.0].kind {
                    NodeKind::Text(t) => Some(t.clone()),
                    NodeKind::Element { .. } => None,
                };
                match child_text {
                    Some(t) if t.is_empty() => {
                        self.nodes[child.0].parent = None;
                    }
                    Some(t) => {
                        let absorbed = match merged.last() {
                            Some(&prev) => {
                                if let NodeKind::Text(pt) = &mut self.nodes[prev.0].kind {
                                    pt.push_str(&t);
                                    true
                                } else {
                                    false
                                }
                            }
                            None => false,
                        };
                        if absorbed {
                            self.nodes[child.0].parent = None;
                        } else {
                            merged.push(child);
                        }
                    }
                    None => {
                        stack.push(child);
                        merged.push(child);
                    }
                }
            }
            self.nodes[cur.0].children = merged;
        }
    }
}
