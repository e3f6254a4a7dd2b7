//! In-memory document tree.
//!
//! A self-contained [`RetainedTree`] implementation backed by a node slab.
//! Two jobs:
//!
//! - the document model behind the terminal presenter and the demo
//! - the test harness: every mutation is journaled as a [`HostOp`], so tests
//!   assert the exact effect sequence a commit produced (one reset, one set,
//!   remove-before-add, and so on)
//!
//! Node handles are plain slab indices. Freed ids are not reused; the engine
//! releases nodes by detaching them, and a detached subtree simply becomes
//! unreachable from the root.

use std::collections::BTreeMap;

use crate::error::HostError;
use crate::types::{Event, EventHandler, Value, TEXT_VALUE};

use super::RetainedTree;

/// Kind string given to text nodes in the document.
pub const TEXT_NODE_KIND: &str = "#text";

/// Kind string of the preallocated document root.
pub const ROOT_NODE_KIND: &str = "#document";

// =============================================================================
// Handles and Journal
// =============================================================================

/// Handle to a node in a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw slab index (stable for the life of the tree).
    pub fn index(self) -> usize {
        self.0
    }
}

/// One journaled mutation.
///
/// Attribute values and handlers are deliberately not captured; identity of
/// the operation (what happened, where, to which key) is what the effect
/// tests assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    /// `create_node(kind)`.
    CreateNode { node: NodeId, kind: String },
    /// `create_text_node()`.
    CreateTextNode { node: NodeId },
    /// `append_child(parent, child)`.
    AppendChild { parent: NodeId, child: NodeId },
    /// `remove_child(parent, child)`.
    RemoveChild { parent: NodeId, child: NodeId },
    /// `set_attribute(node, name, _)`.
    SetAttribute { node: NodeId, name: String },
    /// `reset_attribute(node, name)`.
    ResetAttribute { node: NodeId, name: String },
    /// `add_listener(node, event, _)`.
    AddListener { node: NodeId, event: String },
    /// `remove_listener(node, event, _)`.
    RemoveListener { node: NodeId, event: String },
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Debug, Clone, Default)]
struct DocNode {
    kind: String,
    attrs: BTreeMap<String, Value>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<NodeId>,
}

// =============================================================================
// MemoryTree
// =============================================================================

/// In-memory retained tree with an operation journal.
#[derive(Debug)]
pub struct MemoryTree {
    nodes: Vec<DocNode>,
    ops: Vec<HostOp>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Create a tree with a preallocated root node.
    ///
    /// The root is the container handle render passes target; creating it is
    /// not journaled.
    pub fn new() -> Self {
        Self {
            nodes: vec![DocNode {
                kind: ROOT_NODE_KIND.to_string(),
                ..DocNode::default()
            }],
            ops: Vec::new(),
        }
    }

    /// Handle of the preallocated root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The journal so far, oldest first.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the journal, returning the recorded operations.
    ///
    /// Tests clear between passes so each assertion sees one pass's effects.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Node kind, if the handle is live.
    pub fn kind(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.kind.as_str())
    }

    /// Attribute value on a node.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.nodes.get(node.0)?.attrs.get(name)
    }

    /// Child handles of a node, in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of listeners attached for an event name.
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.nodes
            .get(node.0)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Depth-first search for a node whose attribute equals the given value.
    pub fn find_by_attr(&self, name: &str, value: &Value) -> Option<NodeId> {
        self.find_from(self.root(), name, value)
    }

    fn find_from(&self, node: NodeId, name: &str, value: &Value) -> Option<NodeId> {
        if self.attr(node, name) == Some(value) {
            return Some(node);
        }
        for &child in self.children(node) {
            if let Some(found) = self.find_from(child, name, value) {
                return Some(found);
            }
        }
        None
    }

    /// Deliver an event to every listener registered for its name on `node`.
    ///
    /// Handlers are cloned out first so they may re-enter the tree (through
    /// state setters) without aliasing the listener list.
    pub fn dispatch(&mut self, node: NodeId, event: &Event) {
        let handlers: Vec<EventHandler> = self
            .nodes
            .get(node.0)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|(e, _)| *e == event.name)
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();
        for handler in handlers {
            handler.call(event);
        }
    }

    /// Concatenated text content of a subtree, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(n) = self.nodes.get(node.0) {
            if n.kind == TEXT_NODE_KIND {
                if let Some(v) = n.attrs.get(TEXT_VALUE) {
                    out.push_str(&v.display());
                }
            }
            for &child in &n.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Render the subtree as an indented outline (for the presenter and for
    /// debugging assertions).
    pub fn outline(&self, node: NodeId) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(node, 0, &mut lines);
        lines
    }

    fn outline_into(&self, node: NodeId, depth: usize, lines: &mut Vec<String>) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        let indent = "  ".repeat(depth);
        if n.kind == TEXT_NODE_KIND {
            let text = n
                .attrs
                .get(TEXT_VALUE)
                .map(|v| v.display())
                .unwrap_or_default();
            lines.push(format!("{indent}{text}"));
        } else {
            let mut line = format!("{indent}<{}", n.kind);
            for (k, v) in &n.attrs {
                if v.as_handler().is_none() {
                    line.push_str(&format!(" {k}={}", v.display()));
                }
            }
            line.push('>');
            lines.push(line);
        }
        for &child in &n.children {
            self.outline_into(child, depth + 1, lines);
        }
    }

    fn node_mut(&mut self, node: NodeId, op: &'static str) -> Result<&mut DocNode, HostError> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| HostError::new(op, format!("unknown node {} of {len}", node.0)))
    }
}

impl RetainedTree for MemoryTree {
    type Node = NodeId;

    fn create_node(&mut self, kind: &str) -> Result<NodeId, HostError> {
        if kind.is_empty() {
            return Err(HostError::new("create_node", "empty node kind"));
        }
        let node = NodeId(self.nodes.len());
        self.nodes.push(DocNode {
            kind: kind.to_string(),
            ..DocNode::default()
        });
        self.ops.push(HostOp::CreateNode {
            node,
            kind: kind.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self) -> Result<NodeId, HostError> {
        let node = NodeId(self.nodes.len());
        self.nodes.push(DocNode {
            kind: TEXT_NODE_KIND.to_string(),
            ..DocNode::default()
        });
        self.ops.push(HostOp::CreateTextNode { node });
        Ok(node)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let child = *child;
        if self.nodes.get(child.0).is_none() {
            return Err(HostError::new(
                "append_child",
                format!("unknown child {}", child.0),
            ));
        }
        let parent_node = self.node_mut(*parent, "append_child")?;
        parent_node.children.push(child);
        self.ops.push(HostOp::AppendChild {
            parent: *parent,
            child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let child = *child;
        let parent_node = self.node_mut(*parent, "remove_child")?;
        let position = parent_node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| {
                HostError::new(
                    "remove_child",
                    format!("node {} is not a child of {}", child.0, parent.0),
                )
            })?;
        parent_node.children.remove(position);
        self.ops.push(HostOp::RemoveChild {
            parent: *parent,
            child,
        });
        Ok(())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &Value) -> Result<(), HostError> {
        let doc_node = self.node_mut(*node, "set_attribute")?;
        doc_node.attrs.insert(name.to_string(), value.clone());
        self.ops.push(HostOp::SetAttribute {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn reset_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        let doc_node = self.node_mut(*node, "reset_attribute")?;
        doc_node.attrs.remove(name);
        self.ops.push(HostOp::ResetAttribute {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let doc_node = self.node_mut(*node, "add_listener")?;
        doc_node
            .listeners
            .push((event.to_string(), handler.clone()));
        self.ops.push(HostOp::AddListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let doc_node = self.node_mut(*node, "remove_listener")?;
        let position = doc_node
            .listeners
            .iter()
            .position(|(e, h)| e == event && h.same(handler))
            .ok_or_else(|| {
                HostError::new(
                    "remove_listener",
                    format!("no `{event}` listener with that identity on node {}", node.0),
                )
            })?;
        doc_node.listeners.remove(position);
        self.ops.push(HostOp::RemoveListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
