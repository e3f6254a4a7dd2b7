//! Terminal presenter over a [`MemoryTree`].
//!
//! The engine mutates the document; this host shows it. Drawing is pulled,
//! not pushed: the driver calls [`TermTree::draw`] after a commit, and the
//! presenter repaints only when the rendered outline actually changed since
//! the previous frame (same previous-frame comparison the fullscreen diff
//! renderers use, at line granularity).
//!
//! Everything engine-facing delegates to the inner document tree, so the
//! presenter adds no semantics - it is a sink.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;

use crate::error::HostError;
use crate::types::{Event, EventHandler, Value};

use super::{MemoryTree, NodeId, RetainedTree};

/// Terminal-backed retained tree.
#[derive(Debug)]
pub struct TermTree {
    doc: MemoryTree,
    previous: Option<Vec<String>>,
}

impl Default for TermTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TermTree {
    /// Presenter over a fresh document.
    pub fn new() -> Self {
        Self {
            doc: MemoryTree::new(),
            previous: None,
        }
    }

    /// Container handle render passes target.
    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    /// The underlying document.
    pub fn doc(&self) -> &MemoryTree {
        &self.doc
    }

    /// Deliver an event to listeners on `node`.
    pub fn dispatch(&mut self, node: NodeId, event: &Event) {
        self.doc.dispatch(node, event);
    }

    /// Depth-first search for a node by attribute value.
    pub fn find_by_attr(&self, name: &str, value: &Value) -> Option<NodeId> {
        self.doc.find_by_attr(name, value)
    }

    /// Repaint the document to stdout if it changed since the last frame.
    ///
    /// Returns whether anything was written.
    pub fn draw(&mut self) -> io::Result<bool> {
        let lines = self.doc.outline(self.doc.root());
        if self.previous.as_ref() == Some(&lines) {
            return Ok(false);
        }

        let mut out = io::stdout();
        self.write_frame(&mut out, &lines)?;
        out.flush()?;
        self.previous = Some(lines);
        Ok(true)
    }

    /// Invalidate the previous frame; the next draw repaints unconditionally.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Whether a previous frame exists to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    fn write_frame(&self, out: &mut impl Write, lines: &[String]) -> io::Result<()> {
        for (row, line) in lines.iter().enumerate() {
            out.queue(MoveTo(0, row as u16))?
                .queue(Clear(ClearType::CurrentLine))?
                .queue(Print(line))?;
        }
        // Blank out rows left over from a taller previous frame.
        let previous_len = self.previous.as_ref().map(|p| p.len()).unwrap_or(0);
        for row in lines.len()..previous_len {
            out.queue(MoveTo(0, row as u16))?
                .queue(Clear(ClearType::CurrentLine))?;
        }
        Ok(())
    }
}

impl RetainedTree for TermTree {
    type Node = NodeId;

    fn create_node(&mut self, kind: &str) -> Result<NodeId, HostError> {
        self.doc.create_node(kind)
    }

    fn create_text_node(&mut self) -> Result<NodeId, HostError> {
        self.doc.create_text_node()
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.doc.append_child(parent, child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.doc.remove_child(parent, child)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &Value) -> Result<(), HostError> {
        self.doc.set_attribute(node, name, value)
    }

    fn reset_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.doc.reset_attribute(node, name)
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.doc.add_listener(node, event, handler)
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.doc.remove_listener(node, event, handler)
    }
}

// =============================================================================
// Tests
// =============================================================================
