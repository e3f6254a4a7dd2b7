//! Host module - the retained-tree collaborator contract.
//!
//! The engine never owns the visible tree. It drives an externally supplied
//! retained tree through the [`RetainedTree`] trait: create and attach nodes,
//! set and reset attributes, attach and detach listeners. Implementations:
//!
//! - [`MemoryTree`] - in-process document tree with an operation journal,
//!   used by the test suite and as the demo's document model
//! - [`TermTree`] - terminal presenter over a `MemoryTree`

mod memory;
mod term;

pub use memory::*;
pub use term::*;

use std::fmt;

use crate::error::HostError;
use crate::types::{EventHandler, Value};

/// The retained-tree node API the engine mutates.
///
/// Handles are cheap to clone and compare; the engine stores one handle per
/// materialized fiber and never hands the same handle to two owning fibers.
/// Every operation is fallible: a collaborator failure propagates out of the
/// work loop unretried.
pub trait RetainedTree {
    /// Handle into the retained tree.
    type Node: Clone + PartialEq + fmt::Debug;

    /// Create a detached node of the given kind.
    fn create_node(&mut self, kind: &str) -> Result<Self::Node, HostError>;

    /// Create a detached, empty text node.
    fn create_text_node(&mut self) -> Result<Self::Node, HostError>;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Set an attribute to a new value.
    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &Value,
    ) -> Result<(), HostError>;

    /// Reset an attribute to its empty/default state.
    fn reset_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Attach a listener for the given event name.
    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Detach a previously attached listener. Identity-matched: only the
    /// listener registered with this exact handler is removed.
    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;
}
