//! Fiber tree - the mutable work representation.
//!
//! Fibers mirror the element tree one-to-one. They are not objects pointing
//! at each other: they are records in an arena ([`FiberArena`]) addressed by
//! stable [`FiberId`] indices. Forward links (`first_child`, `next_sibling`)
//! own the tree shape; back- and cross-links (`parent`, `alternate`) are
//! non-owning indices, which keeps the parent/child/alternate graph free of
//! ownership cycles.
//!
//! Two trees exist at a time: the committed "current" tree and the
//! "work-in-progress" tree under construction. A fiber's `alternate` points
//! at its counterpart one generation back, never into its own generation.

mod arena;

pub use arena::*;

use crate::element::{Attrs, Element};
use crate::state::StateCell;
use crate::types::{EffectFlags, Kind};

/// Stable handle to a fiber in a [`FiberArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(pub(crate) usize);

impl FiberId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One unit of work: a tree position across one render generation.
#[derive(Debug)]
pub struct Fiber<N> {
    /// Position kind, mirroring the element that produced the fiber.
    pub kind: Kind,
    /// Attributes for this generation.
    pub attrs: Attrs,
    /// Child elements pending reconciliation when the work loop visits.
    pub elements: Vec<Element>,
    /// Owned handle into the retained tree. Created exactly once per fiber;
    /// inherited from the alternate on UPDATE. Components never own one.
    pub retained: Option<N>,
    /// Enclosing fiber (non-owning). Absent only on the pass root.
    pub parent: Option<FiberId>,
    /// First child (owning).
    pub first_child: Option<FiberId>,
    /// Next sibling under the same parent (owning).
    pub next_sibling: Option<FiberId>,
    /// Counterpart from the previously committed generation (non-owning).
    pub alternate: Option<FiberId>,
    /// Structural effect for the next commit.
    pub effect: EffectFlags,
    /// State cells, in slot order.
    pub cells: Vec<StateCell>,
}

impl<N> Fiber<N> {
    /// Fresh fiber with no links, no retained node, no effect.
    pub fn new(kind: Kind, attrs: Attrs, elements: Vec<Element>) -> Self {
        Self {
            kind,
            attrs,
            elements,
            retained: None,
            parent: None,
            first_child: None,
            next_sibling: None,
            alternate: None,
            effect: EffectFlags::empty(),
            cells: Vec::new(),
        }
    }
}
