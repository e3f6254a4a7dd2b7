//! Child reconciliation - diff one fiber's children against new elements.
//!
//! Walks the alternate's child chain and the new element list in lockstep,
//! one pair per step, tolerating ragged lengths. Per position:
//!
//! - same kind on both sides: UPDATE fiber reusing the old retained node,
//!   alternate linked to the old fiber
//! - new element without a matching old fiber: PLACEMENT fiber, no retained
//!   node yet, no alternate
//! - old fiber without a surviving new element: tagged DELETION and pushed
//!   onto the pass's deletion list, never adopted into the new child chain
//!
//! Matching is purely positional by index and kind equality; there are no
//! keys. Reordering a child list therefore produces DELETION+PLACEMENT pairs
//! instead of moves.

use tracing::trace;

use crate::element::Element;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::types::EffectFlags;

/// Reconcile `parent`'s children against `new_elements`.
///
/// Produces the new child chain under `parent` and appends unmatched old
/// fibers to `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    parent: FiberId,
    new_elements: &[Element],
) {
    let mut old = arena[parent]
        .alternate
        .and_then(|alt| arena[alt].first_child);
    let mut prev: Option<FiberId> = None;
    let mut index = 0usize;

    while index < new_elements.len() || old.is_some() {
        let element = new_elements.get(index);

        let mut produced: Option<FiberId> = None;

        if let (Some(old_id), Some(el)) = (old, element) {
            if arena[old_id].kind.matches(&el.kind) {
                // Same kind: reuse the node, take the new attributes.
                let retained = arena[old_id].retained.clone();
                let kind = arena[old_id].kind.clone();
                let mut fiber = Fiber::new(kind, el.attrs.clone(), el.children.clone());
                fiber.retained = retained;
                fiber.parent = Some(parent);
                fiber.alternate = Some(old_id);
                fiber.effect = EffectFlags::UPDATE;
                let id = arena.alloc(fiber);
                trace!(index, fiber = id.index(), "reconcile: update");
                produced = Some(id);
            }
        }

        if produced.is_none() {
            if let Some(el) = element {
                let mut fiber = Fiber::new(el.kind.clone(), el.attrs.clone(), el.children.clone());
                fiber.parent = Some(parent);
                fiber.effect = EffectFlags::PLACEMENT;
                let id = arena.alloc(fiber);
                trace!(index, fiber = id.index(), "reconcile: placement");
                produced = Some(id);
            }
            if let Some(old_id) = old {
                arena[old_id].effect = EffectFlags::DELETION;
                deletions.push(old_id);
                trace!(index, fiber = old_id.index(), "reconcile: deletion");
            }
        }

        if let Some(new_id) = produced {
            match prev {
                None => arena[parent].first_child = Some(new_id),
                Some(prev_id) => arena[prev_id].next_sibling = Some(new_id),
            }
            prev = Some(new_id);
        }

        if let Some(old_id) = old {
            old = arena[old_id].next_sibling;
        }
        index += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
