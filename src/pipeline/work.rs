//! Unit-of-work execution - one fiber at a time.
//!
//! `perform_unit` does three things for the visited fiber: materialize its
//! retained node if the kind owns one (components run their render function
//! instead), reconcile its children, and hand back the next unit in
//! depth-first pre-order (first child, else nearest ancestor sibling, absent
//! at the pass root).
//!
//! Each unit is atomic with respect to scheduling: the driving loop checks
//! its deadline only between calls, never inside one.

use tracing::trace;

use crate::element::Attrs;
use crate::error::EngineError;
use crate::fiber::{FiberArena, FiberId};
use crate::host::RetainedTree;
use crate::reconcile::reconcile_children;
use crate::state::Hooks;
use crate::types::Kind;

use super::engine::{validate_element, Inner};
use super::patch;

/// Perform one unit of work and return the next one, if any.
pub(crate) fn perform_unit<H: RetainedTree>(
    inner: &mut Inner<H>,
    id: FiberId,
) -> Result<Option<FiberId>, EngineError> {
    let kind = inner.arena[id].kind.clone();
    match kind {
        Kind::Component(f) => {
            // Function-kind fiber: no retained node; its subtree is whatever
            // the render function returns this generation.
            let attrs = inner.arena[id].attrs.clone();
            let prev_cells = inner.arena[id]
                .alternate
                .and_then(|alt| inner.arena.get(alt))
                .map(|alt| alt.cells.clone())
                .unwrap_or_default();

            let mut hooks = Hooks::new(prev_cells, inner.flag.clone());
            let element = f.render(&mut hooks, &attrs);
            // Component output cannot be checked at `render` time; it is
            // checked the moment it exists.
            validate_element(&element)?;

            let fiber = &mut inner.arena[id];
            fiber.cells = hooks.into_cells();
            fiber.elements = vec![element];
            trace!(fiber = id.index(), "unit: component rendered");
        }
        Kind::Text | Kind::Node(_) => {
            if inner.arena[id].retained.is_none() {
                let node = match &kind {
                    Kind::Text => inner.host.create_text_node()?,
                    Kind::Node(tag) if tag.is_empty() => return Err(EngineError::MissingKind),
                    Kind::Node(tag) => inner.host.create_node(tag)?,
                    _ => unreachable!(),
                };
                // Full attribute set lands on the detached node before any
                // append, through the same path updates take.
                let attrs = inner.arena[id].attrs.clone();
                patch::update_node(&mut inner.host, &node, &Attrs::new(), &attrs)?;
                inner.arena[id].retained = Some(node);
                trace!(fiber = id.index(), "unit: materialized");
            }
        }
        Kind::Root => {}
    }

    let elements = std::mem::take(&mut inner.arena[id].elements);
    reconcile_children(&mut inner.arena, &mut inner.deletions, id, &elements);
    inner.arena[id].elements = elements;

    Ok(next_unit_after(&inner.arena, id))
}

/// Depth-first pre-order successor: first child, else the nearest sibling
/// found walking up, absent once the walk reaches the pass root.
fn next_unit_after<N>(arena: &FiberArena<N>, id: FiberId) -> Option<FiberId> {
    if let Some(child) = arena[id].first_child {
        return Some(child);
    }
    let mut cursor = id;
    loop {
        let fiber = &arena[cursor];
        if let Some(sibling) = fiber.next_sibling {
            return Some(sibling);
        }
        match fiber.parent {
            Some(parent) => cursor = parent,
            None => return None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::Fiber;

    fn fiber(tag: &str) -> Fiber<usize> {
        Fiber::new(Kind::Node(tag.to_string()), Attrs::new(), Vec::new())
    }

    /// root -> (a -> a1, b)
    fn small_tree(arena: &mut FiberArena<usize>) -> (FiberId, FiberId, FiberId, FiberId) {
        let root = arena.alloc(fiber("root"));
        let a = arena.alloc(fiber("a"));
        let a1 = arena.alloc(fiber("a1"));
        let b = arena.alloc(fiber("b"));

        arena[root].first_child = Some(a);
        arena[a].parent = Some(root);
        arena[a].first_child = Some(a1);
        arena[a].next_sibling = Some(b);
        arena[a1].parent = Some(a);
        arena[b].parent = Some(root);
        (root, a, a1, b)
    }

    #[test]
    fn test_traversal_is_preorder() {
        let mut arena = FiberArena::new();
        let (root, a, a1, b) = small_tree(&mut arena);

        assert_eq!(next_unit_after(&arena, root), Some(a));
        assert_eq!(next_unit_after(&arena, a), Some(a1));
        // Leaf with no sibling: climb to the parent's sibling.
        assert_eq!(next_unit_after(&arena, a1), Some(b));
        // Last leaf: the walk reaches the root and ends the pass.
        assert_eq!(next_unit_after(&arena, b), None);
    }
}
