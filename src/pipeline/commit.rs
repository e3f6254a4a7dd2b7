//! Commit engine - atomic application of a completed pass.
//!
//! Runs once the work loop has no units left: first the pass's deletion
//! list, then a depth-first pre-order walk of the finished work-in-progress
//! tree applying PLACEMENT and UPDATE effects, then promotion. Nothing in
//! here yields back to the scheduler, so the retained tree is never observed
//! half-updated.
//!
//! Promotion releases the previous generation wholesale: the promoted tree's
//! alternate links are cleared first, then the old tree goes back to the
//! arena's free pool.

use tracing::debug;

use crate::error::EngineError;
use crate::fiber::{FiberArena, FiberId};
use crate::host::RetainedTree;
use crate::types::EffectFlags;

use super::engine::Inner;
use super::patch;

#[derive(Debug, Default)]
struct EffectCounts {
    placements: usize,
    updates: usize,
}

/// Apply every effect of the completed pass and promote its tree.
pub(crate) fn commit_root<H: RetainedTree>(inner: &mut Inner<H>) -> Result<(), EngineError> {
    let Some(wip) = inner.wip_root else {
        return Ok(());
    };

    // Deletions first, before any placement or update for their siblings.
    let deletions = std::mem::take(&mut inner.deletions);
    for &id in &deletions {
        commit_deletion(inner, id)?;
    }

    let mut counts = EffectCounts::default();
    if let Some(child) = inner.arena[wip].first_child {
        commit_work(inner, child, &mut counts)?;
    }

    // Promote: the finished tree becomes current, the old generation is
    // released. Alternates are cleared before the release so the promoted
    // tree never holds indices into freed slots.
    inner.wip_root = None;
    let old = inner.current_root.replace(wip);
    inner.arena.clear_alternates(wip);
    if let Some(old_root) = old {
        inner.arena.release_tree(old_root);
    }

    debug!(
        placements = counts.placements,
        updates = counts.updates,
        deletions = deletions.len(),
        live_fibers = inner.arena.live_count(),
        "commit complete"
    );
    Ok(())
}

/// Apply one fiber's effect, then its child, then its sibling.
fn commit_work<H: RetainedTree>(
    inner: &mut Inner<H>,
    id: FiberId,
    counts: &mut EffectCounts,
) -> Result<(), EngineError> {
    {
        let Inner { host, arena, .. } = inner;
        let fiber = &arena[id];
        if let Some(node) = &fiber.retained {
            if fiber.effect.contains(EffectFlags::PLACEMENT) {
                let parent = nearest_retained(arena, id)
                    .expect("placement under a tree with no materialized ancestor");
                host.append_child(parent, node)?;
                counts.placements += 1;
            } else if fiber.effect.contains(EffectFlags::UPDATE) {
                let prev = fiber
                    .alternate
                    .map(|alt| &arena[alt].attrs)
                    .expect("update fiber with no alternate");
                patch::update_node(host, node, prev, &fiber.attrs)?;
                counts.updates += 1;
            }
        }
    }

    if let Some(child) = inner.arena[id].first_child {
        commit_work(inner, child, counts)?;
    }
    if let Some(sibling) = inner.arena[id].next_sibling {
        commit_work(inner, sibling, counts)?;
    }
    Ok(())
}

/// Detach the retained node under a DELETION fiber.
///
/// The parent node is always resolvable: a fiber reaches the deletion list
/// only from a committed generation, whose ancestor chain is materialized up
/// to the pass root. A deleted component owns no node, so the walk descends
/// its child chain to the first fiber that does.
fn commit_deletion<H: RetainedTree>(inner: &mut Inner<H>, id: FiberId) -> Result<(), EngineError> {
    let Inner { host, arena, .. } = inner;

    let parent = nearest_retained(arena, id)
        .expect("deletion under a tree with no materialized ancestor");

    let mut cursor = id;
    loop {
        if let Some(node) = &arena[cursor].retained {
            host.remove_child(parent, node)?;
            return Ok(());
        }
        match arena[cursor].first_child {
            Some(child) => cursor = child,
            // Nothing materialized below: nothing to detach.
            None => return Ok(()),
        }
    }
}

/// Nearest ancestor's retained node, skipping node-less fibers (components).
fn nearest_retained<N>(arena: &FiberArena<N>, id: FiberId) -> Option<&N> {
    let mut cursor = arena[id].parent;
    while let Some(parent) = cursor {
        if let Some(node) = &arena[parent].retained {
            return Some(node);
        }
        cursor = arena[parent].parent;
    }
    None
}
