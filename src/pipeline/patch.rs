//! Attribute and listener reconciliation for one retained node.
//!
//! Given the previous and next attribute maps, keys partition into
//! event-handler keys (`on` prefix, see
//! [`is_event_key`](crate::types::is_event_key)) and plain keys. The order is
//! fixed:
//!
//! 1. detach listeners that are gone or whose handler changed
//! 2. reset plain attributes that are gone
//! 3. set plain attributes that changed or are new
//! 4. attach listeners that changed or are new
//!
//! Removals run before additions so a changed handler is never attached
//! twice at once.

use tracing::trace;

use crate::element::Attrs;
use crate::error::HostError;
use crate::host::RetainedTree;
use crate::types::{event_name, is_event_key};

/// Apply the attribute delta between `prev` and `next` to `node`.
///
/// Materialization calls this with an empty `prev`, so initial attributes
/// and listeners land through the same path as updates.
pub(crate) fn update_node<H: RetainedTree>(
    host: &mut H,
    node: &H::Node,
    prev: &Attrs,
    next: &Attrs,
) -> Result<(), HostError> {
    // 1. Old listeners: gone, or replaced by a different handler identity.
    for (key, value) in prev.iter() {
        if !is_event_key(key) {
            continue;
        }
        let Some(handler) = value.as_handler() else {
            continue;
        };
        if next.get(key) != Some(value) {
            trace!(key, "detach listener");
            host.remove_listener(node, &event_name(key), handler)?;
        }
    }

    // 2. Old plain attributes with no successor.
    for (key, _) in prev.iter() {
        if is_event_key(key) {
            continue;
        }
        if !next.contains(key) {
            trace!(key, "reset attribute");
            host.reset_attribute(node, key)?;
        }
    }

    // 3. New or changed plain attributes.
    for (key, value) in next.iter() {
        if is_event_key(key) {
            continue;
        }
        if prev.get(key) != Some(value) {
            trace!(key, "set attribute");
            host.set_attribute(node, key, value)?;
        }
    }

    // 4. New or changed listeners.
    for (key, value) in next.iter() {
        if !is_event_key(key) {
            continue;
        }
        let Some(handler) = value.as_handler() else {
            continue;
        };
        if prev.get(key) != Some(value) {
            trace!(key, "attach listener");
            host.add_listener(node, &event_name(key), handler)?;
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
