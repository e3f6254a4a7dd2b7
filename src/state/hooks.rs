//! Minimal hook mechanism - `use_state` cells, setters, refresh requests.
//!
//! A component requests state cells in a fixed order each render: first call
//! is slot 0, second is slot 1, and so on. A cell's value is seeded from the
//! initial argument on first render; on later renders it is read from the
//! alternate fiber's cell at the same slot, after draining that cell's queued
//! actions in enqueue order.
//!
//! Setters never touch the fiber arena. Each holds the Rc'd action queue of
//! the cell that produced it plus a weak refresh flag, so a setter for a
//! fiber that no longer exists pushes into an unreachable queue - the
//! documented no-op for state updates after unmount.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::types::Value;

// =============================================================================
// Actions and Cells
// =============================================================================

/// Shared queue of pending actions for one state cell.
pub type ActionQueue = Rc<RefCell<Vec<StateAction>>>;

/// A pending state update: a direct value or an updater over the previous one.
#[derive(Clone)]
pub enum StateAction {
    /// Replace the value.
    Set(Value),
    /// Compute the next value from the previous.
    Apply(Rc<dyn Fn(&Value) -> Value>),
}

impl StateAction {
    /// Apply the action to the previous value.
    pub fn apply(&self, prev: &Value) -> Value {
        match self {
            StateAction::Set(v) => v.clone(),
            StateAction::Apply(f) => f(prev),
        }
    }
}

impl fmt::Debug for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateAction::Set(v) => f.debug_tuple("Set").field(v).finish(),
            StateAction::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// One state slot on a fiber.
///
/// Cloning shares the queue: the hooks context clones the alternate's cells
/// and drains the very queues live setters push into.
#[derive(Debug, Clone)]
pub struct StateCell {
    /// Value as of the render that created the cell.
    pub value: Value,
    /// Actions enqueued against this cell since then.
    pub queue: ActionQueue,
}

// =============================================================================
// Refresh Flag
// =============================================================================

/// Render-pass request flag shared between the engine and every setter.
///
/// A plain Cell: setters fire from inside host event dispatch, where the
/// engine's interior is already borrowed, so the flag must be touchable
/// without another borrow.
#[derive(Debug, Default)]
pub struct RefreshFlag {
    requested: Cell<bool>,
}

impl RefreshFlag {
    /// Request a new render pass from the committed tree.
    pub fn request(&self) {
        self.requested.set(true);
    }

    /// Consume the request, if any.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }

    /// Peek without consuming.
    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }
}

// =============================================================================
// Setter
// =============================================================================

/// Enqueues updates against one state cell and requests a render pass.
#[derive(Clone)]
pub struct Setter {
    queue: ActionQueue,
    flag: Weak<RefreshFlag>,
}

impl Setter {
    /// Enqueue a direct value.
    pub fn set(&self, value: impl Into<Value>) {
        self.push(StateAction::Set(value.into()));
    }

    /// Enqueue an updater over the previous value.
    pub fn update(&self, f: impl Fn(&Value) -> Value + 'static) {
        self.push(StateAction::Apply(Rc::new(f)));
    }

    fn push(&self, action: StateAction) {
        self.queue.borrow_mut().push(action);
        if let Some(flag) = self.flag.upgrade() {
            flag.request();
        }
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Setter(..)")
    }
}

// =============================================================================
// Hooks
// =============================================================================

/// Per-render state context handed to a component function.
///
/// Slot order is allocation order within the render: the nth `use_state`
/// call reads the alternate's nth cell.
pub struct Hooks {
    prev: Vec<StateCell>,
    next: Vec<StateCell>,
    flag: Rc<RefreshFlag>,
}

impl Hooks {
    /// Context over the alternate's cells (empty on first render).
    pub(crate) fn new(prev: Vec<StateCell>, flag: Rc<RefreshFlag>) -> Self {
        Self {
            prev,
            next: Vec::new(),
            flag,
        }
    }

    /// Request the next state cell.
    ///
    /// Returns the current value (queued actions drained and applied in
    /// enqueue order) and a setter for future updates.
    pub fn use_state(&mut self, initial: impl Into<Value>) -> (Value, Setter) {
        let slot = self.next.len();
        let value = match self.prev.get(slot) {
            Some(cell) => {
                let mut value = cell.value.clone();
                for action in cell.queue.borrow_mut().drain(..) {
                    value = action.apply(&value);
                }
                value
            }
            None => initial.into(),
        };

        let queue: ActionQueue = Rc::new(RefCell::new(Vec::new()));
        self.next.push(StateCell {
            value: value.clone(),
            queue: queue.clone(),
        });

        let setter = Setter {
            queue,
            flag: Rc::downgrade(&self.flag),
        };
        (value, setter)
    }

    /// Cells allocated by this render, in slot order.
    pub(crate) fn into_cells(self) -> Vec<StateCell> {
        self.next
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("slots", &self.next.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Rc<RefreshFlag> {
        Rc::new(RefreshFlag::default())
    }

    #[test]
    fn test_seed_from_initial() {
        let mut hooks = Hooks::new(Vec::new(), flag());
        let (value, _set) = hooks.use_state(0i64);
        assert_eq!(value, Value::Int(0));
    }

    #[test]
    fn test_slot_order_is_allocation_order() {
        let mut hooks = Hooks::new(Vec::new(), flag());
        let (a, _) = hooks.use_state(1i64);
        let (b, _) = hooks.use_state("two");
        assert_eq!(a, Value::Int(1));
        assert_eq!(b, Value::from("two"));

        let cells = hooks.into_cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].value, Value::Int(1));
        assert_eq!(cells[1].value, Value::from("two"));
    }

    #[test]
    fn test_setter_requests_refresh() {
        let f = flag();
        let mut hooks = Hooks::new(Vec::new(), f.clone());
        let (_, set) = hooks.use_state(0i64);

        assert!(!f.is_requested());
        set.set(1i64);
        assert!(f.take());
        assert!(!f.is_requested());
    }

    #[test]
    fn test_actions_drain_in_enqueue_order() {
        let f = flag();
        let mut hooks = Hooks::new(Vec::new(), f.clone());
        let (_, set) = hooks.use_state(10i64);
        let cells = hooks.into_cells();

        set.set(1i64);
        set.update(|prev| Value::Int(prev.as_int().unwrap() + 5));
        set.update(|prev| Value::Int(prev.as_int().unwrap() * 2));

        // Next render reads the same slot through the alternate's cells.
        let mut hooks = Hooks::new(cells, f);
        let (value, _) = hooks.use_state(10i64);
        assert_eq!(value, Value::Int(12));
    }

    #[test]
    fn test_queue_drained_once() {
        let f = flag();
        let mut hooks = Hooks::new(Vec::new(), f.clone());
        let (_, set) = hooks.use_state(0i64);
        let cells = hooks.into_cells();

        set.update(|prev| Value::Int(prev.as_int().unwrap() + 1));

        let mut hooks = Hooks::new(cells, f.clone());
        let (value, _) = hooks.use_state(0i64);
        assert_eq!(value, Value::Int(1));
        let cells = hooks.into_cells();

        // No new actions: the next render sees the drained value, not +2.
        let mut hooks = Hooks::new(cells, f);
        let (value, _) = hooks.use_state(0i64);
        assert_eq!(value, Value::Int(1));
    }

    #[test]
    fn test_stale_setter_is_noop() {
        let f = flag();
        let set = {
            let mut hooks = Hooks::new(Vec::new(), f.clone());
            let (_, set) = hooks.use_state(0i64);
            // Cells dropped: the fiber that owned them is gone.
            drop(hooks.into_cells());
            set
        };

        // Pushes into an unreachable queue; nothing to observe, no panic.
        set.set(99i64);
        assert!(f.take());
    }

    #[test]
    fn test_dead_flag_is_noop() {
        let f = flag();
        let mut hooks = Hooks::new(Vec::new(), f.clone());
        let (_, set) = hooks.use_state(0i64);
        drop(hooks);
        drop(f);

        set.set(1i64);
    }
}
