//! Core types for spindle.
//!
//! These types define the foundation everything builds on: the kinds a tree
//! position can have, the values attributes and state cells carry, the event
//! plumbing, and the effect flags the reconciler assigns and the commit
//! engine consumes.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::element::{Attrs, Element};
use crate::state::Hooks;

/// Reserved attribute carrying the content of a text node.
pub const TEXT_VALUE: &str = "value";

// =============================================================================
// Effect Flags
// =============================================================================

bitflags! {
    /// Structural effect assigned to a fiber during reconciliation.
    ///
    /// Empty means "no effect". Exactly one bit is set on any fiber that
    /// carries an effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectFlags: u8 {
        /// New node: attach its retained node under the nearest materialized ancestor.
        const PLACEMENT = 1 << 0;
        /// Reused node: reconcile attributes against the alternate's.
        const UPDATE = 1 << 1;
        /// Dropped node: detach its retained node, tracked out-of-band.
        const DELETION = 1 << 2;
    }
}

// =============================================================================
// Events
// =============================================================================

/// Event delivered to listeners attached through `on*` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Lowercased event name, e.g. `click`.
    pub name: String,
}

impl Event {
    /// Create an event with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Listener callback attached to a retained node.
///
/// Rc<dyn Fn> so handlers clone into attribute maps and host listener lists
/// without ownership issues. Equality is pointer identity: replacing a handler
/// with a different closure detaches the old listener and attaches the new
/// one, while re-rendering with a clone of the same handler is a no-op.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Identity comparison (same allocation, not same behavior).
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

// =============================================================================
// Attribute / State Values
// =============================================================================

/// Value carried by an attribute or a state cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Event listener (only meaningful under an `on*` attribute key).
    Handler(EventHandler),
}

impl Value {
    /// Text content if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Handler content if this is a `Handler` value.
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Render the value as display text (how a document sink shows it).
    pub fn display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Handler(_) => String::from("[handler]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<EventHandler> for Value {
    fn from(h: EventHandler) -> Self {
        Value::Handler(h)
    }
}

// =============================================================================
// Event Key Predicate
// =============================================================================

/// Check whether an attribute key names an event listener.
///
/// Listener keys use the `on` prefix followed by the event name, e.g.
/// `onClick`. A bare `on` is a plain attribute.
pub fn is_event_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

/// Derive the event name from a listener key: strip the `on` prefix and
/// lowercase the remainder. Only meaningful when `is_event_key` holds.
pub fn event_name(key: &str) -> String {
    key[2..].to_ascii_lowercase()
}

// =============================================================================
// Kind
// =============================================================================

/// Component function: renders an element subtree from attributes, requesting
/// state cells through the [`Hooks`] context in a fixed per-render order.
///
/// Compared by pointer identity, so a component keeps its tree position (and
/// its state) across renders only when the same function value is reused.
#[derive(Clone)]
pub struct ComponentFn(Rc<dyn Fn(&mut Hooks, &Attrs) -> Element>);

impl ComponentFn {
    /// Wrap a render function.
    pub fn new(f: impl Fn(&mut Hooks, &Attrs) -> Element + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Run the render function.
    pub fn render(&self, hooks: &mut Hooks, attrs: &Attrs) -> Element {
        (self.0)(hooks, attrs)
    }

    /// Identity comparison.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ComponentFn {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for ComponentFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComponentFn(..)")
    }
}

/// What a tree position is.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Synthetic pass root. Owns the container handle; never valid inside an
    /// element tree.
    Root,
    /// Reserved text kind: an empty text node whose content lives in the
    /// [`TEXT_VALUE`] attribute.
    Text,
    /// Host node with the given tag. An empty tag is malformed.
    Node(String),
    /// Function-kind position: owns no retained node, renders a subtree.
    Component(ComponentFn),
}

impl Kind {
    /// Reconciliation match: positions of the same kind reuse the old fiber.
    ///
    /// `Node` tags compare by string equality, components by function
    /// identity. Matching is purely positional; there are no keys.
    pub fn matches(&self, other: &Kind) -> bool {
        match (self, other) {
            (Kind::Root, Kind::Root) => true,
            (Kind::Text, Kind::Text) => true,
            (Kind::Node(a), Kind::Node(b)) => a == b,
            (Kind::Component(a), Kind::Component(b)) => a.same(b),
            _ => false,
        }
    }

    /// Whether a fiber of this kind owns a retained node once materialized.
    pub fn owns_node(&self) -> bool {
        matches!(self, Kind::Text | Kind::Node(_))
    }
}

// =============================================================================
// Tests
// =============================================================================
