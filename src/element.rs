//! Element model - immutable tree descriptions.
//!
//! Elements are the declarative input to the engine: a kind, an attribute
//! map, and an ordered child list. They carry no logic and are never mutated
//! after construction; each render pass hands the engine a fresh element tree
//! and the reconciler diffs it against the committed fiber tree.
//!
//! Child normalization: children supplied as plain values (strings, numbers,
//! booleans) are wrapped into a reserved text element holding the value under
//! the [`TEXT_VALUE`](crate::types::TEXT_VALUE) attribute. Children that are
//! already elements pass through untouched.

use std::collections::BTreeMap;

use crate::types::{ComponentFn, Kind, Value, TEXT_VALUE};

// =============================================================================
// Attrs
// =============================================================================

/// Ordered attribute map.
///
/// BTreeMap keeps iteration deterministic, which keeps attribute reconciliation
/// and the host operation journal stable across runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attrs(BTreeMap<String, Value>);

impl Attrs {
    /// Empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Child
// =============================================================================

/// Child argument accepted by the element constructors.
///
/// Plain values normalize into text elements; elements pass through as-is.
#[derive(Debug, Clone)]
pub enum Child {
    /// An element child, adopted untouched.
    Element(Element),
    /// A primitive child, wrapped into a text element.
    Value(Value),
}

impl From<Element> for Child {
    fn from(e: Element) -> Self {
        Child::Element(e)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Value(Value::from(s))
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Value(Value::from(s))
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::Value(Value::from(n))
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Child::Value(Value::from(n))
    }
}

impl From<f64> for Child {
    fn from(x: f64) -> Self {
        Child::Value(Value::from(x))
    }
}

impl From<bool> for Child {
    fn from(b: bool) -> Self {
        Child::Value(Value::from(b))
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of a desired tree position.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Node kind.
    pub kind: Kind,
    /// Attribute map (listeners included, under `on*` keys).
    pub attrs: Attrs,
    /// Ordered children.
    pub children: Vec<Element>,
}

impl Element {
    /// Create a host-node element with the given tag.
    ///
    /// Children are normalized: plain values become text elements, elements
    /// are adopted untouched.
    pub fn node(
        tag: impl Into<String>,
        attrs: Attrs,
        children: impl IntoIterator<Item = Child>,
    ) -> Self {
        Self {
            kind: Kind::Node(tag.into()),
            attrs,
            children: normalize(children),
        }
    }

    /// Create a text element carrying the given content.
    pub fn text(content: impl Into<String>) -> Self {
        Self::text_value(Value::from(content.into()))
    }

    /// Create a text element carrying an arbitrary value.
    pub fn text_value(value: Value) -> Self {
        Self {
            kind: Kind::Text,
            attrs: Attrs::new().with(TEXT_VALUE, value),
            children: Vec::new(),
        }
    }

    /// Create a component element.
    pub fn component(f: ComponentFn, attrs: Attrs) -> Self {
        Self {
            kind: Kind::Component(f),
            attrs,
            children: Vec::new(),
        }
    }
}

/// Wrap primitive children as text elements; never re-wrap elements.
fn normalize(children: impl IntoIterator<Item = Child>) -> Vec<Element> {
    children
        .into_iter()
        .map(|child| match child {
            Child::Element(e) => e,
            Child::Value(v) => Element::text_value(v),
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_normalization() {
        let el = Element::node("div", Attrs::new(), [Child::from("hi")]);
        assert_eq!(el.children.len(), 1);

        let child = &el.children[0];
        assert_eq!(child.kind, Kind::Text);
        assert_eq!(child.attrs.get(TEXT_VALUE), Some(&Value::from("hi")));
        assert!(child.children.is_empty());
    }

    #[test]
    fn test_elements_not_rewrapped() {
        let span = Element::node("span", Attrs::new(), []);
        let el = Element::node("div", Attrs::new(), [Child::from(span.clone())]);

        assert_eq!(el.children[0], span);
        assert_eq!(el.children[0].kind, Kind::Node("span".to_string()));
    }

    #[test]
    fn test_numeric_children_wrap() {
        let el = Element::node("div", Attrs::new(), [Child::from(42i64), Child::from(true)]);
        assert_eq!(el.children[0].kind, Kind::Text);
        assert_eq!(el.children[0].attrs.get(TEXT_VALUE), Some(&Value::Int(42)));
        assert_eq!(el.children[1].attrs.get(TEXT_VALUE), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_absent_attrs_default_empty() {
        let el = Element::node("div", Attrs::default(), []);
        assert!(el.attrs.is_empty());
    }

    #[test]
    fn test_attrs_builder() {
        let attrs = Attrs::new().with("id", "x").with("count", 3i64);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("id"), Some(&Value::from("x")));
        assert_eq!(attrs.get("count"), Some(&Value::Int(3)));
        assert!(!attrs.contains("missing"));
    }

    #[test]
    fn test_attrs_iteration_is_key_ordered() {
        let attrs = Attrs::new().with("z", 1i64).with("a", 2i64).with("m", 3i64);
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
