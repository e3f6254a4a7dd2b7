//! Engine session - pass lifecycle and the public API.
//!
//! All engine state lives in one session object: the arena, the current and
//! work-in-progress roots, the next unit of work, the pass's deletion list,
//! and the staged pass request. Nothing is module-global; whoever owns the
//! `Engine` owns the scheduling context.
//!
//! # Pass lifecycle
//!
//! ```text
//! render()/setter -> staged request -> activate (pass boundary only)
//!     -> perform_unit xN (deadline-sliced) -> commit (atomic) -> promote
//! ```
//!
//! A staged request never replaces an in-flight pass; it becomes the next
//! pass when the current one commits. There is no cancellation.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::element::{Attrs, Element};
use crate::error::EngineError;
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::host::RetainedTree;
use crate::sched::Deadline;
use crate::state::RefreshFlag;
use crate::types::Kind;

use super::commit::commit_root;
use super::work::perform_unit;

// =============================================================================
// Work Status
// =============================================================================

/// Outcome of one [`Engine::tick`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// No staged request and no in-flight pass.
    Idle,
    /// The deadline ran out mid-pass; call `tick` again to resume.
    Yielded,
    /// A pass finished and its effects were committed.
    Committed,
}

// =============================================================================
// Engine Internals
// =============================================================================

/// A staged render request, honored at the next pass boundary.
pub(crate) enum Pending<N> {
    /// External `render` call: fresh element tree into a container.
    Render { element: Element, container: N },
    /// Setter-triggered refresh from the committed tree.
    Refresh,
}

/// The engine's single mutable state record.
pub(crate) struct Inner<H: RetainedTree> {
    pub(crate) host: H,
    pub(crate) arena: FiberArena<H::Node>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) pending: Option<Pending<H::Node>>,
    pub(crate) flag: Rc<RefreshFlag>,
}

impl<H: RetainedTree> Inner<H> {
    /// Activate the staged request, if any - only ever at a pass boundary.
    fn try_activate(&mut self) {
        if self.wip_root.is_some() {
            return;
        }

        let staged = match self.pending.take() {
            Some(pending) => Some(pending),
            None if self.flag.is_requested() => Some(Pending::Refresh),
            None => None,
        };
        let Some(staged) = staged else {
            return;
        };

        let (elements, container, baseline) = match staged {
            Pending::Render { element, container } => {
                (vec![element], container, self.current_root)
            }
            Pending::Refresh => {
                let Some(current) = self.current_root else {
                    self.flag.take();
                    return;
                };
                let root = &self.arena[current];
                let container = root
                    .retained
                    .clone()
                    .expect("current root with no container handle");
                (root.elements.clone(), container, Some(current))
            }
        };

        // The activated pass reads the latest state queues itself; any
        // refresh requested before this point is satisfied by it.
        self.flag.take();

        let mut root = Fiber::new(Kind::Root, Attrs::new(), elements);
        root.retained = Some(container);
        root.alternate = baseline;
        let id = self.arena.alloc(root);

        self.wip_root = Some(id);
        self.next_unit = Some(id);
        self.deletions.clear();
        debug!(root = id.index(), "pass activated");
    }

    /// Drop the in-flight pass after a collaborator failure. The retained
    /// tree may be partially updated; no recovery is attempted.
    fn abort_pass(&mut self) {
        if let Some(wip) = self.wip_root.take() {
            self.arena.release_tree(wip);
        }
        self.next_unit = None;
        self.deletions.clear();
        debug!("pass aborted");
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Incremental reconciliation engine over a retained tree.
///
/// Single-threaded and cooperative: the owner calls [`Engine::tick`] with a
/// deadline whenever the host scheduler grants time, and the engine processes
/// whole fibers until the budget runs out or a pass commits.
pub struct Engine<H: RetainedTree> {
    inner: Rc<RefCell<Inner<H>>>,
}

impl<H: RetainedTree> Engine<H> {
    /// Wrap a retained-tree collaborator.
    pub fn new(host: H) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                host,
                arena: FiberArena::new(),
                current_root: None,
                wip_root: None,
                next_unit: None,
                deletions: Vec::new(),
                pending: None,
                flag: Rc::new(RefreshFlag::default()),
            })),
        }
    }

    /// Stage a render of `element` into `container`.
    ///
    /// The element tree is validated here; a malformed element fails the
    /// call synchronously and stages nothing. The pass itself runs across
    /// subsequent [`tick`](Engine::tick) calls, and if another pass is in
    /// flight, it completes first.
    pub fn render(&self, element: Element, container: H::Node) -> Result<(), EngineError> {
        validate_element(&element)?;
        let mut inner = self.inner.borrow_mut();
        debug!("render requested");
        inner.pending = Some(Pending::Render { element, container });
        inner.try_activate();
        Ok(())
    }

    /// Run units of work until the deadline asks to yield, a pass commits,
    /// or there is nothing to do. Re-enter on every scheduler tick.
    pub fn tick(&self, deadline: &mut impl Deadline) -> Result<WorkStatus, EngineError> {
        let mut inner = self.inner.borrow_mut();
        let status = drive(&mut *inner, deadline);
        if status.is_err() {
            inner.abort_pass();
        }
        status
    }

    /// Drive passes to completion with no deadline. Convenience glue for
    /// hosts without a real scheduler (and for tests).
    pub fn run_to_idle(&self) -> Result<(), EngineError> {
        loop {
            let mut unlimited = crate::sched::NoYield;
            if self.tick(&mut unlimited)? == WorkStatus::Idle {
                return Ok(());
            }
        }
    }

    /// Whether the engine has no in-flight pass and no staged request.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.borrow();
        inner.wip_root.is_none()
            && inner.next_unit.is_none()
            && inner.pending.is_none()
            && !inner.flag.is_requested()
    }

    /// Borrow the host (e.g. to read the document).
    pub fn host(&self) -> Ref<'_, H> {
        Ref::map(self.inner.borrow(), |inner| &inner.host)
    }

    /// Mutably borrow the host (e.g. to dispatch events).
    ///
    /// Listeners invoked through the host may use their setters freely; they
    /// touch only their own queues and the refresh flag, never the engine's
    /// interior.
    pub fn host_mut(&self) -> RefMut<'_, H> {
        RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.host)
    }

    /// Number of live fibers in the arena (one committed generation plus any
    /// in-flight pass).
    pub fn live_fibers(&self) -> usize {
        self.inner.borrow().arena.live_count()
    }
}

fn drive<H: RetainedTree>(
    inner: &mut Inner<H>,
    deadline: &mut impl Deadline,
) -> Result<WorkStatus, EngineError> {
    inner.try_activate();

    while let Some(unit) = inner.next_unit {
        inner.next_unit = perform_unit(inner, unit)?;
        if inner.next_unit.is_some() && deadline.should_yield() {
            trace!("deadline exhausted, yielding");
            return Ok(WorkStatus::Yielded);
        }
    }

    if inner.wip_root.is_some() {
        commit_root(inner)?;
        inner.try_activate();
        return Ok(WorkStatus::Committed);
    }

    Ok(WorkStatus::Idle)
}

// =============================================================================
// Element Validation
// =============================================================================

/// Reject elements that cannot materialize: an empty `Node` tag, or the
/// synthetic `Root` kind inside a tree.
pub(crate) fn validate_element(element: &Element) -> Result<(), EngineError> {
    match &element.kind {
        Kind::Root => return Err(EngineError::MissingKind),
        Kind::Node(tag) if tag.is_empty() => return Err(EngineError::MissingKind),
        _ => {}
    }
    for child in &element.children {
        validate_element(child)?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Child;
    use crate::host::{HostOp, MemoryTree, NodeId};
    use crate::sched::UnitQuota;
    use crate::types::{ComponentFn, Event, EventHandler, Value, TEXT_VALUE};

    fn engine() -> (Engine<MemoryTree>, NodeId) {
        let host = MemoryTree::new();
        let container = host.root();
        (Engine::new(host), container)
    }

    fn span(text: &str) -> Element {
        Element::node("span", Attrs::new(), [Child::from(text)])
    }

    fn div_of(children: impl IntoIterator<Item = Child>) -> Element {
        Element::node("div", Attrs::new(), children)
    }

    #[test]
    fn test_first_render_builds_document() {
        let (engine, container) = engine();
        let tree = div_of([Child::from(span("A")), Child::from(span("B"))]);

        engine.render(tree, container).unwrap();
        engine.run_to_idle().unwrap();

        let host = engine.host();
        let divs = host.children(container);
        assert_eq!(divs.len(), 1);
        assert_eq!(host.kind(divs[0]), Some("div"));
        assert_eq!(host.children(divs[0]).len(), 2);
        assert_eq!(host.text_content(container), "AB");
        assert!(engine.is_idle());
    }

    #[test]
    fn test_idempotent_rerender_is_silent() {
        let (engine, container) = engine();
        let handler = EventHandler::new(|_| {});
        let build = |h: &EventHandler| {
            Element::node(
                "div",
                Attrs::new().with("id", "x").with("onClick", h.clone()),
                [Child::from(span("A"))],
            )
        };

        engine.render(build(&handler), container).unwrap();
        engine.run_to_idle().unwrap();
        engine.host_mut().take_ops();

        engine.render(build(&handler), container).unwrap();
        engine.run_to_idle().unwrap();

        // Second pass marks UPDATEs, but equal attributes produce zero host
        // operations.
        assert_eq!(engine.host_mut().take_ops(), Vec::new());
    }

    #[test]
    fn test_replacement_on_kind_change() {
        let (engine, container) = engine();
        engine
            .render(div_of([Child::from(Element::node("a", Attrs::new(), []))]), container)
            .unwrap();
        engine.run_to_idle().unwrap();
        let old_child = {
            let host = engine.host();
            host.children(host.children(container)[0])[0]
        };
        engine.host_mut().take_ops();

        engine
            .render(div_of([Child::from(Element::node("b", Attrs::new(), []))]), container)
            .unwrap();
        engine.run_to_idle().unwrap();

        let ops = engine.host_mut().take_ops();
        let host = engine.host();
        let div = host.children(container)[0];
        let new_child = host.children(div)[0];
        // One deletion and one placement, with the detach applied first.
        assert_eq!(
            ops,
            vec![
                HostOp::CreateNode {
                    node: new_child,
                    kind: "b".to_string()
                },
                HostOp::RemoveChild {
                    parent: div,
                    child: old_child
                },
                HostOp::AppendChild {
                    parent: div,
                    child: new_child
                },
            ]
        );
    }

    #[test]
    fn test_attribute_diff_exactness() {
        let (engine, container) = engine();
        let before = Element::node(
            "div",
            Attrs::new().with("id", "x").with("className", "y"),
            [],
        );
        let after = Element::node("div", Attrs::new().with("id", "x"), []);

        engine.render(before, container).unwrap();
        engine.run_to_idle().unwrap();
        engine.host_mut().take_ops();

        engine.render(after, container).unwrap();
        engine.run_to_idle().unwrap();

        let host = engine.host();
        let div = host.children(container)[0];
        assert_eq!(
            host.ops(),
            &[HostOp::ResetAttribute {
                node: div,
                name: "className".to_string()
            }]
        );
        assert_eq!(host.attr(div, "id"), Some(&Value::from("x")));
        assert_eq!(host.attr(div, "className"), None);
    }

    #[test]
    fn test_deletion_completeness() {
        let (engine, container) = engine();
        engine
            .render(
                div_of([
                    Child::from(span("A")),
                    Child::from(span("B")),
                    Child::from(span("C")),
                ]),
                container,
            )
            .unwrap();
        engine.run_to_idle().unwrap();
        engine.host_mut().take_ops();

        engine.render(div_of([Child::from(span("A"))]), container).unwrap();
        engine.run_to_idle().unwrap();

        let host = engine.host();
        let div = host.children(container)[0];
        assert_eq!(host.children(div).len(), 1);
        assert_eq!(host.text_content(container), "A");

        let removals = host
            .ops()
            .iter()
            .filter(|op| matches!(op, HostOp::RemoveChild { .. }))
            .count();
        assert_eq!(removals, 2);
        assert_eq!(host.ops().len(), 2);
    }

    #[test]
    fn test_commit_atomicity_on_first_render() {
        let (engine, container) = engine();
        let tree = div_of([Child::from(span("A")), Child::from(span("B"))]);
        engine.render(tree, container).unwrap();

        // One fiber per tick: div, spans, texts - the pass needs several.
        let mut saw_yield = false;
        loop {
            let status = engine.tick(&mut UnitQuota::new(1)).unwrap();
            match status {
                WorkStatus::Yielded => {
                    saw_yield = true;
                    // Mid-pass the container must look untouched.
                    assert!(engine.host().children(container).is_empty());
                }
                WorkStatus::Committed => break,
                WorkStatus::Idle => panic!("pass vanished without committing"),
            }
        }
        assert!(saw_yield);
        assert_eq!(engine.host().text_content(container), "AB");
    }

    #[test]
    fn test_commit_atomicity_on_update() {
        let (engine, container) = engine();
        engine
            .render(div_of([Child::from(span("A")), Child::from(span("B"))]), container)
            .unwrap();
        engine.run_to_idle().unwrap();

        engine
            .render(div_of([Child::from(span("A")), Child::from(span("C"))]), container)
            .unwrap();
        loop {
            match engine.tick(&mut UnitQuota::new(1)).unwrap() {
                WorkStatus::Yielded => {
                    // The previous commit stays fully visible until the next
                    // one lands.
                    assert_eq!(engine.host().text_content(container), "AB");
                }
                WorkStatus::Committed => break,
                WorkStatus::Idle => panic!("pass vanished without committing"),
            }
        }
        assert_eq!(engine.host().text_content(container), "AC");
    }

    #[test]
    fn test_two_pass_span_scenario() {
        let (engine, container) = engine();
        engine
            .render(div_of([Child::from(span("A")), Child::from(span("B"))]), container)
            .unwrap();
        engine.run_to_idle().unwrap();
        engine.host_mut().take_ops();

        engine
            .render(div_of([Child::from(span("A")), Child::from(span("C"))]), container)
            .unwrap();
        engine.run_to_idle().unwrap();

        // Second pass: no placements, no deletions, and the only host-visible
        // change is the second span's text value.
        let ops = engine.host_mut().take_ops();
        let host = engine.host();
        let div = host.children(container)[0];
        let second_span = host.children(div)[1];
        let text_node = host.children(second_span)[0];
        assert_eq!(
            ops,
            vec![HostOp::SetAttribute {
                node: text_node,
                name: TEXT_VALUE.to_string()
            }]
        );
        assert_eq!(host.text_content(container), "AC");
    }

    #[test]
    fn test_missing_kind_fails_synchronously() {
        let (engine, container) = engine();
        let bad = div_of([Child::from(Element::node("", Attrs::new(), []))]);

        let err = engine.render(bad, container).unwrap_err();
        assert!(matches!(err, EngineError::MissingKind));
        assert!(engine.is_idle());
        assert!(engine.host().ops().is_empty());
    }

    #[test]
    fn test_render_during_pass_completes_in_flight_first() {
        let (engine, container) = engine();
        engine.render(div_of([Child::from(span("first"))]), container).unwrap();

        // Work the pass partway, then stage a replacement.
        assert_eq!(engine.tick(&mut UnitQuota::new(1)).unwrap(), WorkStatus::Yielded);
        engine.render(div_of([Child::from(span("second"))]), container).unwrap();

        // In-flight pass commits with its own consistent data.
        loop {
            if engine.tick(&mut UnitQuota::new(1)).unwrap() == WorkStatus::Committed {
                break;
            }
        }
        assert_eq!(engine.host().text_content(container), "first");

        // The staged pass follows at the boundary.
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host().text_content(container), "second");
    }

    #[test]
    fn test_generation_release_keeps_arena_bounded() {
        let (engine, container) = engine();
        let build = || div_of([Child::from(span("A")), Child::from(span("B"))]);

        engine.render(build(), container).unwrap();
        engine.run_to_idle().unwrap();
        let after_first = engine.live_fibers();
        // root + div + 2 spans + 2 texts
        assert_eq!(after_first, 6);

        for _ in 0..5 {
            engine.render(build(), container).unwrap();
            engine.run_to_idle().unwrap();
            assert_eq!(engine.live_fibers(), after_first);
        }
    }

    fn counter_component() -> ComponentFn {
        ComponentFn::new(|hooks, _attrs| {
            let (count, set) = hooks.use_state(0i64);
            let on_click = EventHandler::new(move |_| {
                set.update(|prev| Value::Int(prev.as_int().unwrap_or(0) + 1));
            });
            Element::node(
                "div",
                Attrs::new(),
                [
                    Child::from(Element::node(
                        "button",
                        Attrs::new().with("id", "inc").with("onClick", on_click),
                        [],
                    )),
                    Child::from(count.display()),
                ],
            )
        })
    }

    #[test]
    fn test_component_state_updates_rerender() {
        let (engine, container) = engine();
        let root = Element::component(counter_component(), Attrs::new());

        engine.render(root, container).unwrap();
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host().text_content(container), "0");

        let button = engine
            .host()
            .find_by_attr("id", &Value::from("inc"))
            .unwrap();

        engine.host_mut().dispatch(button, &Event::new("click"));
        assert!(!engine.is_idle());
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host().text_content(container), "1");

        // Two queued actions drain in order on the next read.
        engine.host_mut().dispatch(button, &Event::new("click"));
        engine.host_mut().dispatch(button, &Event::new("click"));
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host().text_content(container), "3");
    }

    #[test]
    fn test_component_keeps_node_identity_across_refreshes() {
        let (engine, container) = engine();
        let root = Element::component(counter_component(), Attrs::new());
        engine.render(root, container).unwrap();
        engine.run_to_idle().unwrap();

        let div_before = engine.host().children(container)[0];
        let button = engine
            .host()
            .find_by_attr("id", &Value::from("inc"))
            .unwrap();
        engine.host_mut().dispatch(button, &Event::new("click"));
        engine.run_to_idle().unwrap();

        // Same kinds at the same positions: nodes are reused, not replaced.
        assert_eq!(engine.host().children(container)[0], div_before);
    }

    #[test]
    fn test_setter_after_unmount_is_noop() {
        let (engine, container) = engine();
        let setter_out: Rc<RefCell<Option<crate::state::Setter>>> =
            Rc::new(RefCell::new(None));
        let setter_slot = setter_out.clone();
        let leaky = ComponentFn::new(move |hooks, _attrs| {
            let (count, set) = hooks.use_state(0i64);
            *setter_slot.borrow_mut() = Some(set);
            Element::node("div", Attrs::new(), [Child::from(count.display())])
        });

        engine
            .render(Element::component(leaky, Attrs::new()), container)
            .unwrap();
        engine.run_to_idle().unwrap();
        let setter = setter_out.borrow_mut().take().unwrap();

        // Replace the component with a plain tree; its fibers are released.
        engine.render(div_of([Child::from(span("X"))]), container).unwrap();
        engine.run_to_idle().unwrap();
        engine.host_mut().take_ops();

        // The stale setter still requests a pass, but the refresh finds no
        // cell to change and commits nothing.
        setter.set(99i64);
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host_mut().take_ops(), Vec::new());
        assert_eq!(engine.host().text_content(container), "X");
    }

    #[test]
    fn test_component_bad_output_aborts_pass() {
        let (engine, container) = engine();
        let broken = ComponentFn::new(|_, _| Element::node("", Attrs::new(), []));

        engine
            .render(Element::component(broken, Attrs::new()), container)
            .unwrap();
        let err = engine.run_to_idle().unwrap_err();
        assert!(matches!(err, EngineError::MissingKind));

        // The pass is gone; the engine accepts new work.
        engine.render(div_of([Child::from(span("ok"))]), container).unwrap();
        engine.run_to_idle().unwrap();
        assert_eq!(engine.host().text_content(container), "ok");
    }

    #[test]
    fn test_validate_rejects_root_kind() {
        let element = Element {
            kind: Kind::Root,
            attrs: Attrs::new(),
            children: Vec::new(),
        };
        assert!(matches!(
            validate_element(&element),
            Err(EngineError::MissingKind)
        ));
    }
}
