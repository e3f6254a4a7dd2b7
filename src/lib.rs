//! # spindle
//!
//! Incremental fiber-tree reconciliation engine for retained UI trees.
//!
//! spindle turns a declarative description of a tree (elements) into minimal
//! mutations of an externally owned retained tree (a document), keeping the
//! construction work interruptible and the visible mutations atomic.
//!
//! ## Architecture
//!
//! The pipeline per render generation:
//!
//! ```text
//! Element tree -> root Fiber -> Reconciler (effect tags, alternates)
//!     -> Work Loop (deadline-sliced, one fiber per unit)
//!     -> Commit (deletions, placements, updates - atomic) -> current tree
//! ```
//!
//! Fibers are records in an arena addressed by stable indices; two
//! generations exist at a time (committed and in-progress), linked through
//! per-fiber alternates. The host supplies the retained-tree API and the
//! scheduling budget; the engine supplies everything between.
//!
//! ## Modules
//!
//! - [`types`] - kinds, values, events, effect flags
//! - [`element`] - immutable element descriptions and constructors
//! - [`fiber`] - fiber records and the arena
//! - [`pipeline`] - work loop, commit engine, and the [`Engine`] session
//! - [`state`] - `use_state` cells and setters
//! - [`host`] - the retained-tree contract plus in-memory and terminal trees
//! - [`sched`] - deadline budgets for cooperative slicing
//!
//! ## Example
//!
//! ```
//! use spindle::{Attrs, Child, Element, Engine, MemoryTree};
//!
//! let host = MemoryTree::new();
//! let container = host.root();
//! let engine = Engine::new(host);
//!
//! let tree = Element::node("div", Attrs::new().with("id", "greeting"), [
//!     Child::from(Element::node("span", Attrs::new(), [Child::from("hello")])),
//! ]);
//!
//! engine.render(tree, container).unwrap();
//! engine.run_to_idle().unwrap();
//! assert_eq!(engine.host().text_content(container), "hello");
//! ```

pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
pub mod pipeline;
mod reconcile;
pub mod sched;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use element::{Attrs, Child, Element};
pub use error::{EngineError, HostError};
pub use fiber::{Fiber, FiberArena, FiberId};
pub use host::{HostOp, MemoryTree, NodeId, RetainedTree, TermTree};
pub use pipeline::{Engine, WorkStatus};
pub use sched::{Deadline, NoYield, TimeSlice, UnitQuota};
pub use state::{Hooks, Setter, StateAction, StateCell};
pub use types::{
    event_name, is_event_key, ComponentFn, EffectFlags, Event, EventHandler, Kind, Value,
    TEXT_VALUE,
};
