//! Pipeline module - pass construction and commit.
//!
//! The render pipeline, in execution order:
//!
//! - **work** - `perform_unit`: materialize, reconcile, pick the next unit
//! - **patch** - attribute/listener delta for one retained node
//! - **commit** - deletion pre-pass, effect walk, promotion
//! - **engine** - the session object driving all of the above per tick

mod commit;
mod engine;
mod patch;
mod work;

pub use engine::{Engine, WorkStatus};
