//! State module - the per-fiber local state store.
//!
//! State lives in ordered cells on the fiber that requested them and is
//! carried across commits through the alternate link:
//!
//! - **Cells** - value plus a shared action queue, one per `use_state` call
//! - **Hooks** - the per-render context components request cells through
//! - **Setter** - enqueues actions and requests a fresh render pass

mod hooks;

pub use hooks::*;
