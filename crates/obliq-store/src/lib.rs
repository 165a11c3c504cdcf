//! Obliq row-store layer
//!
//! The persistent storage engine is an external collaborator; this crate
//! defines the narrow repository traits the engine consumes and ships the
//! in-memory reference implementation used by tests and the dev server.
//!
//! The design rule across the workspace: every status mutation is a
//! conditional write keyed on the observed old value. A lost race is
//! `Ok(false)`, never an error, so each caller decides whether losing means
//! "retry after refetch" (workflow) or "another sweep claimed it, move on"
//! (escalation).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod memory;
pub mod repo;

// Re-exports for convenience
pub use error::StoreError;
pub use memory::MemoryStore;
pub use repo::{
    EscalationStore, EscalationUpdate, HierarchyStore, ItemStore, NotificationStore, RuleStore,
    RunStore,
};
