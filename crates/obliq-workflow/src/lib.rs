//! Obliq workflow state machine
//!
//! Item lifecycle transitions with role-gated guard rails:
//! - A static declarative transition table ([`action::TRANSITION_TABLE`])
//! - [`WorkflowMachine::apply_action`] validating and applying transitions
//!   through a compare-and-swap on the item's status
//! - An append-only transition audit log
//! - Best-effort completion notices when an item reaches `Finished`

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod action;
pub mod error;
pub mod machine;

// Re-exports for convenience
pub use action::{available_actions, rule_for, Action, TransitionRule, TRANSITION_TABLE};
pub use error::WorkflowError;
pub use machine::{ActionRequest, WorkflowMachine};
