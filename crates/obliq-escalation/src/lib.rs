//! Obliq escalation engine
//!
//! The deadline-driven half of the system:
//! - [`RecipientResolver`]: who hears about an overdue obligation next
//! - [`EscalationEngine`]: chain lifecycle (open, acknowledge, resolve)
//!   and the periodic [`EscalationEngine::sweep`] that advances overdue
//!   chains level-by-level
//!
//! Correctness rests on one rule: every status change is a conditional
//! write on the observed old status. The sweep may be re-run, overlapped
//! or crashed mid-batch without losing an escalation or duplicating a
//! successor.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod engine;
pub mod error;
pub mod resolver;

// Re-exports for convenience
pub use engine::{EngineConfig, EscalationEngine};
pub use error::EscalationError;
pub use resolver::RecipientResolver;
