//! Obliq domain types
//!
//! The shared vocabulary of the obligation tracking engine:
//! - Identifier newtypes (item, tenant, employee, escalation, sweep run)
//! - Closed enums for roles, workflow statuses and escalation statuses
//! - Items and their append-only transition log
//! - Escalation records, chains and per-level rules
//! - Organizational hierarchy rows and the HR contact pool
//! - Notification log entries with day-bucket dedup keys
//!
//! Everything here is plain data; behavior lives in the engine crates.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod escalation;
pub mod hierarchy;
pub mod id;
pub mod item;
pub mod notification;
pub mod role;
pub mod status;

// Re-exports for convenience
pub use escalation::{
    ChainKey, EscalationRecord, EscalationRule, SweepRun, SweepSummary, MAX_ESCALATION_LEVEL,
};
pub use hierarchy::{HrContact, OrgEdge};
pub use id::{EmployeeId, EscalationId, ItemId, SweepRunId, TenantId};
pub use item::{Item, TransitionChannel, TransitionLogEntry};
pub use notification::{
    DayBucket, NotificationKey, NotificationLogEntry, Recipient, SubjectId,
};
pub use role::Role;
pub use status::{Channel, EscalationStatus, NotificationStatus, WorkflowStatus};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with obliq types
    pub use crate::{
        Channel, EmployeeId, EscalationId, EscalationRecord, EscalationRule, EscalationStatus,
        Item, ItemId, Recipient, Role, SubjectId, SweepSummary, TenantId, WorkflowStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
