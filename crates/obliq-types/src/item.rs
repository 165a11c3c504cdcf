//! Obligation items and their transition audit log

use crate::id::{EmployeeId, ItemId, TenantId};
use crate::role::Role;
use crate::status::WorkflowStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bound obligation (document, contract, task)
///
/// Items are never deleted by the engine; archival is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique id
    pub id: ItemId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Short human-readable title
    pub title: String,
    /// Creator of the obligation
    pub creator_id: EmployeeId,
    /// Person responsible for fulfilling it
    pub assignee_id: EmployeeId,
    /// Deadline
    pub due_at: DateTime<Utc>,
    /// Current lifecycle status; mutated only via validated transitions
    pub workflow_status: WorkflowStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new item in the `New` status
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        title: impl Into<String>,
        creator_id: EmployeeId,
        assignee_id: EmployeeId,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            tenant_id,
            title: title.into(),
            creator_id,
            assignee_id,
            due_at,
            workflow_status: WorkflowStatus::New,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Source of a transition, recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionChannel {
    /// Interactive user action
    Ui,
    /// API caller
    Api,
    /// Engine-initiated (sweep, automation)
    System,
}

/// Immutable audit record of one successful transition
///
/// Created exactly once per transition, append-only, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    /// Item that transitioned
    pub item_id: ItemId,
    /// Status before
    pub old_status: WorkflowStatus,
    /// Status after
    pub new_status: WorkflowStatus,
    /// Caller-supplied reason, when the action requires one
    pub reason: Option<String>,
    /// Who performed the transition
    pub actor: EmployeeId,
    /// Role the actor acted under
    pub actor_role: Role,
    /// Where the action came from
    pub channel: TransitionChannel,
    /// When it happened
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_starts_new() {
        let now = Utc::now();
        let item = Item::new(
            TenantId::new(),
            "Sign NDA",
            EmployeeId::new(),
            EmployeeId::new(),
            now + chrono::Duration::days(7),
            now,
        );
        assert_eq!(item.workflow_status, WorkflowStatus::New);
        assert_eq!(item.created_at, item.updated_at);
    }
}
