//! Repository traits
//!
//! The engine never talks to a database directly; each component is handed
//! the narrow trait it needs, so tests substitute [`crate::MemoryStore`]
//! and a production deployment wires a SQL-backed implementation.
//!
//! Conditional writes are the only concurrency control in the system: every
//! status mutation is `UPDATE … WHERE status = <observed>` and reports via
//! `Ok(bool)` whether the guard matched. There is no lock table.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use obliq_types::{
    ChainKey, EmployeeId, EscalationId, EscalationRecord, EscalationRule, EscalationStatus,
    HrContact, Item, ItemId, NotificationKey, NotificationLogEntry, NotificationStatus, OrgEdge,
    Recipient, SweepRun, TenantId, TransitionLogEntry, WorkflowStatus,
};

/// Items and their append-only transition log
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch an item by id
    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Insert a new item; fails on duplicate id
    async fn insert_item(&self, item: Item) -> Result<(), StoreError>;

    /// Conditional status update keyed on the observed old status
    ///
    /// `UPDATE items SET workflow_status = new, updated_at = now
    ///  WHERE id = ? AND workflow_status = expected`.
    /// Returns `Ok(false)` when the guard did not match (concurrent writer
    /// won) and `Err(NotFound)` when the item does not exist.
    async fn compare_and_set_status(
        &self,
        id: ItemId,
        expected: WorkflowStatus,
        new: WorkflowStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Append a transition audit record
    async fn append_transition(&self, entry: TransitionLogEntry) -> Result<(), StoreError>;

    /// All transitions for one item, oldest first
    async fn transitions(&self, item_id: ItemId) -> Result<Vec<TransitionLogEntry>, StoreError>;
}

/// Mutation applied together with a successful escalation-status CAS
#[derive(Debug, Clone, Default)]
pub struct EscalationUpdate {
    /// Set `escalated_at` when the record is claimed
    pub escalated_at: Option<DateTime<Utc>>,
    /// Terminal or hand-off reason
    pub reason: Option<String>,
}

/// Escalation records and chains
#[async_trait]
pub trait EscalationStore: Send + Sync {
    /// Fetch a record by id
    async fn record(&self, id: EscalationId) -> Result<Option<EscalationRecord>, StoreError>;

    /// Insert a new record; fails on duplicate id
    async fn insert_record(&self, record: EscalationRecord) -> Result<(), StoreError>;

    /// Records with `status = Pending AND next_escalation_at <= now`,
    /// oldest due first, capped at `limit`
    async fn due_records(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EscalationRecord>, StoreError>;

    /// All records of one chain, by ascending level
    async fn chain_records(&self, key: ChainKey) -> Result<Vec<EscalationRecord>, StoreError>;

    /// Insert the opening record of a chain unless the chain exists
    ///
    /// Conditional like the status updates: returns `Ok(false)` without
    /// writing when any record (live or terminal) already carries
    /// `record.chain_key()`. A SQL backend expresses this as
    /// `INSERT … SELECT WHERE NOT EXISTS` or a unique index on the chain
    /// key columns.
    async fn insert_chain_origin(&self, record: EscalationRecord) -> Result<bool, StoreError>;

    /// Conditional status update keyed on the observed old status
    ///
    /// On a match, also applies `update`. Returns `Ok(false)` when a
    /// concurrent writer already moved the record past `expected`.
    async fn compare_and_set_record(
        &self,
        id: EscalationId,
        expected: EscalationStatus,
        new: EscalationStatus,
        update: EscalationUpdate,
    ) -> Result<bool, StoreError>;
}

/// Per-level escalation rules with tenant override
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Effective rule for `(tenant, level)`: the tenant-specific row when
    /// present, otherwise the global default for that level
    async fn rule(
        &self,
        tenant_id: TenantId,
        level: u8,
    ) -> Result<Option<EscalationRule>, StoreError>;

    /// Insert or replace a rule row (matched on `(tenant_id, level)`)
    async fn upsert_rule(&self, rule: EscalationRule) -> Result<(), StoreError>;
}

/// Organizational hierarchy, HR pool and the recipient directory
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Hierarchy row for an employee
    async fn org_edge(
        &self,
        tenant_id: TenantId,
        employee_id: EmployeeId,
    ) -> Result<Option<OrgEdge>, StoreError>;

    /// Insert or replace a hierarchy row
    async fn upsert_edge(&self, edge: OrgEdge) -> Result<(), StoreError>;

    /// All HR contacts for a tenant (active and inactive)
    async fn hr_contacts(&self, tenant_id: TenantId) -> Result<Vec<HrContact>, StoreError>;

    /// Insert or replace an HR contact (matched on `(tenant_id, employee_id)`)
    async fn upsert_hr_contact(&self, contact: HrContact) -> Result<(), StoreError>;

    /// Dispatcher-facing view of an employee (addresses per channel)
    async fn recipient(&self, employee_id: EmployeeId) -> Result<Option<Recipient>, StoreError>;

    /// Insert or replace a recipient directory row
    async fn upsert_recipient(&self, recipient: Recipient) -> Result<(), StoreError>;
}

/// Notification log with conditional-insert dedup
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Reserve a dedup key with a `Pending` row
    ///
    /// Returns `Ok(false)` without writing when a row for `entry.key`
    /// already exists; this is the dedup guarantee.
    async fn try_reserve(&self, entry: NotificationLogEntry) -> Result<bool, StoreError>;

    /// Finalize a previously reserved row
    async fn finalize(
        &self,
        key: NotificationKey,
        status: NotificationStatus,
        provider_message_id: Option<String>,
        error: Option<String>,
    ) -> Result<(), StoreError>;

    /// Fetch a log entry by key
    async fn entry(&self, key: NotificationKey)
        -> Result<Option<NotificationLogEntry>, StoreError>;
}

/// Sweep run summaries
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist one sweep run summary
    async fn record_run(&self, run: SweepRun) -> Result<(), StoreError>;

    /// Most recent runs, newest first, capped at `limit`
    async fn recent_runs(&self, limit: usize) -> Result<Vec<SweepRun>, StoreError>;
}
