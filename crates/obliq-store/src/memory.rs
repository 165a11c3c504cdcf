//! In-memory reference store
//!
//! Backs the test suites and the dev server. Per-entry atomicity comes from
//! DashMap's entry locking: a compare-and-set holds the shard lock for the
//! read-compare-write, which is exactly the guarantee a SQL backend gets
//! from `UPDATE … WHERE status = ?`.

use crate::error::StoreError;
use crate::repo::{
    EscalationStore, EscalationUpdate, HierarchyStore, ItemStore, NotificationStore, RuleStore,
    RunStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use obliq_types::{
    ChainKey, EmployeeId, EscalationId, EscalationRecord, EscalationRule, EscalationStatus,
    HrContact, Item, ItemId, NotificationKey, NotificationLogEntry, NotificationStatus, OrgEdge,
    Recipient, SweepRun, TenantId, TransitionLogEntry, WorkflowStatus,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory implementation of every repository trait
///
/// Seeded with the built-in default escalation rules. `set_unavailable`
/// flips every operation to `StoreError::Unavailable`, which is how the
/// tests exercise store-outage paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: DashMap<ItemId, Item>,
    transitions: Mutex<Vec<TransitionLogEntry>>,
    escalations: DashMap<EscalationId, EscalationRecord>,
    rules: Mutex<Vec<EscalationRule>>,
    edges: DashMap<(TenantId, EmployeeId), OrgEdge>,
    hr_contacts: Mutex<Vec<HrContact>>,
    recipients: DashMap<EmployeeId, Recipient>,
    notifications: DashMap<NotificationKey, NotificationLogEntry>,
    runs: Mutex<Vec<SweepRun>>,
    chain_origin_lock: Mutex<()>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create a store seeded with the built-in default rules
    #[must_use]
    pub fn new() -> Self {
        let store = Self::default();
        *store.rules.lock() = EscalationRule::builtin_defaults();
        store
    }

    /// Simulate a store-wide outage (or recover from one)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of escalation records held (test convenience)
    #[must_use]
    pub fn escalation_count(&self) -> usize {
        self.escalations.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        self.check_available()?;
        Ok(self.items.get(&id).map(|e| e.clone()))
    }

    async fn insert_item(&self, item: Item) -> Result<(), StoreError> {
        self.check_available()?;
        match self.items.entry(item.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Duplicate(format!("item {}", item.id)))
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(item);
                Ok(())
            }
        }
    }

    async fn compare_and_set_status(
        &self,
        id: ItemId,
        expected: WorkflowStatus,
        new: WorkflowStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        // get_mut holds the shard lock across the read-compare-write
        let Some(mut item) = self.items.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("item {id}")));
        };
        if item.workflow_status != expected {
            return Ok(false);
        }
        item.workflow_status = new;
        item.updated_at = now;
        Ok(true)
    }

    async fn append_transition(&self, entry: TransitionLogEntry) -> Result<(), StoreError> {
        self.check_available()?;
        self.transitions.lock().push(entry);
        Ok(())
    }

    async fn transitions(&self, item_id: ItemId) -> Result<Vec<TransitionLogEntry>, StoreError> {
        self.check_available()?;
        Ok(self
            .transitions
            .lock()
            .iter()
            .filter(|t| t.item_id == item_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EscalationStore for MemoryStore {
    async fn record(&self, id: EscalationId) -> Result<Option<EscalationRecord>, StoreError> {
        self.check_available()?;
        Ok(self.escalations.get(&id).map(|e| e.clone()))
    }

    async fn insert_record(&self, record: EscalationRecord) -> Result<(), StoreError> {
        self.check_available()?;
        match self.escalations.entry(record.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Duplicate(format!("escalation {}", record.id)))
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(record);
                Ok(())
            }
        }
    }

    async fn due_records(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<EscalationRecord>, StoreError> {
        self.check_available()?;
        let mut due: Vec<EscalationRecord> = self
            .escalations
            .iter()
            .filter(|e| e.is_overdue(now))
            .map(|e| e.clone())
            .collect();
        due.sort_by_key(|e| e.next_escalation_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn chain_records(&self, key: ChainKey) -> Result<Vec<EscalationRecord>, StoreError> {
        self.check_available()?;
        let mut records: Vec<EscalationRecord> = self
            .escalations
            .iter()
            .filter(|e| e.chain_key() == key)
            .map(|e| e.clone())
            .collect();
        records.sort_by_key(|e| e.level);
        Ok(records)
    }

    async fn insert_chain_origin(&self, record: EscalationRecord) -> Result<bool, StoreError> {
        self.check_available()?;
        let key = record.chain_key();
        // The guard spans the existence check and the insert, so two
        // concurrent openers cannot both observe an empty chain
        let _guard = self.chain_origin_lock.lock();
        if self.escalations.iter().any(|e| e.chain_key() == key) {
            return Ok(false);
        }
        match self.escalations.entry(record.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Duplicate(format!("escalation {}", record.id)))
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(record);
                Ok(true)
            }
        }
    }

    async fn compare_and_set_record(
        &self,
        id: EscalationId,
        expected: EscalationStatus,
        new: EscalationStatus,
        update: EscalationUpdate,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let Some(mut record) = self.escalations.get_mut(&id) else {
            return Err(StoreError::NotFound(format!("escalation {id}")));
        };
        if record.status != expected {
            return Ok(false);
        }
        record.status = new;
        if update.escalated_at.is_some() {
            record.escalated_at = update.escalated_at;
        }
        if update.reason.is_some() {
            record.reason = update.reason;
        }
        Ok(true)
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn rule(
        &self,
        tenant_id: TenantId,
        level: u8,
    ) -> Result<Option<EscalationRule>, StoreError> {
        self.check_available()?;
        let rules = self.rules.lock();
        let tenant_rule = rules
            .iter()
            .find(|r| r.level == level && r.tenant_id == Some(tenant_id));
        let effective = tenant_rule.or_else(|| {
            rules
                .iter()
                .find(|r| r.level == level && r.tenant_id.is_none())
        });
        Ok(effective.cloned())
    }

    async fn upsert_rule(&self, rule: EscalationRule) -> Result<(), StoreError> {
        self.check_available()?;
        let mut rules = self.rules.lock();
        if let Some(existing) = rules
            .iter_mut()
            .find(|r| r.level == rule.level && r.tenant_id == rule.tenant_id)
        {
            *existing = rule;
        } else {
            rules.push(rule);
        }
        Ok(())
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn org_edge(
        &self,
        tenant_id: TenantId,
        employee_id: EmployeeId,
    ) -> Result<Option<OrgEdge>, StoreError> {
        self.check_available()?;
        Ok(self
            .edges
            .get(&(tenant_id, employee_id))
            .map(|e| e.clone()))
    }

    async fn upsert_edge(&self, edge: OrgEdge) -> Result<(), StoreError> {
        self.check_available()?;
        self.edges.insert((edge.tenant_id, edge.employee_id), edge);
        Ok(())
    }

    async fn hr_contacts(&self, tenant_id: TenantId) -> Result<Vec<HrContact>, StoreError> {
        self.check_available()?;
        Ok(self
            .hr_contacts
            .lock()
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn upsert_hr_contact(&self, contact: HrContact) -> Result<(), StoreError> {
        self.check_available()?;
        let mut contacts = self.hr_contacts.lock();
        if let Some(existing) = contacts
            .iter_mut()
            .find(|c| c.tenant_id == contact.tenant_id && c.employee_id == contact.employee_id)
        {
            *existing = contact;
        } else {
            contacts.push(contact);
        }
        Ok(())
    }

    async fn recipient(&self, employee_id: EmployeeId) -> Result<Option<Recipient>, StoreError> {
        self.check_available()?;
        Ok(self.recipients.get(&employee_id).map(|e| e.clone()))
    }

    async fn upsert_recipient(&self, recipient: Recipient) -> Result<(), StoreError> {
        self.check_available()?;
        self.recipients.insert(recipient.id, recipient);
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn try_reserve(&self, entry: NotificationLogEntry) -> Result<bool, StoreError> {
        self.check_available()?;
        match self.notifications.entry(entry.key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(entry);
                Ok(true)
            }
        }
    }

    async fn finalize(
        &self,
        key: NotificationKey,
        status: NotificationStatus,
        provider_message_id: Option<String>,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let Some(mut entry) = self.notifications.get_mut(&key) else {
            return Err(StoreError::NotFound(format!(
                "notification {}/{}/{}",
                key.subject_id, key.recipient_id, key.day_bucket
            )));
        };
        entry.status = status;
        entry.provider_message_id = provider_message_id;
        entry.error = error;
        Ok(())
    }

    async fn entry(
        &self,
        key: NotificationKey,
    ) -> Result<Option<NotificationLogEntry>, StoreError> {
        self.check_available()?;
        Ok(self.notifications.get(&key).map(|e| e.clone()))
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn record_run(&self, run: SweepRun) -> Result<(), StoreError> {
        self.check_available()?;
        self.runs.lock().push(run);
        Ok(())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<SweepRun>, StoreError> {
        self.check_available()?;
        let runs = self.runs.lock();
        Ok(runs.iter().rev().take(limit).cloned().collect())
    }
}
