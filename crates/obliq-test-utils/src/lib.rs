//! Testing utilities for the obliq workspace
//!
//! Shared fixtures: a seeded tenant with a full reporting chain, a
//! scriptable recording channel, and small constructors the integration
//! suites lean on.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use obliq_notify::{ChannelSendError, ChannelSender, Dispatcher, SendReceipt};
use obliq_store::{EscalationStore, HierarchyStore, ItemStore, MemoryStore};
use obliq_types::{
    Channel, EmployeeId, EscalationId, EscalationRecord, EscalationStatus, HrContact, Item,
    ItemId, OrgEdge, Recipient, TenantId,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Deterministic "now" for tests
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    "2026-03-02T09:00:00Z".parse().expect("valid timestamp")
}

/// One captured send
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub address: String,
    pub message: String,
}

/// Channel fake that records every send and fails on demand
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sends: Mutex<Vec<RecordedSend>>,
    fail: AtomicBool,
}

impl RecordingChannel {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().clone()
    }

    #[must_use]
    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }
}

#[async_trait]
impl ChannelSender for RecordingChannel {
    async fn send(&self, address: &str, message: &str) -> Result<SendReceipt, ChannelSendError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChannelSendError::Transport("scripted failure".to_string()));
        }
        let mut sends = self.sends.lock();
        sends.push(RecordedSend {
            address: address.to_string(),
            message: message.to_string(),
        });
        Ok(SendReceipt {
            provider_message_id: format!("prov-{}", sends.len()),
        })
    }
}

/// A tenant with a complete reporting chain and directory entries
pub struct TenantFixture {
    pub store: Arc<MemoryStore>,
    pub tenant: TenantId,
    pub employee: EmployeeId,
    pub supervisor: EmployeeId,
    pub manager: EmployeeId,
    pub director: EmployeeId,
    pub hr_contact: EmployeeId,
}

impl TenantFixture {
    /// Seed a store with employee → supervisor → manager → director plus
    /// one active HR contact, all reachable over chat and sms
    pub async fn seeded() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tenant = TenantId::new();
        let employee = EmployeeId::new();
        let supervisor = EmployeeId::new();
        let manager = EmployeeId::new();
        let director = EmployeeId::new();
        let hr_contact = EmployeeId::new();

        store
            .upsert_edge(OrgEdge {
                tenant_id: tenant,
                employee_id: employee,
                supervisor_id: Some(supervisor),
                manager_id: Some(manager),
                director_id: Some(director),
            })
            .await
            .expect("seed edge");
        store
            .upsert_hr_contact(HrContact {
                tenant_id: tenant,
                employee_id: hr_contact,
                active: true,
                primary: true,
                assigned_at: fixed_now() - Duration::days(365),
            })
            .await
            .expect("seed hr contact");

        for (id, name) in [
            (employee, "employee"),
            (supervisor, "supervisor"),
            (manager, "manager"),
            (director, "director"),
            (hr_contact, "hr"),
        ] {
            store
                .upsert_recipient(
                    Recipient::new(id, name)
                        .with_address(Channel::Chat, format!("@{name}"))
                        .with_address(Channel::Sms, format!("+1555{name}")),
                )
                .await
                .expect("seed recipient");
        }

        Self {
            store,
            tenant,
            employee,
            supervisor,
            manager,
            director,
            hr_contact,
        }
    }

    /// An item assigned to the fixture employee
    pub async fn item(&self, now: DateTime<Utc>) -> Item {
        let item = Item::new(
            self.tenant,
            "Sign vendor contract",
            self.supervisor,
            self.employee,
            now + Duration::days(3),
            now,
        );
        self.store.insert_item(item.clone()).await.expect("seed item");
        item
    }

    /// Insert a pending escalation record at `level`, already overdue at
    /// `now`, and return its id
    pub async fn overdue_record(
        &self,
        item_id: ItemId,
        level: u8,
        current_recipient_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> EscalationId {
        let record = EscalationRecord {
            id: EscalationId::new(),
            tenant_id: self.tenant,
            item_id,
            original_recipient_id: self.employee,
            level,
            current_recipient_id,
            previous_recipient_id: None,
            status: EscalationStatus::Pending,
            next_escalation_at: now - Duration::hours(1),
            escalated_at: None,
            reason: None,
            created_at: now - Duration::days(1),
        };
        let id = record.id;
        self.store.insert_record(record).await.expect("seed record");
        id
    }
}

/// Dispatcher over the fixture store with recording chat and sms channels
#[must_use]
pub fn recording_dispatcher(
    store: Arc<MemoryStore>,
    chat: Arc<RecordingChannel>,
    sms: Arc<RecordingChannel>,
) -> Arc<Dispatcher> {
    Arc::new(
        Dispatcher::new(store)
            .with_sender(Channel::Chat, chat as Arc<dyn ChannelSender>)
            .with_sender(Channel::Sms, sms as Arc<dyn ChannelSender>),
    )
}
