//! Escalation chains: records and per-level rules
//!
//! A chain is the ordered sequence of [`EscalationRecord`]s sharing
//! `(tenant, item, original_recipient)`. Invariants enforced by the engine:
//! at most one `Pending` record per chain, levels strictly increase by one,
//! and no record is created after a chain-terminal status.

use crate::id::{EmployeeId, EscalationId, ItemId, TenantId};
use crate::role::Role;
use crate::status::{Channel, EscalationStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Highest escalation level; beyond it a chain expires
pub const MAX_ESCALATION_LEVEL: u8 = 4;

/// Identity of a chain: all records of one chain share these three fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainKey {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// The overdue item
    pub item_id: ItemId,
    /// The employee who originally ignored the reminder
    pub original_recipient_id: EmployeeId,
}

/// One link in an escalation chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    /// Unique id
    pub id: EscalationId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// The overdue item
    pub item_id: ItemId,
    /// First recipient of the chain
    pub original_recipient_id: EmployeeId,
    /// Level of this record, 1..=[`MAX_ESCALATION_LEVEL`]
    pub level: u8,
    /// Who currently holds the escalation
    pub current_recipient_id: EmployeeId,
    /// Holder of the predecessor record, if any
    pub previous_recipient_id: Option<EmployeeId>,
    /// Record status; the `status` column is the CAS target
    pub status: EscalationStatus,
    /// When this record becomes overdue
    pub next_escalation_at: DateTime<Utc>,
    /// Set when the record is claimed by a sweep
    pub escalated_at: Option<DateTime<Utc>>,
    /// Terminal reason (expiry, acknowledgement note)
    pub reason: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl EscalationRecord {
    /// Chain identity of this record
    #[inline]
    #[must_use]
    pub fn chain_key(&self) -> ChainKey {
        ChainKey {
            tenant_id: self.tenant_id,
            item_id: self.item_id,
            original_recipient_id: self.original_recipient_id,
        }
    }

    /// Whether this record is overdue at `now`
    #[inline]
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == EscalationStatus::Pending && self.next_escalation_at <= now
    }
}

/// Per-level escalation configuration
///
/// A tenant-specific row (`tenant_id = Some(..)`) overrides the global
/// default (`tenant_id = None`) for the same level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Level this rule applies to
    pub level: u8,
    /// Owning tenant, or `None` for the global default
    pub tenant_id: Option<TenantId>,
    /// Grace period before the next hand-off
    pub delay_hours: i64,
    /// Role notified at this level
    pub recipient_role: Role,
    /// Channels to fan out over
    pub channels: Vec<Channel>,
    /// Message template; `{title}` and `{level}` are substituted
    pub message_template: String,
}

impl EscalationRule {
    /// Grace period as a chrono duration
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::hours(self.delay_hours)
    }

    /// Built-in defaults for levels 1..=4
    ///
    /// Used when a tenant has no rules of its own; a store backend may seed
    /// these as `tenant_id = NULL` rows instead.
    #[must_use]
    pub fn builtin_defaults() -> Vec<Self> {
        vec![
            Self {
                level: 1,
                tenant_id: None,
                delay_hours: 24,
                recipient_role: Role::Supervisor,
                channels: vec![Channel::Chat],
                message_template: "Obligation \"{title}\" is overdue (escalation level {level})."
                    .to_string(),
            },
            Self {
                level: 2,
                tenant_id: None,
                delay_hours: 24,
                recipient_role: Role::Manager,
                channels: vec![Channel::Chat, Channel::Sms],
                message_template:
                    "Obligation \"{title}\" remains unacknowledged (escalation level {level})."
                        .to_string(),
            },
            Self {
                level: 3,
                tenant_id: None,
                delay_hours: 48,
                recipient_role: Role::Director,
                channels: vec![Channel::Chat, Channel::Sms],
                message_template:
                    "Obligation \"{title}\" remains unacknowledged (escalation level {level})."
                        .to_string(),
            },
            Self {
                level: 4,
                tenant_id: None,
                delay_hours: 72,
                recipient_role: Role::HrAdmin,
                channels: vec![Channel::Chat],
                message_template:
                    "Final escalation: obligation \"{title}\" has reached HR (level {level})."
                        .to_string(),
            },
        ]
    }

    /// Render the message template for a given item title
    #[must_use]
    pub fn render_message(&self, title: &str) -> String {
        self.message_template
            .replace("{title}", title)
            .replace("{level}", &self.level.to_string())
    }
}

/// Persisted record of one sweep invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRun {
    /// Unique id
    pub id: crate::id::SweepRunId,
    /// When the sweep started
    pub started_at: DateTime<Utc>,
    /// Aggregate counts
    pub summary: SweepSummary,
}

/// Aggregate result of one sweep invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Overdue records examined
    pub processed: usize,
    /// Records handed to the next level
    pub escalated: usize,
    /// Records expired (max level or no recipient)
    pub expired: usize,
    /// Records that failed with a store error
    pub errors: usize,
    /// Wall-clock duration of the sweep
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_cover_every_level() {
        let rules = EscalationRule::builtin_defaults();
        let levels: Vec<u8> = rules.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 4]);
        for rule in &rules {
            assert_eq!(
                Role::for_escalation_level(rule.level),
                Some(rule.recipient_role)
            );
            assert!(!rule.channels.is_empty());
        }
    }

    #[test]
    fn message_template_substitution() {
        let rule = &EscalationRule::builtin_defaults()[0];
        let msg = rule.render_message("Sign NDA");
        assert!(msg.contains("Sign NDA"));
        assert!(msg.contains('1'));
        assert!(!msg.contains("{title}"));
    }

    #[test]
    fn overdue_requires_pending_and_past_deadline() {
        let now = Utc::now();
        let mut record = EscalationRecord {
            id: EscalationId::new(),
            tenant_id: TenantId::new(),
            item_id: ItemId::new(),
            original_recipient_id: EmployeeId::new(),
            level: 1,
            current_recipient_id: EmployeeId::new(),
            previous_recipient_id: None,
            status: EscalationStatus::Pending,
            next_escalation_at: now - Duration::hours(1),
            escalated_at: None,
            reason: None,
            created_at: now - Duration::hours(25),
        };
        assert!(record.is_overdue(now));

        record.status = EscalationStatus::Escalated;
        assert!(!record.is_overdue(now));

        record.status = EscalationStatus::Pending;
        record.next_escalation_at = now + Duration::hours(1);
        assert!(!record.is_overdue(now));
    }
}
