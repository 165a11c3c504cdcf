//! Notification log entries, dedup keys and dispatcher-facing recipients

use crate::id::{EmployeeId, EscalationId, ItemId};
use crate::status::{Channel, NotificationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// What a notification is about: an item, an escalation record, or anything
/// else addressable by uuid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub Uuid);

impl From<ItemId> for SubjectId {
    fn from(id: ItemId) -> Self {
        Self(id.0)
    }
}

impl From<EscalationId> for SubjectId {
    fn from(id: EscalationId) -> Self {
        Self(id.0)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar-day dedup bucket (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayBucket(pub NaiveDate);

impl DayBucket {
    /// Bucket containing `at`
    #[inline]
    #[must_use]
    pub fn of(at: DateTime<Utc>) -> Self {
        Self(at.date_naive())
    }
}

impl std::fmt::Display for DayBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dedup key: one send attempt per subject, recipient and day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationKey {
    /// What the notification is about
    pub subject_id: SubjectId,
    /// Who it goes to
    pub recipient_id: EmployeeId,
    /// Which day
    pub day_bucket: DayBucket,
}

/// One row per dedup key; a second attempt for the same key is a no-op
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    /// Dedup key
    pub key: NotificationKey,
    /// First channel attempted
    pub channel: Channel,
    /// Outcome of the attempt
    pub status: NotificationStatus,
    /// Provider receipt, when a channel succeeded
    pub provider_message_id: Option<String>,
    /// First error, when every channel failed
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Dispatcher-facing view of a human: per-channel addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Employee this recipient corresponds to
    pub id: EmployeeId,
    /// Display name for message rendering and logs
    pub display_name: String,
    /// Addresses by channel; a missing channel means "not reachable there"
    pub addresses: HashMap<Channel, String>,
}

impl Recipient {
    /// Create a recipient with no addresses
    #[inline]
    #[must_use]
    pub fn new(id: EmployeeId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            addresses: HashMap::new(),
        }
    }

    /// Add an address for a channel
    #[inline]
    #[must_use]
    pub fn with_address(mut self, channel: Channel, address: impl Into<String>) -> Self {
        self.addresses.insert(channel, address.into());
        self
    }

    /// Address for a channel, if the recipient is reachable there
    #[inline]
    #[must_use]
    pub fn address(&self, channel: Channel) -> Option<&str> {
        self.addresses.get(&channel).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bucket_ignores_time_of_day() {
        let morning = "2026-03-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let night = "2026-03-01T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let next_day = "2026-03-02T00:00:01Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(DayBucket::of(morning), DayBucket::of(night));
        assert_ne!(DayBucket::of(night), DayBucket::of(next_day));
    }

    #[test]
    fn recipient_addresses() {
        let r = Recipient::new(EmployeeId::new(), "Dana").with_address(Channel::Chat, "@dana");
        assert_eq!(r.address(Channel::Chat), Some("@dana"));
        assert_eq!(r.address(Channel::Sms), None);
    }
}
