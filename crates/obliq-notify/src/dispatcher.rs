//! Notification dispatcher
//!
//! Fans a message out to one or more channels for a recipient, records the
//! outcome, and deduplicates by `(subject, recipient, day-bucket)`.
//!
//! Dedup happens before any send: a conditional insert reserves the key,
//! and a dispatch that loses the reservation skips every channel. Within
//! one dispatch the channel sends run with bounded concurrency; a failing
//! channel never prevents the others from being attempted, and the call
//! never fails on partial failure, only on a store outage.

use crate::channel::{ChannelSendError, ChannelSender};
use crate::error::NotifyError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use obliq_types::{
    Channel, DayBucket, NotificationKey, NotificationLogEntry, NotificationStatus, Recipient,
    SubjectId,
};
use obliq_store::NotificationStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Default cap on concurrent channel sends within one dispatch
pub const DEFAULT_FAN_OUT_LIMIT: usize = 4;

/// Outcome of one channel within a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Delivered; provider receipt attached
    Sent {
        /// Provider-side message id
        provider_message_id: String,
    },
    /// The send was attempted and failed
    Failed {
        /// Provider or transport error text
        error: String,
    },
    /// The day-bucket key was already consumed; nothing was attempted
    Skipped,
    /// The recipient has no address for this channel
    NoAddress,
    /// No sender is registered for this channel
    Disabled,
}

/// Per-channel outcome map for one dispatch call
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Outcomes in requested-channel order
    pub outcomes: IndexMap<Channel, ChannelOutcome>,
}

impl DispatchReport {
    /// Whether at least one channel delivered
    #[inline]
    #[must_use]
    pub fn any_sent(&self) -> bool {
        self.outcomes
            .values()
            .any(|o| matches!(o, ChannelOutcome::Sent { .. }))
    }

    /// Whether the whole dispatch was deduplicated away
    #[inline]
    #[must_use]
    pub fn deduplicated(&self) -> bool {
        !self.outcomes.is_empty()
            && self
                .outcomes
                .values()
                .all(|o| matches!(o, ChannelOutcome::Skipped))
    }
}

/// The dispatch/deduplication layer
///
/// Shared by the escalation engine (per-level hand-off notices) and the
/// workflow state machine (terminal completion notices).
pub struct Dispatcher {
    log: Arc<dyn NotificationStore>,
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
    fan_out_limit: usize,
}

impl Dispatcher {
    /// Create a dispatcher with no channels registered
    #[must_use]
    pub fn new(log: Arc<dyn NotificationStore>) -> Self {
        Self {
            log,
            senders: HashMap::new(),
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
        }
    }

    /// Register a sender for a channel
    #[must_use]
    pub fn with_sender(mut self, channel: Channel, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(channel, sender);
        self
    }

    /// Cap concurrent sends within one dispatch (minimum 1)
    #[must_use]
    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit.max(1);
        self
    }

    /// Fan a message out to `channels` for `recipient`
    ///
    /// Returns the per-channel outcome map. Errors only when the
    /// notification log itself is unreachable; channel failures are
    /// reported in the map, never as an `Err`.
    ///
    /// Takes its arguments by value so the returned future is `Send`
    /// even when driven through `dyn` store handles from a spawned task.
    pub async fn dispatch(
        &self,
        subject_id: SubjectId,
        recipient: Recipient,
        channels: Vec<Channel>,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, NotifyError> {
        let mut report = DispatchReport::default();
        let mut attempts: Vec<(Channel, Arc<dyn ChannelSender>, String)> = Vec::new();

        for channel in channels {
            if report.outcomes.contains_key(&channel) {
                continue; // A channel listed twice is attempted once
            }
            let Some(sender) = self.senders.get(&channel) else {
                report.outcomes.insert(channel, ChannelOutcome::Disabled);
                continue;
            };
            let Some(address) = recipient.address(channel) else {
                report.outcomes.insert(channel, ChannelOutcome::NoAddress);
                continue;
            };
            attempts.push((channel, Arc::clone(sender), address.to_string()));
        }

        if attempts.is_empty() {
            tracing::debug!(
                subject = %subject_id,
                recipient = %recipient.id,
                "dispatch had no usable channels"
            );
            return Ok(report);
        }

        let key = NotificationKey {
            subject_id,
            recipient_id: recipient.id,
            day_bucket: DayBucket::of(now),
        };
        let reserved = self
            .log
            .try_reserve(NotificationLogEntry {
                key,
                channel: attempts[0].0,
                status: NotificationStatus::Pending,
                provider_message_id: None,
                error: None,
                created_at: now,
            })
            .await?;
        if !reserved {
            tracing::debug!(
                subject = %subject_id,
                recipient = %recipient.id,
                day = %key.day_bucket,
                "dispatch deduplicated"
            );
            for (channel, _, _) in attempts {
                report.outcomes.insert(channel, ChannelOutcome::Skipped);
            }
            return Ok(report);
        }

        // Bounded fan-out with a join point; order of completion does not
        // matter, the report is keyed by channel.
        // The sends are built up front rather than lazily inside the
        // stream: storing the mapping closure in the stream state trips
        // rustc's auto-trait solver on the `dyn ChannelSender` lifetime
        // (rust-lang/rust#110338) and makes the future non-`Send`.
        let sends: Vec<_> = attempts
            .into_iter()
            .map(|(channel, sender, address)| {
                let message = message.clone();
                async move {
                    let result = sender.send(&address, &message).await;
                    (channel, result)
                }
            })
            .collect();
        let results: Vec<(Channel, Result<crate::channel::SendReceipt, ChannelSendError>)> =
            stream::iter(sends)
                .buffer_unordered(self.fan_out_limit)
                .collect()
                .await;

        let mut first_receipt: Option<String> = None;
        let mut first_error: Option<String> = None;
        for (channel, result) in results {
            match result {
                Ok(receipt) => {
                    if first_receipt.is_none() {
                        first_receipt = Some(receipt.provider_message_id.clone());
                    }
                    report.outcomes.insert(
                        channel,
                        ChannelOutcome::Sent {
                            provider_message_id: receipt.provider_message_id,
                        },
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        subject = %subject_id,
                        recipient = %recipient.id,
                        %channel,
                        error = %err,
                        "channel send failed"
                    );
                    if first_error.is_none() {
                        first_error = Some(err.to_string());
                    }
                    report.outcomes.insert(
                        channel,
                        ChannelOutcome::Failed {
                            error: err.to_string(),
                        },
                    );
                }
            }
        }

        let (status, receipt, error) = if report.any_sent() {
            (NotificationStatus::Sent, first_receipt, None)
        } else {
            (NotificationStatus::Failed, None, first_error)
        };
        self.log.finalize(key, status, receipt, error).await?;

        Ok(report)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.senders.keys().collect::<Vec<_>>())
            .field("fan_out_limit", &self.fan_out_limit)
            .finish_non_exhaustive()
    }
}
