//! Log-only channel sender
//!
//! Stands in for a real chat or sms provider in deployments that have
//! none wired up: the message lands in the structured log and the
//! dispatcher records a synthetic receipt.

use async_trait::async_trait;
use obliq_notify::{ChannelSendError, ChannelSender, SendReceipt};
use obliq_types::Channel;

/// Writes every send to the log instead of a provider
#[derive(Debug, Clone, Copy)]
pub struct LogSender {
    channel: Channel,
}

impl LogSender {
    /// A sender tagged with the channel it stands in for
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl ChannelSender for LogSender {
    async fn send(&self, address: &str, message: &str) -> Result<SendReceipt, ChannelSendError> {
        tracing::info!(channel = %self.channel, address, message, "notification (log-only)");
        Ok(SendReceipt {
            provider_message_id: format!("log-{}", uuid::Uuid::new_v4()),
        })
    }
}
