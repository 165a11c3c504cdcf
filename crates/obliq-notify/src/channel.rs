//! Channel collaborator contract
//!
//! One implementation per transport (chat bot API, messaging gateway). The
//! dispatcher is transport-agnostic beyond this trait; concrete
//! implementations live with the deployment, and the test suites use the
//! recording fake from `obliq-test-utils`.

use async_trait::async_trait;

/// Provider acknowledgement for a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-side message id, recorded in the notification log
    pub provider_message_id: String,
}

/// A single channel send failed
///
/// Always isolated to its channel: the dispatcher logs it and keeps going.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChannelSendError {
    /// The provider accepted the request and refused the message
    #[error("provider rejected send: {0}")]
    Rejected(String),

    /// The provider could not be reached
    #[error("transport error: {0}")]
    Transport(String),
}

/// One notification transport
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Deliver `message` to `address`
    async fn send(&self, address: &str, message: &str) -> Result<SendReceipt, ChannelSendError>;
}
