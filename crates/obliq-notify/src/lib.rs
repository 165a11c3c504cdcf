//! Obliq notification dispatch
//!
//! The fan-out and deduplication layer both engines depend on:
//! - [`ChannelSender`]: the narrow collaborator contract, one
//!   implementation per transport
//! - [`Dispatcher`]: day-bucket dedup via conditional insert, bounded
//!   concurrent fan-out, per-channel failure isolation
//!
//! Delivery is best-effort by design; the only guarantee is at most one
//! send attempt per `(subject, recipient, day)` recorded in the log.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod channel;
pub mod dispatcher;
pub mod error;

// Re-exports for convenience
pub use channel::{ChannelSendError, ChannelSender, SendReceipt};
pub use dispatcher::{ChannelOutcome, DispatchReport, Dispatcher, DEFAULT_FAN_OUT_LIMIT};
pub use error::NotifyError;
