//! Dispatcher error type

use obliq_store::StoreError;

/// Errors from the dispatch layer
///
/// Per-channel send failures never surface here; they live in the
/// [`crate::DispatchReport`]. Only the notification log being unreachable
/// makes a dispatch fail outright.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Notification log read/write failed
    #[error("notification log error: {0}")]
    Store(#[from] StoreError),
}
