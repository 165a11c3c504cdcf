//! Store error type

/// Errors surfaced by the row-store traits
///
/// A conditional write that loses its race is not an error; those
/// operations return `Ok(false)` so callers decide what a lost race means.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or refusing work; fatal for the current
    /// record/transition, aborts a sweep only when every access fails
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Insert hit an existing primary key
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Update targeted a row that does not exist
    #[error("row not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_detail() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
