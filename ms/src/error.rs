//! Store error types

use thiserror::Error;

/// Errors that can occur during block store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// More than one live block exists for a (label, scope) pair.
    ///
    /// Never recoverable by guessing: the mutating operation is aborted.
    #[error("Store corrupted: {count} blocks found for label '{label}' in scope '{scope}'")]
    Duplicate { label: String, scope: String, count: usize },

    #[error("Block not found: label '{label}' in scope '{scope}'")]
    NotFound { label: String, scope: String },

    #[error("Batch update returned {found} values for {expected} blocks")]
    BatchSize { expected: usize, found: usize },

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Check if this error means the store broke its one-block-per-key invariant
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = StoreError::Duplicate {
            label: "global_contract_plan".to_string(),
            scope: "global".to_string(),
            count: 2,
        };

        let msg = err.to_string();
        assert!(msg.contains("2 blocks"));
        assert!(msg.contains("global_contract_plan"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_not_found_is_not_corruption() {
        let err = StoreError::NotFound {
            label: "current_plan".to_string(),
            scope: "session:abc".to_string(),
        };
        assert!(!err.is_corruption());
        assert!(err.to_string().contains("session:abc"));
    }
}
