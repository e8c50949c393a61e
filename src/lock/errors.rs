//! Lock errors

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::types::LockKind;

pub type LockResult<T> = Result<T, LockError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    /// Another lock on the table blocks the request
    #[error("Table {table_id} is locked by '{holder}' ({kind} lock until {expires_at})")]
    Conflict {
        table_id: Uuid,
        holder: String,
        kind: LockKind,
        expires_at: DateTime<Utc>,
    },

    /// The holder's optimistic lock was taken at an older table version
    #[error("Table {table_id} changed since the lock was taken (lock at version {lock_version}, table at {table_version})")]
    StaleVersion {
        table_id: Uuid,
        lock_version: u64,
        table_version: u64,
    },

    /// No active lock on the table matches the token
    #[error("No active lock with the given token on table {table_id}")]
    NotFound { table_id: Uuid },

    #[error("Invalid lock duration: {0}")]
    InvalidDuration(String),

    #[error("Lock storage error: {0}")]
    StorageError(String),
}

impl LockError {
    pub fn code(&self) -> &'static str {
        match self {
            LockError::Conflict { .. } => "SG_LOCK_CONFLICT",
            LockError::StaleVersion { .. } => "SG_LOCK_STALE_VERSION",
            LockError::NotFound { .. } => "SG_LOCK_NOT_FOUND",
            LockError::InvalidDuration(_) => "SG_LOCK_INVALID_DURATION",
            LockError::StorageError(_) => "SG_LOCK_STORAGE",
        }
    }

    /// Conflicts may clear once the other holder releases or the lock expires.
    pub fn is_transient(&self) -> bool {
        matches!(self, LockError::Conflict { .. })
    }

    pub(crate) fn poisoned() -> Self {
        LockError::StorageError("Lock poisoned".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_transient() {
        let conflict = LockError::Conflict {
            table_id: Uuid::nil(),
            holder: "bob".into(),
            kind: LockKind::Pessimistic,
            expires_at: Utc::now(),
        };
        assert!(conflict.is_transient());
        assert_eq!(conflict.code(), "SG_LOCK_CONFLICT");
        assert!(conflict.to_string().contains("bob"));

        assert!(!LockError::NotFound { table_id: Uuid::nil() }.is_transient());

        let stale = LockError::StaleVersion {
            table_id: Uuid::nil(),
            lock_version: 1,
            table_version: 3,
        };
        assert!(!stale.is_transient());
        assert_eq!(stale.code(), "SG_LOCK_STALE_VERSION");
        assert!(!LockError::poisoned().is_transient());
    }
}
