//! Lock records

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Shared; the writer re-checks the table version before committing
    Optimistic,
    /// Exclusive edit session
    Pessimistic,
}

impl LockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockKind::Optimistic => "optimistic",
            LockKind::Pessimistic => "pessimistic",
        }
    }

    /// Whether a lock of this kind is enough for work needing `required`
    pub fn satisfies(&self, required: LockKind) -> bool {
        match required {
            LockKind::Optimistic => true,
            LockKind::Pessimistic => *self == LockKind::Pessimistic,
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Active,
    Released,
    Expired,
}

/// A lock held on one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLock {
    pub id: Uuid,
    pub table_id: Uuid,
    pub project_id: Uuid,
    pub holder: String,

    /// SHA-256 of the token; the raw token only goes to the holder
    #[serde(skip_serializing, default)]
    pub token_hash: String,

    pub kind: LockKind,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub status: LockStatus,

    /// Table version the editor started from (optimistic locks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl TableLock {
    /// Active in storage and not yet past its expiry.
    ///
    /// Stored status alone is not trusted: a lock whose expiry has passed
    /// is inactive even while it still reads `Active`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LockStatus::Active && self.expires_at >= now
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LockStatus::Active && self.expires_at < now
    }

    /// Write-time version check for optimistic edits.
    ///
    /// Locks without a version marker confirm any version.
    pub fn confirms_version(&self, current: u64) -> bool {
        self.version.map_or(true, |v| v == current)
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        if self.is_active_at(now) {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

/// Parameters for acquiring a lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    pub table_id: Uuid,
    pub project_id: Uuid,
    pub holder: String,
    pub kind: LockKind,
    #[serde(default)]
    pub reason: Option<String>,
    /// Uses the configured default when absent
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub version: Option<u64>,
}

impl LockRequest {
    pub fn new(table_id: Uuid, project_id: Uuid, holder: impl Into<String>, kind: LockKind) -> Self {
        Self {
            table_id,
            project_id,
            holder: holder.into(),
            kind,
            reason: None,
            duration_secs: None,
            version: None,
        }
    }

    pub fn pessimistic(table_id: Uuid, project_id: Uuid, holder: impl Into<String>) -> Self {
        Self::new(table_id, project_id, holder, LockKind::Pessimistic)
    }

    pub fn optimistic(table_id: Uuid, project_id: Uuid, holder: impl Into<String>) -> Self {
        Self::new(table_id, project_id, holder, LockKind::Optimistic)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_secs = Some(duration.num_seconds());
        self
    }

    pub fn at_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }
}

/// A granted lock plus the raw token needed to release or renew it
#[derive(Debug, Clone, Serialize)]
pub struct LockGrant {
    pub lock: TableLock,
    pub token: String,
}
