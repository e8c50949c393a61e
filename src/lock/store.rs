//! Lock storage
//!
//! The store owns the compare-and-act step: stale-lock expiry, the
//! conflict check and the insert all happen under one write guard, so two
//! racing acquisitions for the same table can never both succeed.
//!
//! Only live records are kept. Released locks are removed on release and
//! stale ones are removed the next time their table is written.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{LockError, LockResult};
use super::token::constant_time_str_eq;
use super::types::{LockKind, LockStatus, TableLock};

/// Result of a successful insert
#[derive(Debug, Clone)]
pub struct Inserted {
    pub lock: TableLock,
    /// Stale locks on the same table expired and dropped by this call
    pub expired: Vec<TableLock>,
}

/// Persistence for table locks.
///
/// Implementations backed by a shared database must perform
/// `insert_if_compatible` as a single conditional write.
pub trait LockStore: Send + Sync {
    /// Expires stale locks on the table, then stores `lock` unless an
    /// active lock conflicts with it.
    fn insert_if_compatible(&self, lock: TableLock, now: DateTime<Utc>) -> LockResult<Inserted>;

    /// Marks the active lock matching `token_hash` as released
    fn release(&self, table_id: Uuid, token_hash: &str, now: DateTime<Utc>) -> LockResult<TableLock>;

    /// Moves the expiry of the active lock matching `token_hash`
    fn extend(
        &self,
        table_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> LockResult<TableLock>;

    /// Stamps `version` on the holder's active optimistic locks on the
    /// table that carry a version marker. Returns how many were stamped.
    fn restamp(&self, table_id: Uuid, holder: &str, version: u64, now: DateTime<Utc>) -> LockResult<usize>;

    fn active_for_table(&self, table_id: Uuid, now: DateTime<Utc>) -> LockResult<Vec<TableLock>>;

    fn active_for_project(&self, project_id: Uuid, now: DateTime<Utc>) -> LockResult<Vec<TableLock>>;
}

/// Checks a request of `kind` from `holder` against the active locks on a table.
///
/// - An active pessimistic lock blocks every other holder
/// - An active pessimistic lock blocks a second pessimistic lock, even from its own holder
/// - A pessimistic request is blocked by any other holder's active lock
pub fn check_conflict(active: &[TableLock], holder: &str, kind: LockKind) -> LockResult<()> {
    let blocking = active
        .iter()
        .filter(|existing| {
            let other_holder = existing.holder != holder;
            match (existing.kind, kind) {
                (LockKind::Pessimistic, LockKind::Pessimistic) => true,
                (LockKind::Pessimistic, LockKind::Optimistic) => other_holder,
                (LockKind::Optimistic, LockKind::Pessimistic) => other_holder,
                (LockKind::Optimistic, LockKind::Optimistic) => false,
            }
        })
        .max_by_key(|existing| existing.kind == LockKind::Pessimistic);

    match blocking {
        Some(existing) => Err(LockError::Conflict {
            table_id: existing.table_id,
            holder: existing.holder.clone(),
            kind: existing.kind,
            expires_at: existing.expires_at,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    locks: RwLock<Vec<TableLock>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, including stale ones not yet dropped
    pub fn all(&self) -> LockResult<Vec<TableLock>> {
        let locks = self.locks.read().map_err(|_| LockError::poisoned())?;
        Ok(locks.clone())
    }
}

fn expire_stale(locks: &mut Vec<TableLock>, table_id: Uuid, now: DateTime<Utc>) -> Vec<TableLock> {
    let (stale, live): (Vec<TableLock>, Vec<TableLock>) = std::mem::take(locks)
        .into_iter()
        .partition(|l| l.table_id == table_id && l.is_stale_at(now));
    *locks = live;

    stale
        .into_iter()
        .map(|mut lock| {
            lock.status = LockStatus::Expired;
            lock
        })
        .collect()
}

fn position_by_token(locks: &[TableLock], table_id: Uuid, token_hash: &str) -> Option<usize> {
    locks.iter().position(|l| {
        l.table_id == table_id
            && l.status == LockStatus::Active
            && constant_time_str_eq(&l.token_hash, token_hash)
    })
}

impl LockStore for InMemoryLockStore {
    fn insert_if_compatible(&self, lock: TableLock, now: DateTime<Utc>) -> LockResult<Inserted> {
        let mut locks = self.locks.write().map_err(|_| LockError::poisoned())?;

        let expired = expire_stale(&mut locks, lock.table_id, now);
        let active: Vec<TableLock> = locks
            .iter()
            .filter(|l| l.table_id == lock.table_id && l.is_active_at(now))
            .cloned()
            .collect();
        check_conflict(&active, &lock.holder, lock.kind)?;

        locks.push(lock.clone());
        Ok(Inserted { lock, expired })
    }

    fn release(&self, table_id: Uuid, token_hash: &str, now: DateTime<Utc>) -> LockResult<TableLock> {
        let mut locks = self.locks.write().map_err(|_| LockError::poisoned())?;
        expire_stale(&mut locks, table_id, now);

        let index = position_by_token(&locks, table_id, token_hash)
            .ok_or(LockError::NotFound { table_id })?;
        let mut lock = locks.remove(index);
        lock.status = LockStatus::Released;
        lock.released_at = Some(now);
        Ok(lock)
    }

    fn extend(
        &self,
        table_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> LockResult<TableLock> {
        let mut locks = self.locks.write().map_err(|_| LockError::poisoned())?;
        expire_stale(&mut locks, table_id, now);

        let index = position_by_token(&locks, table_id, token_hash)
            .ok_or(LockError::NotFound { table_id })?;
        locks[index].expires_at = expires_at;
        Ok(locks[index].clone())
    }

    fn restamp(&self, table_id: Uuid, holder: &str, version: u64, now: DateTime<Utc>) -> LockResult<usize> {
        let mut locks = self.locks.write().map_err(|_| LockError::poisoned())?;
        expire_stale(&mut locks, table_id, now);

        let mut stamped = 0;
        for lock in locks.iter_mut().filter(|l| {
            l.table_id == table_id
                && l.holder == holder
                && l.kind == LockKind::Optimistic
                && l.version.is_some()
        }) {
            lock.version = Some(version);
            stamped += 1;
        }
        Ok(stamped)
    }

    fn active_for_table(&self, table_id: Uuid, now: DateTime<Utc>) -> LockResult<Vec<TableLock>> {
        let locks = self.locks.read().map_err(|_| LockError::poisoned())?;
        Ok(locks
            .iter()
            .filter(|l| l.table_id == table_id && l.is_active_at(now))
            .cloned()
            .collect())
    }

    fn active_for_project(&self, project_id: Uuid, now: DateTime<Utc>) -> LockResult<Vec<TableLock>> {
        let locks = self.locks.read().map_err(|_| LockError::poisoned())?;
        Ok(locks
            .iter()
            .filter(|l| l.project_id == project_id && l.is_active_at(now))
            .cloned()
            .collect())
    }
}
