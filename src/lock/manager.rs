//! Lock manager
//!
//! Table state machine: unlocked → held(kind, holder, expiry) → unlocked.
//! A lock leaves the held state on release or when an access observes
//! that its expiry has passed. Nothing sweeps expired locks in the
//! background.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::errors::{LockError, LockResult};
use super::store::LockStore;
use super::token::{generate_token, hash_token};
use super::types::{LockGrant, LockKind, LockRequest, LockStatus, TableLock};
use crate::config::EngineConfig;
use crate::observability::{log_event, Event, MetricsRegistry};

#[derive(Debug, Clone)]
pub struct LockConfig {
    pub default_duration: Duration,
    pub max_duration: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for LockConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            default_duration: config.default_lock_duration(),
            max_duration: config.max_lock_duration(),
        }
    }
}

pub struct LockManager<S: LockStore> {
    config: LockConfig,
    store: S,
    metrics: Arc<MetricsRegistry>,
}

impl<S: LockStore> LockManager<S> {
    pub fn new(config: LockConfig, store: S) -> Self {
        Self {
            config,
            store,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Shares a metrics registry with other components
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    fn resolve_duration(&self, secs: Option<i64>) -> LockResult<Duration> {
        let secs = secs.unwrap_or_else(|| self.config.default_duration.num_seconds());
        let max_secs = self.config.max_duration.num_seconds();

        // Bounds are checked on the raw seconds so an out-of-range request
        // never reaches chrono's constructor.
        if secs <= 0 {
            return Err(LockError::InvalidDuration(format!(
                "duration must be positive (got {}s)",
                secs
            )));
        }

        if secs > max_secs {
            return Err(LockError::InvalidDuration(format!(
                "duration {}s exceeds the maximum of {}s",
                secs, max_secs
            )));
        }

        Duration::try_seconds(secs)
            .ok_or_else(|| LockError::InvalidDuration(format!("duration {}s is out of range", secs)))
    }

    /// Acquire a lock on a table
    ///
    /// Returns the lock together with the raw token. Only the token's hash
    /// is stored.
    pub fn acquire(&self, request: LockRequest) -> LockResult<LockGrant> {
        self.acquire_at(request, Utc::now())
    }

    pub fn acquire_at(&self, request: LockRequest, now: DateTime<Utc>) -> LockResult<LockGrant> {
        let duration = self.resolve_duration(request.duration_secs)?;
        let token = generate_token();

        let lock = TableLock {
            id: Uuid::new_v4(),
            table_id: request.table_id,
            project_id: request.project_id,
            holder: request.holder,
            token_hash: hash_token(&token),
            kind: request.kind,
            acquired_at: now,
            expires_at: now + duration,
            reason: request.reason,
            status: LockStatus::Active,
            version: request.version,
            released_at: None,
        };
        let table_id = lock.table_id.to_string();
        let holder = lock.holder.clone();
        let kind = lock.kind;

        match self.store.insert_if_compatible(lock, now) {
            Ok(inserted) => {
                self.record_expired(&inserted.expired);
                self.metrics.increment_locks_acquired();
                log_event(
                    Event::LockAcquired,
                    &[
                        ("table_id", &table_id),
                        ("holder", &holder),
                        ("kind", kind.as_str()),
                        ("lock_id", &inserted.lock.id.to_string()),
                        ("expires_at", &inserted.lock.expires_at.to_rfc3339()),
                    ],
                );
                Ok(LockGrant {
                    lock: inserted.lock,
                    token,
                })
            }
            Err(err) => {
                if let LockError::Conflict { holder: current, .. } = &err {
                    self.metrics.increment_lock_conflicts();
                    log_event(
                        Event::LockConflict,
                        &[
                            ("table_id", &table_id),
                            ("holder", &holder),
                            ("kind", kind.as_str()),
                            ("held_by", current),
                        ],
                    );
                }
                Err(err)
            }
        }
    }

    /// Release a lock using the token returned by `acquire`
    pub fn release(&self, table_id: Uuid, token: &str) -> LockResult<TableLock> {
        self.release_at(table_id, token, Utc::now())
    }

    pub fn release_at(&self, table_id: Uuid, token: &str, now: DateTime<Utc>) -> LockResult<TableLock> {
        let lock = self.store.release(table_id, &hash_token(token), now)?;
        self.metrics.increment_locks_released();
        log_event(
            Event::LockReleased,
            &[
                ("table_id", &table_id.to_string()),
                ("holder", &lock.holder),
                ("lock_id", &lock.id.to_string()),
            ],
        );
        Ok(lock)
    }

    /// Extend an active lock so it expires `duration` from now
    pub fn renew(&self, table_id: Uuid, token: &str, duration: Option<Duration>) -> LockResult<TableLock> {
        self.renew_at(table_id, token, duration, Utc::now())
    }

    pub fn renew_at(
        &self,
        table_id: Uuid,
        token: &str,
        duration: Option<Duration>,
        now: DateTime<Utc>,
    ) -> LockResult<TableLock> {
        let duration = self.resolve_duration(duration.map(|d| d.num_seconds()))?;
        let lock = self
            .store
            .extend(table_id, &hash_token(token), now + duration, now)?;
        self.metrics.increment_locks_renewed();
        log_event(
            Event::LockRenewed,
            &[
                ("table_id", &table_id.to_string()),
                ("holder", &lock.holder),
                ("expires_at", &lock.expires_at.to_rfc3339()),
            ],
        );
        Ok(lock)
    }

    /// Moves the holder's optimistic version markers on the table to `version`
    pub fn restamp(&self, table_id: Uuid, holder: &str, version: u64) -> LockResult<usize> {
        self.store.restamp(table_id, holder, version, Utc::now())
    }

    /// Whether any active lock exists on the table
    pub fn is_locked(&self, table_id: Uuid) -> LockResult<bool> {
        self.is_locked_at(table_id, Utc::now())
    }

    pub fn is_locked_at(&self, table_id: Uuid, now: DateTime<Utc>) -> LockResult<bool> {
        Ok(!self.store.active_for_table(table_id, now)?.is_empty())
    }

    pub fn active_locks(&self, table_id: Uuid) -> LockResult<Vec<TableLock>> {
        self.store.active_for_table(table_id, Utc::now())
    }

    /// Active locks across a project
    pub fn list_active(&self, project_id: Uuid) -> LockResult<Vec<TableLock>> {
        self.list_active_at(project_id, Utc::now())
    }

    pub fn list_active_at(&self, project_id: Uuid, now: DateTime<Utc>) -> LockResult<Vec<TableLock>> {
        self.store.active_for_project(project_id, now)
    }

    /// The strongest active lock `holder` has on the table that satisfies `required`
    pub fn held_by_at(
        &self,
        table_id: Uuid,
        holder: &str,
        required: LockKind,
        now: DateTime<Utc>,
    ) -> LockResult<Option<TableLock>> {
        Ok(self
            .store
            .active_for_table(table_id, now)?
            .into_iter()
            .filter(|l| l.holder == holder && l.kind.satisfies(required))
            .max_by_key(|l| l.kind == LockKind::Pessimistic))
    }

    fn record_expired(&self, expired: &[TableLock]) {
        if expired.is_empty() {
            return;
        }
        self.metrics.add_locks_expired(expired.len() as u64);
        for lock in expired {
            log_event(
                Event::LockExpired,
                &[
                    ("table_id", &lock.table_id.to_string()),
                    ("holder", &lock.holder),
                    ("lock_id", &lock.id.to_string()),
                ],
            );
        }
    }
}
