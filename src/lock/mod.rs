//! Collaborative table locking
//!
//! # Design Principles
//!
//! - Conflict check and insert are one atomic store operation
//! - Expiry is evaluated lazily against the current time
//! - Tokens are returned once and stored only as hashes
//! - Optimistic locks are shared; pessimistic locks are exclusive

mod errors;
mod manager;
mod store;
mod token;
mod types;

pub use errors::{LockError, LockResult};
pub use manager::{LockConfig, LockManager};
pub use store::{check_conflict, InMemoryLockStore, Inserted, LockStore};
pub use token::{generate_token, hash_token};
pub use types::{LockGrant, LockKind, LockRequest, LockStatus, TableLock};
