//! State store trait definition.
//!
//! This module defines the common interface for plan state backends.

use async_trait::async_trait;

use crate::error::Result;
use super::lock::LockInfo;
use super::types::PlanState;

/// Trait for plan state storage backends.
///
/// A store is scoped to one system and environment.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the plan state.
    ///
    /// Returns `None` if no state exists yet.
    async fn load(&self) -> Result<Option<PlanState>>;

    /// Saves the plan state.
    async fn save(&self, state: &PlanState) -> Result<()>;

    /// Acquires the state lock.
    ///
    /// Creating the lock is exclusive: of several concurrent callers at most
    /// one succeeds, the others get `StateError::LockedByOther`. An expired
    /// lock is taken over. An empty `holder` is replaced by an identifier
    /// for this process.
    async fn acquire_lock(&self, holder: &str) -> Result<LockInfo>;

    /// Releases the lock with `lock_id`.
    ///
    /// Returns false if the current lock has a different id.
    async fn release_lock(&self, lock_id: &str) -> Result<bool>;

    /// Gets the current lock, expired or not.
    async fn get_lock_info(&self) -> Result<Option<LockInfo>>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;

    /// Describes where the state lives, for messages.
    fn location(&self) -> String;
}
