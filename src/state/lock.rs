//! Advisory locking for plan state.
//!
//! A lock is a small JSON document stored next to the state. It expires on
//! its own so a crashed run cannot block an environment indefinitely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, StateError, VpcPlanError};

/// Lock expiry duration in seconds.
pub const LOCK_EXPIRY_SECS: i64 = 300;

/// Information about a state lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Unique lock identifier.
    pub lock_id: String,
    /// Who holds the lock.
    pub holder: String,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
    /// When the lock expires.
    pub expires_at: DateTime<Utc>,
}

impl LockInfo {
    /// Creates a lock held by `holder`, or by this process if `holder` is empty.
    #[must_use]
    pub fn new(holder: &str) -> Self {
        let holder = if holder.is_empty() {
            generate_holder_id()
        } else {
            holder.to_string()
        };

        let now = Utc::now();
        Self {
            lock_id: Uuid::new_v4().to_string(),
            holder,
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(LOCK_EXPIRY_SECS),
        }
    }

    /// Checks if the lock has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Parses a stored lock document.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Corrupted` if `content` is not a lock.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            VpcPlanError::State(StateError::Corrupted {
                message: format!("Failed to parse lock: {e}"),
            })
        })
    }

    /// Serializes the lock document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            VpcPlanError::State(StateError::serialization(format!(
                "Failed to serialize lock: {e}"
            )))
        })
    }

    /// The error a caller gets when it finds this lock in place.
    #[must_use]
    pub fn conflict(&self) -> VpcPlanError {
        VpcPlanError::State(StateError::LockedByOther {
            holder: self.holder.clone(),
            since: self.acquired_at.to_rfc3339(),
        })
    }

    /// Returns the remaining time until expiry in seconds.
    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        let remaining = self.expires_at - Utc::now();
        remaining.num_seconds().max(0)
    }
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} held by {} since {}",
            self.lock_id,
            self.holder,
            self.acquired_at.to_rfc3339()
        )
    }
}

/// Generates a unique holder identifier for the current process.
#[must_use]
pub fn generate_holder_id() -> String {
    let hostname = hostname::get()
        .map_or_else(|_| String::from("unknown"), |h| h.to_string_lossy().to_string());

    let pid = std::process::id();
    let uuid = Uuid::new_v4().simple().to_string();

    format!("{hostname}-{pid}-{}", &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_creation() {
        let lock = LockInfo::new("ci-runner");
        assert_eq!(lock.holder, "ci-runner");
        assert!(!lock.is_expired());
        assert!(lock.remaining_secs() > LOCK_EXPIRY_SECS - 5);
    }

    #[test]
    fn test_empty_holder_uses_process_id() {
        let lock = LockInfo::new("");
        assert!(lock.holder.contains(&std::process::id().to_string()));
    }

    #[test]
    fn test_expired_lock() {
        let mut lock = LockInfo::new("ci-runner");
        lock.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(lock.is_expired());
        assert_eq!(lock.remaining_secs(), 0);
    }

    #[test]
    fn test_json_and_conflict() {
        let lock = LockInfo::new("ci-runner");
        let parsed = LockInfo::from_json(&lock.to_json().expect("json")).expect("parse");
        assert_eq!(parsed, lock);

        assert!(matches!(
            LockInfo::from_json("{}"),
            Err(VpcPlanError::State(StateError::Corrupted { .. }))
        ));
        assert!(matches!(
            lock.conflict(),
            VpcPlanError::State(StateError::LockedByOther { ref holder, .. }) if holder == "ci-runner"
        ));
    }

    #[test]
    fn test_holder_id_generation() {
        let id1 = generate_holder_id();
        let id2 = generate_holder_id();

        assert_ne!(id1, id2);
        assert!(id1.contains(&std::process::id().to_string()));
    }
}
