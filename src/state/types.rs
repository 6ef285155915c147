//! State types for tracking recorded plans.
//!
//! A plan state holds the last plan recorded for one system and environment,
//! so later runs can diff against it, plus a bounded operation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StateError;
use crate::topology::{Environment, TopologyPlan};

/// Current version of the state format.
pub const STATE_VERSION: &str = "1.0";

/// Maximum number of history entries kept.
pub const MAX_HISTORY: usize = 100;

/// The recorded plan state of one environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanState {
    /// State format version.
    pub version: String,
    /// System name.
    pub system: String,
    /// Environment the plan belongs to.
    pub environment: Environment,
    /// Fingerprint of the recorded plan, empty when nothing is recorded.
    #[serde(default)]
    pub fingerprint: String,
    /// The recorded plan.
    #[serde(default)]
    pub plan: Option<TopologyPlan>,
    /// When the state was last updated.
    pub recorded_at: DateTime<Utc>,
    /// Operation history (recent entries).
    #[serde(default)]
    pub history: Vec<PlanHistoryEntry>,
}

/// A single entry in the plan history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHistoryEntry {
    /// When the operation occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of operation.
    pub operation: PlanOperation,
    /// Fingerprint involved in the operation.
    pub fingerprint: String,
    /// Number of subnets in the plan involved.
    #[serde(default)]
    pub subnets: usize,
}

/// Types of state operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanOperation {
    /// A plan was recorded.
    Record,
    /// The recorded plan was discarded.
    Discard,
}

impl PlanState {
    /// Creates a new empty state.
    #[must_use]
    pub fn new(system: &str, environment: Environment) -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            system: system.to_string(),
            environment,
            fingerprint: String::new(),
            plan: None,
            recorded_at: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Records `plan` as the current plan.
    ///
    /// Returns false, leaving the state untouched, if the same fingerprint is
    /// already recorded.
    pub fn record(&mut self, plan: TopologyPlan, fingerprint: &str) -> bool {
        if self.plan.is_some() && self.fingerprint == fingerprint {
            return false;
        }

        self.add_history(PlanHistoryEntry::new(
            PlanOperation::Record,
            fingerprint,
            plan.subnet_count(),
        ));
        self.fingerprint = fingerprint.to_string();
        self.plan = Some(plan);
        self.recorded_at = Utc::now();
        true
    }

    /// Discards the recorded plan, keeping the history.
    ///
    /// Returns the discarded plan, if any.
    pub fn discard(&mut self) -> Option<TopologyPlan> {
        let plan = self.plan.take()?;

        self.add_history(PlanHistoryEntry::new(
            PlanOperation::Discard,
            &self.fingerprint,
            plan.subnet_count(),
        ));
        self.fingerprint.clear();
        self.recorded_at = Utc::now();
        Some(plan)
    }

    /// Adds a history entry, dropping the oldest beyond [`MAX_HISTORY`].
    pub fn add_history(&mut self, entry: PlanHistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(entry);
    }

    /// Returns the most recent history entry.
    #[must_use]
    pub fn last_entry(&self) -> Option<&PlanHistoryEntry> {
        self.history.last()
    }

    /// Checks that the state was written in a readable format version.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::VersionMismatch`] if the major version differs.
    pub fn check_version(&self) -> Result<(), StateError> {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        if major(&self.version) == major(STATE_VERSION) {
            Ok(())
        } else {
            Err(StateError::VersionMismatch {
                expected: STATE_VERSION.to_string(),
                found: self.version.clone(),
            })
        }
    }
}

impl PlanHistoryEntry {
    /// Creates a new history entry.
    #[must_use]
    pub fn new(operation: PlanOperation, fingerprint: &str, subnets: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            fingerprint: fingerprint.to_string(),
            subnets,
        }
    }
}

impl fmt::Display for PlanOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Record => "record",
            Self::Discard => "discard",
        };
        write!(f, "{op}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{plan, AvailabilityZone};

    fn sample_plan(protected: bool) -> TopologyPlan {
        let zones = AvailabilityZone::parse_list("a,c,d").expect("zones");
        plan(Environment::Development, &zones, protected).expect("plan")
    }

    #[test]
    fn test_record_and_discard() {
        let mut state = PlanState::new("todo-app", Environment::Development);

        assert!(state.record(sample_plan(false), "fp-1"));
        assert!(!state.record(sample_plan(false), "fp-1"));
        assert!(state.record(sample_plan(true), "fp-2"));
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.fingerprint, "fp-2");

        let discarded = state.discard().expect("recorded plan");
        assert_eq!(discarded.subnet_count(), 9);
        assert!(state.plan.is_none());
        assert!(state.fingerprint.is_empty());
        assert_eq!(
            state.last_entry().map(|e| e.operation),
            Some(PlanOperation::Discard)
        );
        assert!(state.discard().is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut state = PlanState::new("todo-app", Environment::Staging);
        for i in 0..(MAX_HISTORY + 5) {
            state.add_history(PlanHistoryEntry::new(PlanOperation::Record, &i.to_string(), 6));
        }

        assert_eq!(state.history.len(), MAX_HISTORY);
        assert_eq!(state.history[0].fingerprint, "5");
    }

    #[test]
    fn test_version_check() {
        let mut state = PlanState::new("todo-app", Environment::Production);
        assert!(state.check_version().is_ok());

        state.version = String::from("1.3");
        assert!(state.check_version().is_ok());

        state.version = String::from("2.0");
        assert!(matches!(
            state.check_version(),
            Err(StateError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_state_json_round_trip_keeps_plan() {
        let mut state = PlanState::new("todo-app", Environment::Development);
        state.record(sample_plan(true), "fp");

        let json = serde_json::to_string(&state).expect("serialize");
        let loaded: PlanState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loaded.plan, state.plan);
        assert_eq!(loaded.environment, Environment::Development);
    }
}
