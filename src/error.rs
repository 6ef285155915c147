//! Error types for the vpcplan topology planner.
//!
//! This module provides the error hierarchy for every stage of a planning run:
//! configuration loading, topology computation, and plan-state persistence.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for vpcplan.
#[derive(Debug, Error)]
pub enum VpcPlanError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan state errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Topology planning errors.
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while computing a topology plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The planner inputs cannot produce a valid topology.
    #[error("Invalid topology input: {reason}")]
    InvalidTopologyInput {
        /// Why the input was rejected.
        reason: String,
    },

    /// An address block could not be parsed or constructed.
    #[error("Invalid address block '{value}': {reason}")]
    InvalidAddressBlock {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Plan state errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State file not found.
    #[error("State file not found: {path}")]
    NotFound {
        /// Path to the missing state file.
        path: PathBuf,
    },

    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// State lock acquisition failed.
    #[error("Failed to acquire state lock: {message}")]
    LockFailed {
        /// Description of the lock failure.
        message: String,
    },

    /// State lock is held by another process.
    #[error("State is locked by another process (lock holder: {holder}, since: {since})")]
    LockedByOther {
        /// Identifier of the lock holder.
        holder: String,
        /// When the lock was acquired.
        since: String,
    },

    /// Local filesystem backend error.
    #[error("Local state backend error: {message}")]
    LocalError {
        /// Description of the filesystem error.
        message: String,
    },

    /// S3 backend error.
    #[error("S3 state backend error: {message}")]
    S3Error {
        /// Description of the S3 error.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },
}

/// Result type alias for vpcplan operations.
pub type Result<T> = std::result::Result<T, VpcPlanError>;

impl VpcPlanError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl TopologyError {
    /// Creates an invalid-input error with the given reason.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidTopologyInput {
            reason: reason.into(),
        }
    }

    /// Creates an invalid address block error.
    #[must_use]
    pub fn invalid_block(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddressBlock {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl StateError {
    /// Creates a local backend error with the given message.
    #[must_use]
    pub fn local(message: impl Into<String>) -> Self {
        Self::LocalError {
            message: message.into(),
        }
    }

    /// Creates an S3 error with the given message.
    #[must_use]
    pub fn s3(message: impl Into<String>) -> Self {
        Self::S3Error {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_error_display() {
        let err = VpcPlanError::from(TopologyError::invalid_input("zone list is empty"));
        assert_eq!(
            err.to_string(),
            "Topology error: Invalid topology input: zone list is empty"
        );
    }
}
