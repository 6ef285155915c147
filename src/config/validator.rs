//! Configuration validation for planner inputs.
//!
//! This module checks a loaded configuration before any planning happens, so
//! that obviously broken inputs are reported with the offending field.

use crate::error::{ConfigError, Result, VpcPlanError};
use crate::topology::{vpc_block, Environment, VPC_PREFIX_LEN};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::spec::{BaseOffsets, NetworkConfig, PlannerConfig, StateBackend, StateConfig, SystemConfig};

/// Maximum length of a system name; it prefixes every export name.
const MAX_SYSTEM_NAME_LEN: usize = 32;

/// Validator for planner configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a planner configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &PlannerConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_system(&config.system, &mut result);
        Self::validate_network(&config.network, &mut result);
        Self::validate_state(&config.state, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(VpcPlanError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Validates system configuration.
    fn validate_system(system: &SystemConfig, result: &mut ValidationResult) {
        if system.name.is_empty() {
            result.error("system.name", "System name cannot be empty");
        } else if !is_valid_name(&system.name) {
            result.error(
                "system.name",
                format!(
                    "System name '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                    system.name
                ),
            );
        } else if system.name.len() > MAX_SYSTEM_NAME_LEN {
            result.error(
                "system.name",
                format!("System name must be at most {MAX_SYSTEM_NAME_LEN} characters"),
            );
        }

        if system.domain.as_ref().is_some_and(|d| !d.contains('.')) {
            result.warnings.push(String::from(
                "system.domain: Domain has no dot; it is probably not an apex domain",
            ));
        }
    }

    /// Validates network configuration.
    fn validate_network(network: &NetworkConfig, result: &mut ValidationResult) {
        if network.region.trim().is_empty() {
            result.error("network.region", "Region cannot be empty");
        }

        if network.zones.is_empty() {
            result.error("network.zones", "At least one availability zone is required");
        }

        let mut seen = HashSet::new();
        for (i, zone) in network.zones.iter().enumerate() {
            if !seen.insert(zone) {
                result.error(
                    format!("network.zones[{i}]"),
                    format!("Duplicate availability zone: {zone}"),
                );
            }
        }

        if let Some(offsets) = &network.base_offsets {
            Self::validate_base_offsets(offsets, result);
        }
    }

    /// Validates per-environment base offsets.
    fn validate_base_offsets(offsets: &BaseOffsets, result: &mut ValidationResult) {
        let entries = offsets.entries();

        for (env, offset) in entries {
            if vpc_block(offset).is_err() {
                result.error(
                    format!("network.base_offsets.{env}"),
                    format!("Base offset {offset} is not aligned to a /{VPC_PREFIX_LEN} boundary"),
                );
            }
        }

        for (i, (env, offset)) in entries.iter().enumerate() {
            let clash = entries[..i]
                .iter()
                .find(|(_, other)| other == offset)
                .map(|(other_env, _)| *other_env);
            if let Some(other_env) = clash {
                result.error(
                    format!("network.base_offsets.{env}"),
                    format!("Base offset {offset} is already used by {other_env}"),
                );
            }
        }

        if offsets.for_environment(Environment::Production) != Environment::Production.params().base_offset {
            result
                .warnings
                .push(String::from("network.base_offsets.production: Differs from the reference layout"));
        }
    }

    /// Validates state configuration.
    fn validate_state(state: &StateConfig, result: &mut ValidationResult) {
        match state.backend {
            StateBackend::S3 => {
                if state.bucket.as_ref().is_none_or(String::is_empty) {
                    result.error(
                        "state.bucket",
                        "S3 bucket name is required when using S3 backend",
                    );
                }
            }
            StateBackend::Local => {
                if state.bucket.is_some() {
                    result
                        .warnings
                        .push(String::from("state.bucket: Ignored by the local backend"));
                }
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Returns true if `name` is lowercase alphanumeric with inner hyphens.
fn is_valid_name(name: &str) -> bool {
    !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::AvailabilityZone;

    fn field_of(err: &VpcPlanError) -> Option<&str> {
        match err {
            VpcPlanError::Config(ConfigError::ValidationError { field, .. }) => field.as_deref(),
            _ => None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = ConfigValidator::new()
            .validate(&PlannerConfig::default())
            .expect("valid");
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_system_name() {
        let mut config = PlannerConfig::default();
        config.system.name = String::from("Todo_App");

        let err = ConfigValidator::new().validate(&config).expect_err("invalid");
        assert_eq!(field_of(&err), Some("system.name"));
    }

    #[test]
    fn test_duplicate_zone() {
        let mut config = PlannerConfig::default();
        config.network.zones = AvailabilityZone::parse_list("a,c,a").expect("zones");

        let err = ConfigValidator::new().validate(&config).expect_err("duplicate");
        assert_eq!(field_of(&err), Some("network.zones[2]"));
    }

    #[test]
    fn test_empty_zones() {
        let mut config = PlannerConfig::default();
        config.network.zones.clear();

        let err = ConfigValidator::new().validate(&config).expect_err("empty");
        assert_eq!(field_of(&err), Some("network.zones"));
    }

    #[test]
    fn test_base_offsets() {
        let mut config = PlannerConfig::default();
        config.network.base_offsets = Some(BaseOffsets {
            development: 64,
            staging: 40,
            production: 0,
        });
        let err = ConfigValidator::new().validate(&config).expect_err("misaligned");
        assert_eq!(field_of(&err), Some("network.base_offsets.staging"));

        config.network.base_offsets = Some(BaseOffsets {
            development: 64,
            staging: 64,
            production: 0,
        });
        let err = ConfigValidator::new().validate(&config).expect_err("clash");
        assert_eq!(field_of(&err), Some("network.base_offsets.staging"));

        config.network.base_offsets = Some(BaseOffsets {
            development: 128,
            staging: 96,
            production: 64,
        });
        let result = ConfigValidator::new().validate(&config).expect("valid");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let mut config = PlannerConfig::default();
        config.state.backend = StateBackend::S3;

        let err = ConfigValidator::new().validate(&config).expect_err("bucket");
        assert_eq!(field_of(&err), Some("state.bucket"));

        config.state.bucket = Some(String::from("plans"));
        assert!(ConfigValidator::new().validate(&config).is_ok());
    }
}
