//! Deployment environments and their planning parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The environment a topology is planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment.
    #[default]
    Development,
    /// Staging environment.
    Staging,
    /// Production environment.
    Production,
}

/// Per-environment parameters consumed by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentParams {
    /// Third octet of the environment's `/19` VPC block.
    pub base_offset: u8,
    /// Whether certificate-issuance records apply to this environment.
    pub issuance_records: bool,
}

/// Reference base offsets, one `/19` (32 third-octet values) per environment.
const DEVELOPMENT_BASE_OFFSET: u8 = 64;
const STAGING_BASE_OFFSET: u8 = 32;
const PRODUCTION_BASE_OFFSET: u8 = 0;

impl Environment {
    /// All environments, in declaration order.
    pub const ALL: [Self; 3] = [Self::Development, Self::Staging, Self::Production];

    /// Resolves an environment name.
    ///
    /// Unknown or empty names resolve to [`Environment::Development`]; the
    /// fallback is logged so a typo in `ENV_NAME` is visible.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" => Self::Development,
            "staging" => Self::Staging,
            "production" => Self::Production,
            unknown => {
                warn!("Unrecognized environment '{unknown}', falling back to development");
                Self::Development
            }
        }
    }

    /// Returns the full environment name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Returns the short name used in resource tags.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Staging => "stg",
            Self::Production => "prod",
        }
    }

    /// Returns the reference planning parameters for this environment.
    #[must_use]
    pub const fn params(self) -> EnvironmentParams {
        match self {
            Self::Development => EnvironmentParams {
                base_offset: DEVELOPMENT_BASE_OFFSET,
                issuance_records: false,
            },
            Self::Staging => EnvironmentParams {
                base_offset: STAGING_BASE_OFFSET,
                issuance_records: false,
            },
            Self::Production => EnvironmentParams {
                base_offset: PRODUCTION_BASE_OFFSET,
                issuance_records: true,
            },
        }
    }
}

impl EnvironmentParams {
    /// Returns a copy of these parameters with a different base offset.
    #[must_use]
    pub const fn with_base_offset(mut self, base_offset: u8) -> Self {
        self.base_offset = base_offset;
        self
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        assert_eq!(Environment::resolve("development"), Environment::Development);
        assert_eq!(Environment::resolve("staging"), Environment::Staging);
        assert_eq!(Environment::resolve("production"), Environment::Production);
        assert_eq!(Environment::resolve("  Production "), Environment::Production);
    }

    #[test]
    fn test_resolve_falls_back_to_development() {
        assert_eq!(Environment::resolve(""), Environment::Development);
        assert_eq!(Environment::resolve("prod"), Environment::Development);
        assert_eq!(Environment::resolve("qa"), Environment::Development);
    }

    #[test]
    fn test_reference_offsets_are_one_block_apart() {
        let dev = Environment::Development.params().base_offset;
        let stg = Environment::Staging.params().base_offset;
        let prod = Environment::Production.params().base_offset;
        assert_eq!((dev, stg, prod), (64, 32, 0));
        assert_eq!(dev - stg, 32);
        assert_eq!(stg - prod, 32);
    }

    #[test]
    fn test_issuance_records_only_in_production() {
        for env in Environment::ALL {
            assert_eq!(
                env.params().issuance_records,
                env == Environment::Production
            );
        }
    }

    #[test]
    fn test_display_roundtrips_through_resolve() {
        for env in Environment::ALL {
            assert_eq!(Environment::resolve(&env.to_string()), env);
        }
    }
}
