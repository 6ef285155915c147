//! Configuration types for the planner.
//!
//! This module defines the structs that map to the `vpcplan.yaml` file.
//! Every section has defaults, so an empty file describes the reference
//! system: `todo-app` in `ap-northeast-1` over zones `a`, `c` and `d`.

use serde::{Deserialize, Serialize};

use crate::topology::{AvailabilityZone, Environment, EnvironmentParams};

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannerConfig {
    /// System-level configuration.
    #[serde(default)]
    pub system: SystemConfig,
    /// Network layout inputs.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Plan state backend configuration.
    #[serde(default)]
    pub state: StateConfig,
}

/// System-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemConfig {
    /// System name, used as the prefix of every tag and export.
    #[serde(default = "default_system_name")]
    pub name: String,
    /// Apex domain of the system.
    #[serde(default)]
    pub domain: Option<String>,
    /// Target account identifier.
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Network layout inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Region the zones belong to.
    #[serde(default = "default_region")]
    pub region: String,
    /// Zone suffixes, in planning order.
    #[serde(default = "default_zones")]
    pub zones: Vec<AvailabilityZone>,
    /// Whether to plan the NAT-routed protected tier.
    #[serde(default)]
    pub create_protected_tier: bool,
    /// Per-environment base offsets replacing the reference ones.
    #[serde(default)]
    pub base_offsets: Option<BaseOffsets>,
}

/// Third octet of each environment's VPC block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseOffsets {
    /// Development base offset.
    pub development: u8,
    /// Staging base offset.
    pub staging: u8,
    /// Production base offset.
    pub production: u8,
}

/// State backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    /// Backend type (local or s3).
    #[serde(default)]
    pub backend: StateBackend,
    /// S3 bucket name (required for s3 backend).
    #[serde(default)]
    pub bucket: Option<String>,
    /// S3 key prefix (optional).
    #[serde(default)]
    pub prefix: Option<String>,
    /// S3 region (optional, uses the network region if not specified).
    #[serde(default)]
    pub region: Option<String>,
    /// Local state directory (for local backend).
    #[serde(default)]
    pub path: Option<String>,
}

/// State backend types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// Local file-based state storage.
    #[default]
    Local,
    /// AWS S3-based state storage.
    S3,
}

/// Default system name.
pub const DEFAULT_SYSTEM_NAME: &str = "todo-app";

/// Default region.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Default zone suffixes.
pub const DEFAULT_ZONES: [&str; 3] = ["a", "c", "d"];

fn default_system_name() -> String {
    String::from(DEFAULT_SYSTEM_NAME)
}

fn default_region() -> String {
    String::from(DEFAULT_REGION)
}

fn default_zones() -> Vec<AvailabilityZone> {
    DEFAULT_ZONES
        .iter()
        .filter_map(|z| AvailabilityZone::new(*z).ok())
        .collect()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: default_system_name(),
            domain: None,
            account_id: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            zones: default_zones(),
            create_protected_tier: false,
            base_offsets: None,
        }
    }
}

impl BaseOffsets {
    /// Returns the offset configured for `environment`.
    #[must_use]
    pub const fn for_environment(&self, environment: Environment) -> u8 {
        match environment {
            Environment::Development => self.development,
            Environment::Staging => self.staging,
            Environment::Production => self.production,
        }
    }

    /// Returns the offsets as (environment, offset) pairs.
    #[must_use]
    pub fn entries(&self) -> [(Environment, u8); 3] {
        Environment::ALL.map(|env| (env, self.for_environment(env)))
    }
}

impl PlannerConfig {
    /// Returns the planning parameters for `environment`, applying any
    /// configured base offset.
    #[must_use]
    pub fn environment_params(&self, environment: Environment) -> EnvironmentParams {
        let params = environment.params();
        self.network
            .base_offsets
            .map_or(params, |offsets| {
                params.with_base_offset(offsets.for_environment(environment))
            })
    }
}
