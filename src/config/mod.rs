//! Configuration module for the planner.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `vpcplan.yaml`
//! - Applying `.env` and process environment overrides
//! - Locating the project and its target environment
//! - Validation of configuration values

mod spec;
mod parser;
mod project;
mod validator;

pub use spec::{
    BaseOffsets, NetworkConfig, PlannerConfig, StateBackend, StateConfig, SystemConfig,
    DEFAULT_REGION, DEFAULT_SYSTEM_NAME, DEFAULT_ZONES,
};
pub use parser::{
    apply_env_overrides, find_config_file, resolve_environment, ConfigParser,
    DEFAULT_CONFIG_FILES, ENV_ACCOUNT_ID, ENV_DOMAIN_NAME, ENV_ENVIRONMENT, ENV_REGION,
    ENV_STATE_BUCKET, ENV_STATE_PREFIX, ENV_SYSTEM_NAME,
};
pub use project::Project;
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
