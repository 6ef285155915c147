//! Configuration parser for loading and merging configuration files.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, Result, VpcPlanError};
use crate::topology::Environment;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::PlannerConfig;

/// Variable selecting the target environment.
pub const ENV_ENVIRONMENT: &str = "ENV_NAME";
/// Variable holding the apex domain.
pub const ENV_DOMAIN_NAME: &str = "DOMAIN_NAME";
/// Variable holding the target account.
pub const ENV_ACCOUNT_ID: &str = "AWS_ACCOUNT_ID";
/// Variable overriding `system.name`.
pub const ENV_SYSTEM_NAME: &str = "VPCPLAN_SYSTEM_NAME";
/// Variable overriding `network.region`.
pub const ENV_REGION: &str = "VPCPLAN_REGION";
/// Variable overriding `state.bucket`.
pub const ENV_STATE_BUCKET: &str = "VPCPLAN_STATE_BUCKET";
/// Variable overriding `state.prefix`.
pub const ENV_STATE_PREFIX: &str = "VPCPLAN_STATE_PREFIX";

/// Configuration parser for loading planner configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PlannerConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(VpcPlanError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            VpcPlanError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<PlannerConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(PlannerConfig::default());
        }

        let config: PlannerConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            VpcPlanError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Successfully parsed configuration for system: {}", config.system.name);
        Ok(config)
    }

    /// Reads the `.env` file next to the configuration, if present.
    ///
    /// The process environment is left untouched; callers decide the
    /// precedence between the two sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be parsed.
    pub fn read_dotenv(&self) -> Result<HashMap<String, String>> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if !env_path.exists() {
            debug!(".env file not found at: {}", env_path.display());
            return Ok(HashMap::new());
        }

        info!("Loading environment from: {}", env_path.display());
        let dotenv_err = |e: dotenvy::Error| {
            VpcPlanError::Config(ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })
        };

        dotenvy::from_path_iter(&env_path)
            .map_err(dotenv_err)?
            .map(|item| item.map_err(dotenv_err))
            .collect()
    }
}

/// Resolves the target environment.
///
/// An explicit name wins; otherwise `ENV_NAME` is read through `lookup`.
/// With neither, the environment is development.
pub fn resolve_environment<F>(explicit: Option<&str>, lookup: F) -> Environment
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .or_else(|| lookup(ENV_ENVIRONMENT))
        .map_or_else(Environment::default, |name| Environment::resolve(&name))
}

/// Applies environment overrides read through `lookup`.
///
/// Empty values are ignored so that a blank line in `.env` does not erase a
/// configured value.
pub fn apply_env_overrides<F>(config: &mut PlannerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(name) = var(ENV_SYSTEM_NAME) {
        debug!("Overriding system.name from environment");
        config.system.name = name;
    }

    if let Some(domain) = var(ENV_DOMAIN_NAME) {
        debug!("Overriding system.domain from environment");
        config.system.domain = Some(domain);
    }

    if let Some(account) = var(ENV_ACCOUNT_ID) {
        debug!("Overriding system.account_id from environment");
        config.system.account_id = Some(account);
    }

    if let Some(region) = var(ENV_REGION) {
        debug!("Overriding network.region from environment");
        config.network.region = region;
    }

    // State overrides
    if let Some(bucket) = var(ENV_STATE_BUCKET) {
        debug!("Overriding state.bucket from environment");
        config.state.bucket = Some(bucket);
    }

    if let Some(prefix) = var(ENV_STATE_PREFIX) {
        debug!("Overriding state.prefix from environment");
        config.state.prefix = Some(prefix);
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["vpcplan.yaml", "vpcplan.yml"];

/// Finds the configuration file in the current directory or parent directories.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(VpcPlanError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateBackend;

    #[test]
    fn test_parse_empty_config() {
        let config = ConfigParser::new().parse_yaml("", None).expect("defaults");
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
system:
  name: todo-app
  domain: example.com

network:
  region: us-east-1
  zones: [a, b]
  create_protected_tier: true
  base_offsets:
    development: 128
    staging: 96
    production: 64

state:
  backend: s3
  bucket: vpcplan-state
  prefix: todo-app
";
        let config = ConfigParser::new().parse_yaml(yaml, None).expect("valid yaml");

        assert_eq!(config.system.domain.as_deref(), Some("example.com"));
        assert_eq!(config.network.region, "us-east-1");
        assert_eq!(config.network.zones.len(), 2);
        assert!(config.network.create_protected_tier);
        assert_eq!(config.network.base_offsets.map(|o| o.staging), Some(96));
        assert_eq!(config.state.backend, StateBackend::S3);
    }

    #[test]
    fn test_parse_rejects_bad_zone() {
        let yaml = "network:\n  zones: [a, 'B!']\n";
        let err = ConfigParser::new().parse_yaml(yaml, None).expect_err("bad zone");
        assert!(matches!(err, VpcPlanError::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_SYSTEM_NAME, "billing"),
            (ENV_DOMAIN_NAME, "billing.example.com"),
            (ENV_REGION, "eu-west-1"),
            (ENV_STATE_BUCKET, "plans"),
            (ENV_STATE_PREFIX, ""),
        ]);
        let mut config = PlannerConfig::default();
        apply_env_overrides(&mut config, |name| vars.get(name).map(ToString::to_string));

        assert_eq!(config.system.name, "billing");
        assert_eq!(config.system.domain.as_deref(), Some("billing.example.com"));
        assert_eq!(config.network.region, "eu-west-1");
        assert_eq!(config.state.bucket.as_deref(), Some("plans"));
        assert_eq!(config.state.prefix, None);
        assert_eq!(config.system.account_id, None);
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("infra").join("network");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join("vpcplan.yml"), "").expect("write");

        let found = find_config_file(&nested).expect("found");
        assert_eq!(found, dir.path().join("vpcplan.yml"));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ConfigParser::new()
            .load_file(dir.path().join("vpcplan.yaml"))
            .expect_err("missing");
        assert!(matches!(err, VpcPlanError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_dotenv_absent_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vars = ConfigParser::new()
            .with_base_path(dir.path())
            .read_dotenv()
            .expect("no .env");
        assert!(vars.is_empty());
    }

    #[test]
    fn test_read_dotenv_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(".env"),
            "# target\nENV_NAME=production\nDOMAIN_NAME=\"example.com\"\n",
        )
        .expect("write");

        let vars = ConfigParser::new()
            .with_base_path(dir.path())
            .read_dotenv()
            .expect(".env");
        assert_eq!(vars.get(ENV_ENVIRONMENT).map(String::as_str), Some("production"));
        assert_eq!(vars.get(ENV_DOMAIN_NAME).map(String::as_str), Some("example.com"));
    }

    #[test]
    fn test_resolve_environment_precedence() {
        let staging = |name: &str| (name == ENV_ENVIRONMENT).then(|| String::from("staging"));

        assert_eq!(resolve_environment(Some("production"), staging), Environment::Production);
        assert_eq!(resolve_environment(None, staging), Environment::Staging);
        assert_eq!(resolve_environment(None, |_| None), Environment::Development);
        assert_eq!(
            resolve_environment(None, |_| Some(String::from("qa"))),
            Environment::Development
        );
    }
}
