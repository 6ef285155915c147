//! Project loading.
//!
//! Locates `vpcplan.yaml`, layers `.env` and the process environment on top
//! of it and settles the target environment once all sources are known.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ConfigError, Result, VpcPlanError};
use crate::state::STATE_DIR;
use crate::topology::Environment;

use super::parser::{apply_env_overrides, find_config_file, resolve_environment, ConfigParser};
use super::spec::PlannerConfig;
use super::validator::ConfigValidator;

/// A validated configuration and the environment it is planned for.
#[derive(Debug)]
pub struct Project {
    /// Validated configuration with overrides applied.
    pub config: PlannerConfig,
    /// Configuration file, if one was found.
    pub config_file: Option<PathBuf>,
    /// Directory the project is rooted at.
    pub base_dir: PathBuf,
    /// Target environment.
    pub environment: Environment,
    /// Validation warnings.
    pub warnings: Vec<String>,
}

impl Project {
    /// Loads the project from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or is invalid.
    pub fn load(config_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| VpcPlanError::internal(format!("Cannot determine current directory: {e}")))?;

        Self::load_with(config_path, &cwd, environment, |name| std::env::var(name).ok())
    }

    /// Loads the project starting the config search at `start_dir`.
    ///
    /// Variables are looked up in `process_env` first and in the project's
    /// `.env` second. Without an explicit `config_path` and with no config
    /// file found, the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or is invalid.
    pub fn load_with<F>(
        config_path: Option<&Path>,
        start_dir: &Path,
        environment: Option<&str>,
        process_env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_file = match config_path {
            Some(path) => Some(start_dir.join(path)),
            None => match find_config_file(start_dir) {
                Ok(path) => Some(path),
                Err(VpcPlanError::Config(ConfigError::FileNotFound { .. })) => {
                    info!("No configuration file found, using defaults");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        let base_dir = config_file
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| start_dir.to_path_buf(), Path::to_path_buf);

        let parser = ConfigParser::new().with_base_path(&base_dir);
        let dotenv = parser.read_dotenv()?;
        let lookup = |name: &str| process_env(name).or_else(|| dotenv.get(name).cloned());

        let mut config = match &config_file {
            Some(path) => parser.load_file(path)?,
            None => PlannerConfig::default(),
        };
        apply_env_overrides(&mut config, &lookup);

        let environment = resolve_environment(environment, &lookup);
        let result = ConfigValidator::new().validate(&config)?;

        if config.environment_params(environment).issuance_records && config.system.domain.is_none() {
            warn!("No domain configured for {environment}; certificate issuance records will be missing");
        }

        Ok(Self {
            config,
            config_file,
            base_dir,
            environment,
            warnings: result.warnings,
        })
    }

    /// Root directory of the local state backend.
    ///
    /// A relative `state.path` is taken from the project directory, not the
    /// working directory.
    #[must_use]
    pub fn state_root(&self) -> PathBuf {
        self.config
            .state
            .path
            .as_ref()
            .map_or_else(|| self.base_dir.join(STATE_DIR), |path| self.base_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");

        let project = Project::load_with(None, dir.path(), None, no_env).expect("defaults");

        assert!(project.config_file.is_none());
        assert_eq!(project.config, PlannerConfig::default());
        assert_eq!(project.base_dir, dir.path());
        assert_eq!(project.environment, Environment::Development);
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = TempDir::new().expect("tempdir");

        let err = Project::load_with(Some(Path::new("other.yaml")), dir.path(), None, no_env)
            .expect_err("missing file");
        assert!(matches!(err, VpcPlanError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_environment_from_dotenv() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("vpcplan.yaml"), "").expect("config");
        std::fs::write(dir.path().join(".env"), "ENV_NAME=production\n").expect(".env");

        let project = Project::load_with(None, dir.path(), None, no_env).expect("project");
        assert_eq!(project.environment, Environment::Production);

        let explicit =
            Project::load_with(None, dir.path(), Some("staging"), no_env).expect("project");
        assert_eq!(explicit.environment, Environment::Staging);
    }

    #[test]
    fn test_process_env_wins_over_dotenv() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(".env"),
            "ENV_NAME=production\nVPCPLAN_REGION=us-west-2\n",
        )
        .expect(".env");

        let process = |name: &str| (name == "ENV_NAME").then(|| String::from("staging"));
        let project = Project::load_with(None, dir.path(), None, process).expect("project");

        assert_eq!(project.environment, Environment::Staging);
        assert_eq!(project.config.network.region, "us-west-2");
    }

    #[test]
    fn test_config_found_from_subdirectory() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("infra");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(
            dir.path().join("vpcplan.yaml"),
            "state:\n  path: build/plans\n",
        )
        .expect("config");

        let project = Project::load_with(None, &nested, None, no_env).expect("project");

        assert_eq!(project.base_dir, dir.path());
        assert_eq!(project.state_root(), dir.path().join("build").join("plans"));
    }

    #[test]
    fn test_default_state_root() {
        let dir = TempDir::new().expect("tempdir");
        let project = Project::load_with(None, dir.path(), None, no_env).expect("project");
        assert_eq!(project.state_root(), dir.path().join(STATE_DIR));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("vpcplan.yaml"), "network:\n  zones: []\n").expect("config");

        let err = Project::load_with(None, dir.path(), None, no_env).expect_err("invalid");
        assert!(matches!(err, VpcPlanError::Config(ConfigError::ValidationError { .. })));
    }
}
