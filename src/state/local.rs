//! Local file-based state storage backend.
//!
//! State lives under `.vpcplan/<environment>/`, one directory per
//! environment, so the three environments never share a file or a lock.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, StateError, VpcPlanError};
use crate::topology::Environment;

use super::lock::{LockInfo, LOCK_EXPIRY_SECS};
use super::store::StateStore;
use super::types::PlanState;

/// Default state directory name.
pub const STATE_DIR: &str = ".vpcplan";

/// State file name.
const STATE_FILE: &str = "state.json";

/// Lock file name.
const LOCK_FILE: &str = "state.lock";

/// Local file-based state store.
#[derive(Debug)]
pub struct LocalStateStore {
    /// Directory holding this environment's files.
    env_dir: PathBuf,
    /// Path to the state file.
    state_path: PathBuf,
    /// Path to the lock file.
    lock_path: PathBuf,
}

impl LocalStateStore {
    /// Creates a store for `environment` under the state root `root`.
    #[must_use]
    pub fn with_root(root: impl AsRef<Path>, environment: Environment) -> Self {
        let env_dir = root.as_ref().join(environment.name());

        Self {
            state_path: env_dir.join(STATE_FILE),
            lock_path: env_dir.join(LOCK_FILE),
            env_dir,
        }
    }

    /// Returns the state file path.
    #[must_use]
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.env_dir).await.map_err(|e| {
            VpcPlanError::State(StateError::local(format!(
                "Failed to create {}: {e}",
                self.env_dir.display()
            )))
        })
    }

    /// Replaces the state file through a synced temporary file.
    async fn write_state(&self, content: &str) -> Result<()> {
        self.ensure_dir().await?;

        let temp_path = self.state_path.with_extension("json.tmp");
        let local_err = |what: &str, e: std::io::Error| {
            VpcPlanError::State(StateError::local(format!(
                "Failed to {what} {}: {e}",
                self.state_path.display()
            )))
        };

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| local_err("create temp file for", e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| local_err("write", e))?;
        file.sync_all().await.map_err(|e| local_err("sync", e))?;

        fs::rename(&temp_path, &self.state_path)
            .await
            .map_err(|e| local_err("rename temp file to", e))
    }

    /// Creates the lock file, failing if one already exists.
    ///
    /// Returns false when another process created it first.
    async fn create_lock_file(&self, lock: &LockInfo) -> Result<bool> {
        let lock_err = |e: std::io::Error| {
            VpcPlanError::State(StateError::LockFailed {
                message: format!("{}: {e}", self.lock_path.display()),
            })
        };

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(lock_err(e)),
        };

        file.write_all(lock.to_json()?.as_bytes())
            .await
            .map_err(lock_err)?;
        file.sync_all().await.map_err(lock_err)?;

        Ok(true)
    }

    async fn read_lock_file(&self) -> Result<Option<LockInfo>> {
        match fs::read_to_string(&self.lock_path).await {
            Ok(content) => LockInfo::from_json(&content).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VpcPlanError::State(StateError::local(format!(
                "Failed to read {}: {e}",
                self.lock_path.display()
            )))),
        }
    }

    async fn remove_lock_file(&self) -> Result<()> {
        match fs::remove_file(&self.lock_path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(VpcPlanError::State(StateError::LockFailed {
                    message: format!("Failed to remove {}: {e}", self.lock_path.display()),
                }))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<Option<PlanState>> {
        let content = match fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state at {}", self.state_path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(VpcPlanError::State(StateError::Corrupted {
                    message: format!("Failed to read state file: {e}"),
                }));
            }
        };

        info!("Loaded state from: {}", self.state_path.display());
        let state: PlanState = serde_json::from_str(&content).map_err(|e| {
            VpcPlanError::State(StateError::Corrupted {
                message: format!("Failed to parse state file: {e}"),
            })
        })?;
        state.check_version()?;

        Ok(Some(state))
    }

    async fn save(&self, state: &PlanState) -> Result<()> {
        let content = serde_json::to_string_pretty(state).map_err(|e| {
            VpcPlanError::State(StateError::serialization(format!(
                "Failed to serialize state: {e}"
            )))
        })?;

        self.write_state(&content).await?;
        info!("Saved state to: {}", self.state_path.display());
        Ok(())
    }

    async fn acquire_lock(&self, holder: &str) -> Result<LockInfo> {
        self.ensure_dir().await?;

        if let Some(existing) = self.read_lock_file().await? {
            if !existing.is_expired() {
                return Err(existing.conflict());
            }
            debug!("Taking over expired lock {}", existing.lock_id);
            self.release_lock(&existing.lock_id).await?;
        }

        let lock = LockInfo::new(holder);
        if !self.create_lock_file(&lock).await? {
            // Lost the race to a concurrent run.
            return Err(match self.read_lock_file().await {
                Ok(Some(winner)) => winner.conflict(),
                _ => VpcPlanError::State(StateError::LockFailed {
                    message: format!("{} was created concurrently", self.lock_path.display()),
                }),
            });
        }

        info!(
            "Acquired state lock: {} (expires in {}s)",
            lock.lock_id, LOCK_EXPIRY_SECS
        );
        Ok(lock)
    }

    async fn release_lock(&self, lock_id: &str) -> Result<bool> {
        match self.read_lock_file().await? {
            Some(current) if current.lock_id == lock_id => {
                self.remove_lock_file().await?;
                info!("Released state lock: {lock_id}");
                Ok(true)
            }
            Some(current) => {
                debug!("Lock {lock_id} is not current ({})", current.lock_id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn get_lock_info(&self) -> Result<Option<LockInfo>> {
        self.read_lock_file().await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }

    fn location(&self) -> String {
        self.state_path.display().to_string()
    }
}
