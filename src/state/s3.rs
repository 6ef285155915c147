//! S3-based state storage backend.
//!
//! Keys are laid out as `<prefix>/<environment>/state.json`, mirroring the
//! local layout, so a team can share recorded plans through one bucket.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{Result, StateError, VpcPlanError};
use crate::topology::Environment;

use super::lock::{LockInfo, LOCK_EXPIRY_SECS};
use super::store::StateStore;
use super::types::PlanState;

/// State file key suffix.
const STATE_KEY: &str = "state.json";

/// Lock file key suffix.
const LOCK_KEY: &str = "state.lock";

/// S3-based state store.
#[derive(Debug)]
pub struct S3StateStore {
    /// S3 client.
    client: Client,
    /// Bucket name.
    bucket: String,
    /// Key prefix, ending with the environment and a slash.
    prefix: String,
}

impl S3StateStore {
    /// Creates a new S3 state store for `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error if the S3 client cannot be initialized.
    pub async fn new(
        bucket: &str,
        prefix: Option<&str>,
        region: Option<&str>,
        environment: Environment,
    ) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region_str) = region {
            loader = loader.region(Region::new(region_str.to_string()));
        }
        let config = loader.load().await;

        Ok(Self::with_client(
            Client::new(&config),
            bucket,
            prefix,
            environment,
        ))
    }

    /// Creates a new S3 state store with an existing client.
    #[must_use]
    pub fn with_client(
        client: Client,
        bucket: &str,
        prefix: Option<&str>,
        environment: Environment,
    ) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefix: key_prefix(prefix, environment),
        }
    }

    /// Gets the full S3 key for a file.
    fn key(&self, file: &str) -> String {
        format!("{}{file}", self.prefix)
    }

    /// Gets an object from S3.
    async fn get_object(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(response) => {
                let bytes = response.body.collect().await.map_err(|e| {
                    VpcPlanError::State(StateError::s3(format!("Failed to read S3 object: {e}")))
                })?;

                let content = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    VpcPlanError::State(StateError::Corrupted {
                        message: format!("Invalid UTF-8 in S3 object: {e}"),
                    })
                })?;

                Ok(Some(content))
            }
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(VpcPlanError::State(StateError::s3(format!(
                        "S3 get error: {service_err}"
                    ))))
                }
            }
        }
    }

    /// Puts an object to S3.
    async fn put_object(&self, key: &str, content: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(content.as_bytes().to_vec().into())
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| VpcPlanError::State(StateError::s3(format!("S3 put error: {e}"))))?;

        Ok(())
    }

    /// Puts an object only if `key` does not exist yet.
    ///
    /// Returns false if another writer got there first.
    async fn put_object_if_absent(&self, key: &str, content: &str) -> Result<bool> {
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(content.as_bytes().to_vec().into())
            .content_type("application/json")
            .if_none_match("*")
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(lost_conditional_write) => Ok(false),
            Err(e) => Err(VpcPlanError::State(StateError::s3(format!(
                "S3 conditional put error: {e}"
            )))),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| VpcPlanError::State(StateError::s3(format!("S3 delete error: {e}"))))?;

        Ok(())
    }

    async fn read_lock(&self) -> Result<Option<LockInfo>> {
        self.get_object(&self.key(LOCK_KEY))
            .await?
            .map(|content| LockInfo::from_json(&content))
            .transpose()
    }
}

/// Whether a conditional put failed because the object already existed.
fn lost_conditional_write(err: &PutObjectError) -> bool {
    matches!(
        err.code(),
        Some("PreconditionFailed" | "ConditionalRequestConflict")
    )
}

/// Builds the key prefix `<prefix>/<environment>/`.
fn key_prefix(prefix: Option<&str>, environment: Environment) -> String {
    let prefix = prefix.map(|p| p.trim_matches('/')).unwrap_or_default();
    if prefix.is_empty() {
        format!("{}/", environment.name())
    } else {
        format!("{prefix}/{}/", environment.name())
    }
}

#[async_trait]
impl StateStore for S3StateStore {
    async fn load(&self) -> Result<Option<PlanState>> {
        let key = self.key(STATE_KEY);
        debug!("Loading state from s3://{}/{key}", self.bucket);

        let Some(json) = self.get_object(&key).await? else {
            debug!("No state found in S3");
            return Ok(None);
        };

        let state: PlanState = serde_json::from_str(&json).map_err(|e| {
            VpcPlanError::State(StateError::Corrupted {
                message: format!("Failed to parse state: {e}"),
            })
        })?;
        state.check_version()?;

        info!("Loaded state for {}/{}", state.system, state.environment);
        Ok(Some(state))
    }

    async fn save(&self, state: &PlanState) -> Result<()> {
        let key = self.key(STATE_KEY);
        info!("Saving state to s3://{}/{key}", self.bucket);

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            VpcPlanError::State(StateError::serialization(format!(
                "Failed to serialize state: {e}"
            )))
        })?;

        self.put_object(&key, &content).await?;

        debug!("State saved successfully to S3");
        Ok(())
    }

    async fn acquire_lock(&self, holder: &str) -> Result<LockInfo> {
        if let Some(existing) = self.read_lock().await? {
            if !existing.is_expired() {
                return Err(existing.conflict());
            }
            debug!("Taking over expired lock {}", existing.lock_id);
            self.release_lock(&existing.lock_id).await?;
        }

        let lock = LockInfo::new(holder);
        if !self.put_object_if_absent(&self.key(LOCK_KEY), &lock.to_json()?).await? {
            return Err(match self.read_lock().await {
                Ok(Some(winner)) => winner.conflict(),
                _ => VpcPlanError::State(StateError::LockFailed {
                    message: format!("{} was created concurrently", self.key(LOCK_KEY)),
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
        match self.read_lock().await? {
            Some(current) if current.lock_id == lock_id => {
                self.delete_object(&self.key(LOCK_KEY)).await?;
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
        self.read_lock().await
    }

    fn backend_type(&self) -> &'static str {
        "s3"
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key(STATE_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;

    fn put_error(code: &str) -> PutObjectError {
        PutObjectError::generic(ErrorMetadata::builder().code(code).build())
    }

    #[test]
    fn test_lost_conditional_write() {
        assert!(lost_conditional_write(&put_error("PreconditionFailed")));
        assert!(lost_conditional_write(&put_error("ConditionalRequestConflict")));
        assert!(!lost_conditional_write(&put_error("AccessDenied")));
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix(None, Environment::Development), "development/");
        assert_eq!(key_prefix(Some(""), Environment::Staging), "staging/");
        assert_eq!(
            key_prefix(Some("/todo-app/network/"), Environment::Production),
            "todo-app/network/production/"
        );
    }
}
