//! Plan state module.
//!
//! This module persists the last recorded plan of each environment, with an
//! advisory lock and a bounded history, in a local directory or an S3 bucket.

mod store;
mod local;
mod s3;
mod lock;
mod types;

pub use store::StateStore;
pub use local::{LocalStateStore, STATE_DIR};
pub use s3::S3StateStore;
pub use lock::{generate_holder_id, LockInfo, LOCK_EXPIRY_SECS};
pub use types::{PlanHistoryEntry, PlanOperation, PlanState, MAX_HISTORY, STATE_VERSION};
