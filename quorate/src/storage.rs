use super::*;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// Well-known name of the committed config.
pub const CONFIG_SPACE: &str = "local.system.replset";

/// Well-known name of the operation log.
pub const OPERATION_LOG: &str = "local.oplog.rs";

/// Durable state of the replica group on this node.
#[async_trait]
pub trait ReplStore: Sync + Send + 'static {
    /// True unless the operation log holds at least one entry.
    async fn is_operation_log_empty(&self) -> anyhow::Result<bool>;

    /// Create the operation log with its initiation marker as the first entry.
    /// Afterwards `is_operation_log_empty` returns false.
    async fn create_operation_log(&self) -> anyhow::Result<()>;

    /// Durably replace the committed config.
    async fn save_config(&self, config: &GroupConfig) -> anyhow::Result<()>;

    async fn load_config(&self) -> anyhow::Result<Option<GroupConfig>>;
}

/// The exclusive write lock of the node.
/// Acquisition is always bounded so a busy node rejects instead of hanging.
#[derive(Clone, Default)]
pub struct WriteLock(Arc<RwLock<()>>);

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if the lock could not be taken within `bound`.
    pub async fn acquire(&self, bound: Duration) -> Option<OwnedRwLockWriteGuard<()>> {
        tokio::time::timeout(bound, self.0.clone().write_owned())
            .await
            .ok()
    }
}
