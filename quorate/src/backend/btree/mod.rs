use crate::backend::InitiationMarker;
use crate::storage::{ReplStore, OPERATION_LOG};
use crate::GroupConfig;

use anyhow::{ensure, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    oplog: BTreeMap<u64, Bytes>,
    config: Option<GroupConfig>,
}

/// In-memory `ReplStore`. Clones share the same state.
#[derive(Clone, Default)]
pub struct Backend {
    inner: Arc<spin::Mutex<Inner>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary entry to the operation log.
    pub fn append_operation(&self, entry: Bytes) {
        let mut inner = self.inner.lock();
        let next = inner.oplog.last_key_value().map(|(k, _)| k + 1).unwrap_or(1);
        inner.oplog.insert(next, entry);
    }

    pub fn operation_log_len(&self) -> usize {
        self.inner.lock().oplog.len()
    }
}

#[async_trait]
impl ReplStore for Backend {
    async fn is_operation_log_empty(&self) -> Result<bool> {
        Ok(self.inner.lock().oplog.is_empty())
    }

    async fn create_operation_log(&self) -> Result<()> {
        let marker = InitiationMarker::now().serialize()?;
        let mut inner = self.inner.lock();
        ensure!(inner.oplog.is_empty(), "{OPERATION_LOG} already exists");
        inner.oplog.insert(1, marker.into());
        Ok(())
    }

    async fn save_config(&self, config: &GroupConfig) -> Result<()> {
        self.inner.lock().config = Some(config.clone());
        Ok(())
    }

    async fn load_config(&self) -> Result<Option<GroupConfig>> {
        Ok(self.inner.lock().config.clone())
    }
}
