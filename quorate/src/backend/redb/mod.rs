use crate::backend::InitiationMarker;
use crate::storage::{ReplStore, CONFIG_SPACE, OPERATION_LOG};
use crate::GroupConfig;

use ::redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use anyhow::{ensure, Result};
use async_trait::async_trait;
use std::sync::Arc;

mod value {
    use crate::{GroupConfig, HostAndPort, MemberConfig};
    use anyhow::Result;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize)]
    struct OnDiskMember {
        id: u32,
        host: HostAndPort,
        votes: u32,
        priority: f64,
        arbiter_only: bool,
        hidden: bool,
    }

    #[derive(Deserialize, Serialize)]
    struct OnDiskStruct {
        id: String,
        version: u64,
        members: Vec<OnDiskMember>,
    }

    pub fn ser(x: &GroupConfig) -> Result<Vec<u8>> {
        let x = OnDiskStruct {
            id: x.id().to_owned(),
            version: x.version(),
            members: x
                .members()
                .iter()
                .map(|m| OnDiskMember {
                    id: m.id,
                    host: m.host.clone(),
                    votes: m.votes,
                    priority: m.priority,
                    arbiter_only: m.arbiter_only,
                    hidden: m.hidden,
                })
                .collect(),
        };
        let bin = bincode::serialize(&x)?;
        Ok(bin)
    }

    /// A stored config is validated again on the way out.
    pub fn desr(bin: &[u8]) -> Result<GroupConfig> {
        let x: OnDiskStruct = bincode::deserialize(bin)?;
        let members = x
            .members
            .into_iter()
            .map(|m| MemberConfig {
                id: m.id,
                host: m.host,
                votes: m.votes,
                priority: m.priority,
                arbiter_only: m.arbiter_only,
                hidden: m.hidden,
            })
            .collect();
        let config = GroupConfig::new(x.id, x.version, members)?;
        Ok(config)
    }
}

fn config_table() -> TableDefinition<'static, (), Vec<u8>> {
    TableDefinition::new(CONFIG_SPACE)
}

fn oplog_table() -> TableDefinition<'static, u64, Vec<u8>> {
    TableDefinition::new(OPERATION_LOG)
}

pub struct Backend {
    db: Arc<Database>,
}

impl Backend {
    pub fn new(db: Database) -> Result<Self> {
        // Create the tables if not exist.
        let tx = db.begin_write()?;
        {
            tx.open_table(config_table())?;
            tx.open_table(oplog_table())?;
        }
        tx.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl ReplStore for Backend {
    async fn is_operation_log_empty(&self) -> Result<bool> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(oplog_table())?;
        Ok(tbl.is_empty()?)
    }

    async fn create_operation_log(&self) -> Result<()> {
        let marker = InitiationMarker::now().serialize()?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(oplog_table())?;
            ensure!(tbl.is_empty()?, "{OPERATION_LOG} already exists");
            tbl.insert(1, marker)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn save_config(&self, config: &GroupConfig) -> Result<()> {
        let bin = value::ser(config)?;
        let tx = self.db.begin_write()?;
        {
            let mut tbl = tx.open_table(config_table())?;
            tbl.insert((), bin)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn load_config(&self) -> Result<Option<GroupConfig>> {
        let tx = self.db.begin_read()?;
        let tbl = tx.open_table(config_table())?;
        match tbl.get(())? {
            Some(bin) => Ok(Some(value::desr(&bin.value())?)),
            None => Ok(None),
        }
    }
}
