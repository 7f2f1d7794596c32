use super::*;

pub struct Effect<'a> {
    pub node: &'a ReplNode,
}

impl Effect<'_> {
    /// Make the accepted config durable.
    /// A failure here is not rolled back: on formation the operation log stays,
    /// so a retry is rejected by the precondition check until an operator steps in.
    pub async fn exec(self, config: &GroupConfig, mode: Mode) -> Result<(), Error> {
        let node = self.node;

        if mode == Mode::Formation {
            node.store
                .create_operation_log()
                .await
                .map_err(|source| Error::Commit {
                    stage: CommitStage::CreatingOperationLog,
                    source,
                })?;
        }

        let bound = node.options.lock_timeout();
        let _lk = node.write_lock.acquire(bound).await.ok_or_else(|| Error::Commit {
            stage: CommitStage::AcquiringLock,
            source: anyhow::anyhow!("timed out after {bound:?}"),
        })?;

        node.store
            .save_config(config)
            .await
            .map_err(|source| Error::Commit {
                stage: CommitStage::SavingConfig,
                source,
            })?;

        match mode {
            Mode::Formation => {
                info!("config now saved locally. should come online in about a minute");
                node.status.transition(
                    StartupStatus::Soon,
                    "Received replSetInitiate - should come online shortly.",
                )?;
            }
            Mode::Reconfiguration => {
                info!("config version {} saved locally", config.version());
                *node.active.lock() = Some(config.clone());
            }
        }
        Ok(())
    }
}
