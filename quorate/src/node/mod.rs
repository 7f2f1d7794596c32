use super::*;

use config::GroupSpec;
use identity::SelfResolver;
use probe::HeartbeatTransport;
use quorum::QuorumEvaluator;
use status::{StartupState, StatusHandle};
use storage::{ReplStore, WriteLock};

pub mod effect;
mod initiate;
pub use initiate::{Accepted, Mode, Phase, Proposal};

/// `ReplNode` owns the process-wide state of the replica group on this node:
/// the startup status, the active config and the write lock.
/// Initiation and reconfiguration go through it one at a time.
pub struct ReplNode {
    options: NodeOptions,
    group_spec: Option<GroupSpec>,
    resolver: Box<dyn SelfResolver>,
    transport: Arc<dyn HeartbeatTransport>,
    store: Box<dyn ReplStore>,
    write_lock: WriteLock,
    status: StatusHandle,
    active: spin::Mutex<Option<GroupConfig>>,

    /// Serializing administrative requests.
    /// Both initiation and reconfiguration change the status and the committed config.
    gateway: tokio::sync::Mutex<()>,
}

impl ReplNode {
    /// Open the node and load the committed config if any.
    pub async fn open(
        options: NodeOptions,
        resolver: impl SelfResolver,
        transport: impl HeartbeatTransport,
        store: impl ReplStore,
    ) -> Result<Self, Error> {
        let group_spec = options.group_spec()?;
        let this = Self {
            options,
            group_spec,
            resolver: Box::new(resolver),
            transport: Arc::new(transport),
            store: Box::new(store),
            write_lock: WriteLock::new(),
            status: StatusHandle::new(),
            active: spin::Mutex::new(None),
            gateway: tokio::sync::Mutex::new(()),
        };
        if this.group_spec.is_some() {
            this.load_config().await?;
        } else {
            info!("not running as a replicated node");
        }
        Ok(this)
    }

    async fn load_config(&self) -> Result<(), Error> {
        self.status
            .transition(StartupStatus::LoadingConfig, "loading config")?;

        match self.store.load_config().await {
            Ok(Some(config)) => {
                info!(
                    "loaded config {} (version={}, members={})",
                    config.id(),
                    config.version(),
                    config.members().len()
                );
                *self.active.lock() = Some(config);
                self.status.transition(StartupStatus::Started, "started")?;
            }
            Ok(None) => {
                self.status.transition(
                    StartupStatus::EmptyConfig,
                    format!("can't get {} config from self", storage::CONFIG_SPACE),
                )?;
            }
            Err(e) => {
                error!("stored config is broken: {e:#}");
                self.status
                    .transition(StartupStatus::BadConfig, format!("{e:#}"))?;
            }
        }
        Ok(())
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    pub fn startup_state(&self) -> StartupState {
        self.status.snapshot()
    }

    pub fn startup_status(&self) -> StartupStatus {
        self.status.status()
    }

    /// The committed config the node currently runs with.
    pub fn active_config(&self) -> Option<GroupConfig> {
        self.active.lock().clone()
    }

    /// The exclusive write lock shared with the storage engine.
    pub fn write_lock(&self) -> &WriteLock {
        &self.write_lock
    }

    /// Form a new group. Without `proposal`, a config is built from the seeds.
    pub async fn initiate(&self, proposal: Option<GroupConfig>) -> Result<Accepted, Error> {
        let proposal = proposal.map_or(Proposal::Synthesize, Proposal::Config);
        self.run(Mode::Formation, proposal).await
    }

    /// Replace the active config of a running group.
    pub async fn reconfigure(&self, proposal: GroupConfig) -> Result<Accepted, Error> {
        self.run(Mode::Reconfiguration, Proposal::Config(proposal)).await
    }

    pub(crate) async fn run(&self, mode: Mode, proposal: Proposal) -> Result<Accepted, Error> {
        let _g = self.gateway.lock().await;
        let mut orchestrator = initiate::Orchestrator::new(self, mode);
        orchestrator.run(proposal).await
    }
}
