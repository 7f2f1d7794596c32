use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Mode {
    #[display("initiate")]
    Formation,
    #[display("reconfig")]
    Reconfiguration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    ValidatingPreconditions,
    ResolvingSelf,
    ProbingMembers,
    Committing,
    Done,
    /// Terminal. Nothing durable happened unless the failure came from `Committing`.
    Rejected(String),
}

/// What a request proposes. A document is parsed only after the preconditions pass,
/// so a node that can't take the request rejects it the same way whatever the document holds.
#[derive(Clone, Debug)]
pub enum Proposal {
    Config(GroupConfig),
    Document(serde_json::Value),
    /// Formation only. Build the config from the seeds.
    Synthesize,
}

impl Proposal {
    /// `Ok(None)` asks for a synthesized config.
    fn parse(self) -> Result<Option<GroupConfig>, ConfigError> {
        match self {
            Proposal::Config(config) => Ok(Some(config)),
            Proposal::Document(doc) if doc.is_object() => GroupConfig::from_document(&doc).map(Some),
            Proposal::Document(_) | Proposal::Synthesize => Ok(None),
        }
    }
}

/// A committed proposal.
#[derive(Clone, Debug)]
pub struct Accepted {
    pub config: GroupConfig,
    /// Hosts that were down but tolerated.
    pub down: Vec<HostAndPort>,
    /// The config was built from the seeds.
    pub synthesized: bool,
}

pub(super) struct Orchestrator<'a> {
    node: &'a ReplNode,
    mode: Mode,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    pub fn new(node: &'a ReplNode, mode: Mode) -> Self {
        Self {
            node,
            mode,
            phase: Phase::ValidatingPreconditions,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    fn enter(&mut self, next: Phase) {
        debug!("{} phase {:?} -> {next:?}", self.mode, self.phase);
        self.phase = next;
    }

    pub async fn run(&mut self, proposal: Proposal) -> Result<Accepted, Error> {
        info!("{} request received", self.mode);

        match self.drive(proposal).await {
            Ok(accepted) => {
                self.enter(Phase::Done);
                Ok(accepted)
            }
            Err(e) => {
                if e.needs_operator() {
                    error!("{} failed after durable changes began. needs operator intervention: {e}", self.mode);
                } else {
                    warn!("{} rejected: {e}", self.mode);
                }
                self.enter(Phase::Rejected(e.to_string()));
                Err(e)
            }
        }
    }

    async fn drive(&mut self, proposal: Proposal) -> Result<Accepted, Error> {
        let (config, synthesized) = self.validate_preconditions(proposal).await?;

        self.enter(Phase::ResolvingSelf);
        let me = identity::resolve_self(&config, &*self.node.resolver)?.clone();

        self.enter(Phase::ProbingMembers);
        let down = self.probe_members(&config, &me).await?;
        info!("{}: all members seem up", self.mode);

        self.enter(Phase::Committing);
        effect::commit::Effect { node: self.node }
            .exec(&config, self.mode)
            .await?;

        Ok(Accepted {
            config,
            down,
            synthesized,
        })
    }

    async fn precheck_write_lock(&self) -> Result<(), Error> {
        let bound = self.node.options.lock_timeout();
        // Only checks that the lock can be taken. It is taken again at commit.
        let _lk = self
            .node
            .write_lock
            .acquire(bound)
            .await
            .ok_or(PreconditionError::LockTimeout)?;

        if self.mode == Mode::Formation {
            // It is ok if the initiating member has other data than the operation log.
            let empty = self
                .node
                .store
                .is_operation_log_empty()
                .await
                .map_err(Error::Storage)?;
            if !empty {
                return Err(PreconditionError::NonEmptyLog.into());
            }
        }
        Ok(())
    }

    async fn validate_preconditions(
        &self,
        proposal: Proposal,
    ) -> Result<(GroupConfig, bool), Error> {
        let node = self.node;
        let Some(spec) = &node.group_spec else {
            return Err(PreconditionError::NotReplicated.into());
        };

        match self.mode {
            Mode::Formation => {
                if node.active_config().is_some() {
                    return Err(PreconditionError::AlreadyActive.into());
                }
                self.precheck_write_lock().await?;

                let status = node.status.status();
                if status == StartupStatus::BadConfig {
                    return Err(PreconditionError::BadConfigState.into());
                }
                if status != StartupStatus::EmptyConfig {
                    return Err(PreconditionError::UnexpectedStatus(status).into());
                }

                let (config, synthesized) = match proposal.parse()? {
                    Some(config) => (config, false),
                    None => {
                        info!("no configuration specified. using a default configuration for the set");
                        let config = GroupConfig::synthesize(spec, &node.options.me)?;
                        info!("created this configuration for initiation: {config:?}");
                        (config, true)
                    }
                };
                if config.version() > 1 {
                    return Err(ConfigError::VersionTooHigh(config.version()).into());
                }
                info!(
                    "config object parses ok, {} members specified",
                    config.members().len()
                );
                Ok((config, synthesized))
            }
            Mode::Reconfiguration => {
                let Some(current) = node.active_config() else {
                    return Err(PreconditionError::NotActive.into());
                };
                self.precheck_write_lock().await?;
                let config = proposal.parse()?.ok_or(ConfigError::MissingConfig)?;
                config.check_successor_of(&current)?;
                Ok((config, false))
            }
        }
    }

    /// Probe the other members and decide whether enough of them are up.
    async fn probe_members(
        &self,
        config: &GroupConfig,
        me: &MemberConfig,
    ) -> Result<Vec<HostAndPort>, Error> {
        let initial = self.mode == Mode::Formation;
        let prober = probe::Prober::new(
            &*self.node.transport,
            me.host.clone(),
            self.node.options.probe_timeout(),
        );
        // Every probe finishes before any of the outcomes is judged.
        let probed = prober.probe_members(config, me.id, initial).await;

        let mut quorum = QuorumEvaluator::new(config, initial);
        debug!(
            "total votes={}, allowable failures={}",
            quorum.total_votes(),
            quorum.allowable_failures()
        );
        for p in &probed {
            version::negotiate(&p.member.host, &p.outcome, config)?;
            quorum.record(&p.member, &p.outcome)?;
            if initial {
                version::check_empty(&p.member.host, &p.outcome)?;
            }
        }
        Ok(quorum.finish())
    }
}
