use super::*;

pub mod request {
    use super::*;

    pub struct Heartbeat {
        /// Name of the proposed group.
        pub set_name: String,
        pub sender: HostAndPort,
        /// Set on formation. Asks the peer to report whether it holds data.
        pub check_empty: bool,
    }
}

pub mod response {
    /// What a peer replied. Fields a peer didn't send stay at their defaults.
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Heartbeat {
        pub ok: bool,
        /// Name of the group the peer has committed to. Empty if none.
        pub set_name: String,
        /// Version of the peer's committed config.
        pub config_version: Option<u64>,
        /// The peer expects a differently named group.
        pub mismatch: bool,
        pub has_data: bool,
        /// The peer runs as a member of some replica group.
        pub in_replica_set: bool,
    }
}

/// The transport of heartbeat requests.
/// An `Err` means the peer could not be asked. It never fails the operation by itself.
#[async_trait]
pub trait HeartbeatTransport: Send + Sync + 'static {
    async fn request_heartbeat(
        &self,
        target: &HostAndPort,
        req: request::Heartbeat,
    ) -> anyhow::Result<response::Heartbeat>;
}

/// Result of probing one member.
#[derive(Clone, Debug, PartialEq)]
pub struct HeartbeatOutcome {
    pub reachable: bool,
    /// The peer answered the heartbeat with ok.
    pub accepted: bool,
    pub reported_version: Option<u64>,
    pub reported_group_name: Option<String>,
    pub name_mismatch: bool,
    pub has_data: bool,
    pub is_group_member: bool,
}

impl HeartbeatOutcome {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            accepted: false,
            reported_version: None,
            reported_group_name: None,
            name_mismatch: false,
            has_data: false,
            is_group_member: false,
        }
    }

    fn from_response(resp: response::Heartbeat) -> Self {
        Self {
            reachable: true,
            accepted: resp.ok,
            reported_version: resp.config_version,
            reported_group_name: Some(resp.set_name).filter(|s| !s.is_empty()),
            name_mismatch: resp.mismatch,
            has_data: resp.has_data,
            is_group_member: resp.in_replica_set,
        }
    }

    /// A member is down unless it accepted the heartbeat or says it belongs to a group.
    pub fn is_down(&self) -> bool {
        !self.accepted && !self.is_group_member
    }
}

/// A member and what probing it returned.
#[derive(Clone, Debug)]
pub struct Probed {
    pub member: MemberConfig,
    pub outcome: HeartbeatOutcome,
}

pub struct Prober<'a> {
    transport: &'a dyn HeartbeatTransport,
    sender: HostAndPort,
    timeout: Duration,
}

impl<'a> Prober<'a> {
    pub fn new(transport: &'a dyn HeartbeatTransport, sender: HostAndPort, timeout: Duration) -> Self {
        Self {
            transport,
            sender,
            timeout,
        }
    }

    async fn probe_one(&self, set_name: &str, host: &HostAndPort, initial: bool) -> HeartbeatOutcome {
        let req = request::Heartbeat {
            set_name: set_name.to_owned(),
            sender: self.sender.clone(),
            check_empty: initial,
        };
        let resp = tokio::time::timeout(self.timeout, self.transport.request_heartbeat(host, req)).await;
        match resp {
            Ok(Ok(resp)) => {
                let outcome = HeartbeatOutcome::from_response(resp.clone());
                if !outcome.accepted {
                    warn!("{host} replied but not ok: {resp:?}");
                }
                outcome
            }
            Ok(Err(e)) => {
                info!("heartbeat to {host} failed: {e:#}");
                HeartbeatOutcome::unreachable()
            }
            Err(_) => {
                info!("heartbeat to {host} timed out after {:?}", self.timeout);
                HeartbeatOutcome::unreachable()
            }
        }
    }

    /// Probe every member except `me` concurrently.
    /// The results keep the member order of the config.
    pub async fn probe_members(
        &self,
        config: &GroupConfig,
        me: MemberId,
        initial: bool,
    ) -> Vec<Probed> {
        let mut futs = vec![];
        for member in config.members() {
            if member.id == me {
                continue;
            }
            let fut = async move {
                let outcome = self.probe_one(config.id(), &member.host, initial).await;
                debug!("probed {} -> {outcome:?}", member.host);
                Probed {
                    member: member.clone(),
                    outcome,
                }
            };
            futs.push(fut);
        }
        futures::future::join_all(futs).await
    }
}
