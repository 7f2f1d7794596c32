use super::*;

use std::collections::HashSet;

/// Tells whether an address refers to this node.
pub trait SelfResolver: Send + Sync + 'static {
    fn is_self(&self, host: &HostAndPort) -> bool;
}

/// The set of addresses this node is known by.
/// A loopback host matches if its port is one of the local ports.
#[derive(Clone, Debug)]
pub struct LocalAddresses {
    addrs: HashSet<HostAndPort>,
}

impl LocalAddresses {
    pub fn new(me: HostAndPort) -> Self {
        let mut addrs = HashSet::new();
        addrs.insert(me);
        Self { addrs }
    }

    /// Another name the node answers to.
    pub fn with_alias(mut self, alias: HostAndPort) -> Self {
        self.addrs.insert(alias);
        self
    }
}

impl SelfResolver for LocalAddresses {
    fn is_self(&self, host: &HostAndPort) -> bool {
        if self.addrs.contains(host) {
            return true;
        }
        host.is_loopback() && self.addrs.iter().any(|a| a.port() == host.port())
    }
}

/// Find the one member that is this node.
/// Runs before any probing so that a bad config fails without network I/O.
pub fn resolve_self<'a>(
    config: &'a GroupConfig,
    resolver: &dyn SelfResolver,
) -> Result<&'a MemberConfig, SelfIdentityError> {
    let matches: Vec<&MemberConfig> = config
        .members()
        .iter()
        .filter(|m| resolver.is_self(&m.host))
        .collect();

    match matches.as_slice() {
        [] => Err(SelfIdentityError::NotFound),
        [me] => {
            if !me.eligible_for_primary() {
                return Err(SelfIdentityError::Ineligible(me.host.clone()));
            }
            debug!("found self in config (id={}, host={})", me.id, me.host);
            Ok(me)
        }
        many => Err(SelfIdentityError::Ambiguous(
            many.iter().map(|m| m.host.clone()).collect(),
        )),
    }
}
