#![deny(unused_must_use)]

mod error;
pub use error::*;

/// Typed replica group configuration and its validation.
pub mod config;

/// Process-wide startup status of the replica group.
pub mod status;

/// Which member of a configuration is this node.
pub mod identity;

/// Heartbeat probing of the proposed members.
pub mod probe;

/// Rejecting proposals that conflict with a peer's committed configuration.
pub mod version;

/// Weighted-vote majority accounting.
pub mod quorum;

/// Persistence interface and the exclusive write lock.
pub mod storage;

/// Implementations of `ReplStore`.
pub mod backend;

/// Replica node and the initiation/reconfiguration orchestrator.
pub mod node;

/// Administrative request/response boundary.
pub mod admin;

pub use config::{GroupConfig, MemberConfig, MemberId, NodeOptions};
pub use node::ReplNode;
pub use status::StartupStatus;

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Port assumed when a host is given without one.
pub const DEFAULT_PORT: u16 = 27017;

/// Network address of a member.
/// An IPv6 literal is written in brackets (`[::1]:27017`) and stored without them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAndPort {
    host: String,
    port: u16,
}

impl HostAndPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// True if the host part names the loopback interface.
    pub fn is_loopback(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

impl std::fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for HostAndPort {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || ConfigError::BadHost(s.to_owned());
        let parse_port = |port: &str| port.parse::<u16>().map_err(|_| bad());

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, rest) = rest.split_once(']').ok_or_else(bad)?;
            if !host.contains(':') {
                return Err(bad());
            }
            let port = match rest {
                "" => DEFAULT_PORT,
                _ => parse_port(rest.strip_prefix(':').ok_or_else(bad)?)?,
            };
            (host, port)
        } else {
            match s.split_once(':') {
                // A bare IPv6 literal must be bracketed.
                Some((_, port)) if port.contains(':') => return Err(bad()),
                Some((host, port)) => (host, parse_port(port)?),
                None => (s, DEFAULT_PORT),
            }
        };
        if host.is_empty()
            || port == 0
            || host.contains(|c: char| c.is_whitespace() || matches!(c, '/' | '[' | ']'))
        {
            return Err(bad());
        }
        Ok(Self::new(host.to_ascii_lowercase(), port))
    }
}

impl TryFrom<String> for HostAndPort {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HostAndPort> for String {
    fn from(x: HostAndPort) -> Self {
        x.to_string()
    }
}
