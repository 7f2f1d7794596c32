use super::*;

use std::collections::HashSet;

mod document;
mod options;
pub use options::{GroupSpec, NodeOptions};

/// Identifier of a member within a config.
pub type MemberId = u32;

pub const MAX_MEMBER_ID: MemberId = 255;
pub const MAX_MEMBERS: usize = 12;
pub const MAX_VOTING_MEMBERS: usize = 7;
pub const MAX_PRIORITY: f64 = 1000.0;

/// One entry of `GroupConfig::members`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberConfig {
    #[serde(rename = "_id")]
    pub id: MemberId,
    pub host: HostAndPort,
    pub votes: u32,
    pub priority: f64,
    pub arbiter_only: bool,
    pub hidden: bool,
}

impl MemberConfig {
    /// A voting, electable member.
    pub fn new(id: MemberId, host: HostAndPort) -> Self {
        Self {
            id,
            host,
            votes: 1,
            priority: 1.0,
            arbiter_only: false,
            hidden: false,
        }
    }

    pub fn with_votes(self, votes: u32) -> Self {
        Self { votes, ..self }
    }

    pub fn with_priority(self, priority: f64) -> Self {
        Self { priority, ..self }
    }

    pub fn arbiter(self) -> Self {
        Self {
            arbiter_only: true,
            priority: 0.0,
            ..self
        }
    }

    /// Whether this member may ever serve as primary.
    pub fn eligible_for_primary(&self) -> bool {
        !self.arbiter_only && self.priority > 0.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id > MAX_MEMBER_ID {
            return Err(ConfigError::BadMemberId(self.id as i64));
        }
        if !(0.0..=MAX_PRIORITY).contains(&self.priority) {
            return Err(ConfigError::BadPriority(self.id, self.priority));
        }
        if self.hidden && self.priority > 0.0 {
            return Err(ConfigError::HiddenElectable(self.id));
        }
        if self.arbiter_only && self.votes == 0 {
            return Err(ConfigError::ArbiterWithoutVote(self.id));
        }
        Ok(())
    }
}

/// A validated membership set. Never mutated once built.
/// A reconfiguration always builds a new instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupConfig {
    #[serde(rename = "_id")]
    id: String,
    version: u64,
    members: Vec<MemberConfig>,
}

impl GroupConfig {
    pub fn new(
        id: impl Into<String>,
        version: u64,
        members: Vec<MemberConfig>,
    ) -> Result<Self, ConfigError> {
        let this = Self {
            id: id.into(),
            version,
            members,
        };
        this.validate()?;
        Ok(this)
    }

    /// Parse a loosely typed admin document.
    pub fn from_document(doc: &serde_json::Value) -> Result<Self, ConfigError> {
        document::parse(doc)
    }

    /// The config used when a formation request comes without one:
    /// the local node as member 0 followed by the seeds.
    pub fn synthesize(spec: &GroupSpec, me: &HostAndPort) -> Result<Self, ConfigError> {
        let mut members = vec![MemberConfig::new(0, me.clone())];
        for seed in spec.seeds() {
            if seed == me {
                continue;
            }
            let id = members.len() as MemberId;
            members.push(MemberConfig::new(id, seed.clone()));
        }
        Self::new(spec.name(), 1, members)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn members(&self) -> &[MemberConfig] {
        &self.members
    }

    pub fn member(&self, id: MemberId) -> Option<&MemberConfig> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn total_votes(&self) -> u64 {
        self.members.iter().map(|m| m.votes as u64).sum()
    }

    /// Check that `self` may replace `current` as the committed config.
    pub fn check_successor_of(&self, current: &GroupConfig) -> Result<(), ConfigError> {
        if self.id != current.id {
            return Err(ConfigError::NameChanged {
                current: current.id.clone(),
                proposed: self.id.clone(),
            });
        }
        if self.version <= current.version {
            return Err(ConfigError::VersionNotIncreasing {
                current: current.version,
                proposed: self.version,
            });
        }
        for m in &self.members {
            if let Some(old) = current.member(m.id) {
                if old.host != m.host {
                    return Err(ConfigError::HostChanged {
                        id: m.id,
                        current: old.host.clone(),
                        proposed: m.host.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.id)?;
        if self.version == 0 {
            return Err(ConfigError::BadVersion(0));
        }
        if self.members.is_empty() {
            return Err(ConfigError::NoMembers);
        }
        if self.members.len() > MAX_MEMBERS {
            return Err(ConfigError::TooManyMembers(self.members.len()));
        }

        let mut ids = HashSet::new();
        let mut hosts = HashSet::new();
        for m in &self.members {
            m.validate()?;
            if !ids.insert(m.id) {
                return Err(ConfigError::DuplicateId(m.id));
            }
            if !hosts.insert(&m.host) {
                return Err(ConfigError::DuplicateHost(m.host.clone()));
            }
        }

        let n_voters = self.members.iter().filter(|m| m.votes > 0).count();
        if n_voters == 0 {
            return Err(ConfigError::NoVoters);
        }
        if n_voters > MAX_VOTING_MEMBERS {
            return Err(ConfigError::TooManyVoters(n_voters));
        }
        if !self.members.iter().any(|m| m.eligible_for_primary()) {
            return Err(ConfigError::NoElectableMember);
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::MissingName);
    }
    if name.contains(|c: char| c == '/' || c == ',' || c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::BadName(name.to_owned()));
    }
    Ok(())
}
