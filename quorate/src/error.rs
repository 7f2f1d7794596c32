use super::*;
use thiserror::Error;

/// The proposed configuration is malformed or not allowed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("couldn't parse cfg object: {0}")]
    BadDocument(String),
    #[error("no config object was given")]
    MissingConfig,
    #[error("group name (_id) is missing")]
    MissingName,
    #[error("group name {0:?} is malformed")]
    BadName(String),
    #[error("version must be a positive integer (got {0})")]
    BadVersion(i64),
    #[error("can't initiate with a version number greater than 1 (got {0})")]
    VersionTooHigh(u64),
    #[error("version {proposed} must be greater than the current version {current}")]
    VersionNotIncreasing { current: u64, proposed: u64 },
    #[error("group name can't change (current={current}, proposed={proposed})")]
    NameChanged { current: String, proposed: String },
    #[error("config has no members")]
    NoMembers,
    #[error("too many members ({0} > {max})", max = config::MAX_MEMBERS)]
    TooManyMembers(usize),
    #[error("too many voting members ({0} > {max})", max = config::MAX_VOTING_MEMBERS)]
    TooManyVoters(usize),
    #[error("config has no voting member")]
    NoVoters,
    #[error("no member can become primary")]
    NoElectableMember,
    #[error("member _id {0} is out of range")]
    BadMemberId(i64),
    #[error("member {0}: votes must be non-negative (got {1})")]
    BadVotes(MemberId, i64),
    #[error("member {0}: priority must be within 0..=1000 (got {1})")]
    BadPriority(MemberId, f64),
    #[error("member {0}: hidden members must have priority 0")]
    HiddenElectable(MemberId),
    #[error("member {0}: arbiters must vote")]
    ArbiterWithoutVote(MemberId),
    #[error("duplicate member _id {0}")]
    DuplicateId(MemberId),
    #[error("duplicate member host {0}")]
    DuplicateHost(HostAndPort),
    #[error("bad host {0:?}")]
    BadHost(String),
    #[error("member {id} can't change host ({current} -> {proposed})")]
    HostChanged {
        id: MemberId,
        current: HostAndPort,
        proposed: HostAndPort,
    },
}

/// No single eligible member of the config is this node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelfIdentityError {
    #[error("bad config: isSelf is true for multiple hosts: {}", join_hosts(.0))]
    Ambiguous(Vec<HostAndPort>),
    #[error("can't find self in the replica group config")]
    NotFound,
    #[error("initiation and reconfiguration must be sent to a node that can become primary ({0})")]
    Ineligible(HostAndPort),
}

/// A peer's committed configuration conflicts with the proposal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersionError {
    #[error("group name does not match the group name host {0} expects")]
    NameMismatch(HostAndPort),
    #[error("member {0} is already initiated")]
    AlreadyInitiated(HostAndPort),
    #[error("member {host} has a config version ({theirs}) >= to the new config version ({proposed}); cannot change config")]
    StaleProposal {
        host: HostAndPort,
        theirs: u64,
        proposed: u64,
    },
    #[error("member {0} is in a replica group but didn't report its config version")]
    UnknownVersion(HostAndPort),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuorumError {
    #[error("need {} members up to {}, not ok : {host}", quantifier(.initial), action(.initial))]
    InsufficientMajority { host: HostAndPort, initial: bool },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("server is not running as a replicated node")]
    NotReplicated,
    #[error("already initialized")]
    AlreadyActive,
    #[error("no replica group is active on this node")]
    NotActive,
    #[error("{} is not empty on the initiating member. cannot initiate.", storage::OPERATION_LOG)]
    NonEmptyLog,
    #[error("server already in BADCONFIG state (check logs); not initiating")]
    BadConfigState,
    #[error("all members and seeds must be reachable to initiate set (startup status is {0})")]
    UnexpectedStatus(StartupStatus),
    #[error("took a long time to get write lock, so not initiating. Initiate when server less busy?")]
    LockTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CommitStage {
    #[display("creating the operation log")]
    CreatingOperationLog,
    #[display("acquiring the write lock")]
    AcquiringLock,
    #[display("saving the config")]
    SavingConfig,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    SelfIdentity(#[from] SelfIdentityError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("member {0} has data already, cannot initiate set. All members except initiator must be empty.")]
    DataPresent(HostAndPort),
    #[error(transparent)]
    Quorum(#[from] QuorumError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// Failed after durable side effects may have happened. Never retried.
    #[error("commit failed while {stage}: {source:#}")]
    Commit {
        stage: CommitStage,
        source: anyhow::Error,
    },
    #[error("local storage failed: {0:#}")]
    Storage(anyhow::Error),
    #[error("illegal startup status transition ({from} -> {to})")]
    IllegalTransition {
        from: StartupStatus,
        to: StartupStatus,
    },
}

impl Error {
    /// Error class reported at the administrative boundary.
    pub fn class(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigError",
            Error::SelfIdentity(_) => "SelfIdentityError",
            Error::Version(_) => "VersionError",
            Error::DataPresent(_) => "DataPresentError",
            Error::Quorum(_) => "QuorumError",
            Error::Precondition(_) => "PreconditionError",
            Error::Commit { .. } => "CommitError",
            Error::Storage(_) => "StorageError",
            Error::IllegalTransition { .. } => "IllegalTransition",
        }
    }

    /// Numeric code of the rejection, stable across releases.
    pub fn code(&self) -> Option<u32> {
        let code = match self {
            Error::SelfIdentity(SelfIdentityError::Ineligible(_)) => 13420,
            Error::SelfIdentity(SelfIdentityError::Ambiguous(_)) => 13278,
            Error::SelfIdentity(SelfIdentityError::NotFound) => 13279,
            Error::Version(VersionError::NameMismatch(_)) => 13145,
            Error::Version(VersionError::AlreadyInitiated(_)) => 13256,
            Error::Version(VersionError::StaleProposal { .. }) => 13341,
            Error::DataPresent(_) => 13311,
            Error::Quorum(_) => 13144,
            _ => return None,
        };
        Some(code)
    }

    /// True if durable state may have been changed by the failed request.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Error::Commit { .. })
    }
}

fn quantifier(initial: &bool) -> &'static str {
    if *initial {
        "all"
    } else {
        "most"
    }
}

fn action(initial: &bool) -> &'static str {
    if *initial {
        "initiate"
    } else {
        "reconfigure"
    }
}

fn join_hosts(hosts: &[HostAndPort]) -> String {
    hosts
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
