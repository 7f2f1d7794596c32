use super::*;

use probe::HeartbeatOutcome;

/// The largest vote weight that may be missing while the rest still hold a strict majority.
/// Negative when no vote can be spared.
pub fn allowable_failures(total_votes: i64) -> i64 {
    total_votes - (total_votes / 2 + 1)
}

/// Running accounting of down members.
///
/// On formation any down member is fatal.
/// On reconfiguration down members are tolerated until their summed votes exceed
/// `allowable_failures`. The decision depends only on the sum, so the order
/// members are recorded in doesn't change it.
pub struct QuorumEvaluator {
    initial: bool,
    total_votes: i64,
    allowable_failures: i64,
    failure_votes: i64,
    down: Vec<HostAndPort>,
}

impl QuorumEvaluator {
    pub fn new(config: &GroupConfig, initial: bool) -> Self {
        let total_votes = config.total_votes() as i64;
        Self {
            initial,
            total_votes,
            allowable_failures: allowable_failures(total_votes),
            failure_votes: 0,
            down: vec![],
        }
    }

    pub fn total_votes(&self) -> i64 {
        self.total_votes
    }

    pub fn allowable_failures(&self) -> i64 {
        self.allowable_failures
    }

    pub fn failure_votes(&self) -> i64 {
        self.failure_votes
    }

    pub fn record(&mut self, member: &MemberConfig, outcome: &HeartbeatOutcome) -> Result<(), QuorumError> {
        if !outcome.is_down() {
            return Ok(());
        }

        self.failure_votes += member.votes as i64;
        self.down.push(member.host.clone());

        let tolerated = !self.initial && self.failure_votes <= self.allowable_failures;
        if !tolerated {
            return Err(QuorumError::InsufficientMajority {
                host: member.host.clone(),
                initial: self.initial,
            });
        }
        warn!(
            "{} is down. tolerated (failure votes {}/{})",
            member.host, self.failure_votes, self.allowable_failures
        );
        Ok(())
    }

    /// Hosts that were down but tolerated.
    pub fn finish(self) -> Vec<HostAndPort> {
        self.down
    }
}
