use super::*;

use probe::HeartbeatOutcome;

/// Reject the proposal if the peer's committed state conflicts with it.
/// A proposal with version <= 1 is a first-time formation.
pub fn negotiate(
    host: &HostAndPort,
    outcome: &HeartbeatOutcome,
    proposed: &GroupConfig,
) -> Result<(), VersionError> {
    if outcome.name_mismatch {
        return Err(VersionError::NameMismatch(host.clone()));
    }

    let formation = proposed.version() <= 1;
    if outcome.reported_group_name.is_some() && formation {
        // No one may be initiated already.
        return Err(VersionError::AlreadyInitiated(host.clone()));
    }

    // A peer that hasn't committed to any group has nothing to compare against.
    if !formation && outcome.reported_group_name.is_some() {
        let Some(theirs) = outcome.reported_version else {
            return Err(VersionError::UnknownVersion(host.clone()));
        };
        if theirs >= proposed.version() {
            return Err(VersionError::StaleProposal {
                host: host.clone(),
                theirs,
                proposed: proposed.version(),
            });
        }
    }
    Ok(())
}

/// On formation every member except the initiator must be empty.
pub fn check_empty(host: &HostAndPort, outcome: &HeartbeatOutcome) -> Result<(), Error> {
    if outcome.reachable && outcome.has_data {
        return Err(Error::DataPresent(host.clone()));
    }
    Ok(())
}
