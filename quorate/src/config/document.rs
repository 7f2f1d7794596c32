use super::*;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "_id")]
    id: Option<String>,
    version: Option<i64>,
    members: Vec<RawMember>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawMember {
    #[serde(rename = "_id")]
    id: i64,
    host: String,
    votes: Option<i64>,
    priority: Option<f64>,
    arbiter_only: Option<bool>,
    hidden: Option<bool>,
    eligible_for_primary: Option<bool>,
}

impl RawMember {
    fn into_member(self) -> Result<MemberConfig, ConfigError> {
        let id = MemberId::try_from(self.id)
            .ok()
            .filter(|id| *id <= MAX_MEMBER_ID)
            .ok_or(ConfigError::BadMemberId(self.id))?;
        let host: HostAndPort = self.host.parse()?;
        let votes = match self.votes {
            None => 1,
            Some(v) => u32::try_from(v).map_err(|_| ConfigError::BadVotes(id, v))?,
        };
        let arbiter_only = self.arbiter_only.unwrap_or(false);
        let hidden = self.hidden.unwrap_or(false);
        let default_priority = if arbiter_only || hidden { 0.0 } else { 1.0 };
        let mut priority = self.priority.unwrap_or(default_priority);
        if self.eligible_for_primary == Some(false) {
            priority = 0.0;
        }
        Ok(MemberConfig {
            id,
            host,
            votes,
            priority,
            arbiter_only,
            hidden,
        })
    }
}

pub fn parse(doc: &serde_json::Value) -> Result<GroupConfig, ConfigError> {
    let raw = RawConfig::deserialize(doc).map_err(|e| ConfigError::BadDocument(e.to_string()))?;

    let id = raw.id.ok_or(ConfigError::MissingName)?;
    let version = match raw.version {
        None => 1,
        Some(v) if v >= 1 => v as u64,
        Some(v) => return Err(ConfigError::BadVersion(v)),
    };
    let members = raw
        .members
        .into_iter()
        .map(RawMember::into_member)
        .collect::<Result<Vec<_>, _>>()?;

    GroupConfig::new(id, version, members)
}
