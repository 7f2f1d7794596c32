use super::*;

/// Parsed form of the `<name>/<seed>,<seed>,...` string a replicated node is started with.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSpec {
    name: String,
    seeds: Vec<HostAndPort>,
}

impl GroupSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seeds(&self) -> &[HostAndPort] {
        &self.seeds
    }
}

impl FromStr for GroupSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = match s.split_once('/') {
            Some((name, rest)) => (name, rest),
            None => (s, ""),
        };
        validate_name(name)?;

        let mut seeds: Vec<HostAndPort> = vec![];
        for x in rest.split(',').filter(|x| !x.trim().is_empty()) {
            let seed: HostAndPort = x.parse()?;
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
        Ok(Self {
            name: name.to_owned(),
            seeds,
        })
    }
}

/// Settings of the local node.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeOptions {
    /// `<name>/<seeds>`. `None` means the node doesn't run as a replicated node.
    pub repl_set: Option<String>,
    /// The address this node is reachable at.
    pub me: HostAndPort,
    /// Timeout of a single heartbeat probe.
    pub probe_timeout_ms: u64,
    /// How long the pre-check waits for the write lock before giving up.
    pub lock_timeout_ms: u64,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            repl_set: None,
            me: HostAndPort::new("localhost", DEFAULT_PORT),
            probe_timeout_ms: 10_000,
            lock_timeout_ms: 10_000,
        }
    }
}

impl NodeOptions {
    pub fn group_spec(&self) -> Result<Option<GroupSpec>, ConfigError> {
        self.repl_set.as_deref().map(str::parse::<GroupSpec>).transpose()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
