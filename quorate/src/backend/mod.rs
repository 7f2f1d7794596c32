use super::*;

/// Backend based on redb.
pub mod redb;

/// In-memory backend based on `BTreeMap`.
pub mod btree;

/// First entry of a freshly created operation log.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct InitiationMarker {
    pub ts_millis: u64,
    pub msg: String,
}

impl InitiationMarker {
    pub fn now() -> Self {
        let ts_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            ts_millis,
            msg: "initiating set".to_owned(),
        }
    }

    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}
