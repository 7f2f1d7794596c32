use super::*;

use node::{Accepted, Mode, Proposal};

/// Reply to an administrative command.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<HostAndPort>,
    /// Members that were down but tolerated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub down: Vec<HostAndPort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errmsg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_status: Option<StartupStatus>,
}

impl Response {
    fn accepted(x: Accepted) -> Self {
        Self {
            ok: true,
            down: x.down,
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl ReplNode {
    fn reject(&self, e: Error) -> Response {
        let mut resp = Response {
            ok: false,
            errmsg: Some(e.to_string()),
            code: e.code(),
            class: Some(e.class().to_owned()),
            ..Default::default()
        };
        match &e {
            Error::Precondition(PreconditionError::AlreadyActive) => {
                resp.info = Some(format!(
                    "try querying {} to see current configuration",
                    storage::CONFIG_SPACE
                ));
            }
            Error::Precondition(PreconditionError::BadConfigState) => {
                let state = self.startup_state();
                resp.info = Some(state.message);
                resp.startup_status = Some(state.status);
            }
            Error::Precondition(PreconditionError::UnexpectedStatus(status)) => {
                resp.info = self.options().repl_set.clone();
                resp.startup_status = Some(*status);
            }
            _ => {}
        }
        resp
    }

    /// `replSetInitiate`. An argument that is not an object asks for a default config.
    pub async fn replset_initiate(&self, arg: &serde_json::Value) -> Response {
        info!("replSetInitiate admin command received from client");

        let proposal = Proposal::Document(arg.clone());
        match self.run(Mode::Formation, proposal).await {
            Ok(accepted) => {
                let synthesized = accepted.synthesized;
                let mut resp = Response::accepted(accepted);
                resp.info = Some(
                    "Config now saved locally.  Should come online in about a minute.".to_owned(),
                );
                if synthesized {
                    resp.info2 = Some("no configuration explicitly specified -- making one".to_owned());
                    resp.me = Some(self.options().me.clone());
                }
                resp
            }
            Err(e) => self.reject(e),
        }
    }

    /// `replSetReconfig`.
    pub async fn replset_reconfig(&self, arg: &serde_json::Value) -> Response {
        info!("replSetReconfig admin command received from client");

        let proposal = Proposal::Document(arg.clone());
        match self.run(Mode::Reconfiguration, proposal).await {
            Ok(accepted) => {
                let version = accepted.config.version();
                let mut resp = Response::accepted(accepted);
                resp.info = Some(format!("config version {version} saved"));
                resp
            }
            Err(e) => self.reject(e),
        }
    }
}
