use super::*;

/// Startup status of the replica group on this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StartupStatus {
    #[display("PRESTART")]
    PreStart,
    #[display("LOADINGCONFIG")]
    LoadingConfig,
    /// Terminal. Needs operator intervention.
    #[display("BADCONFIG")]
    BadConfig,
    #[display("EMPTYCONFIG")]
    EmptyConfig,
    #[display("EMPTYUNREACHABLE")]
    EmptyUnreachable,
    #[display("STARTED")]
    Started,
    /// A config was committed by formation. The node comes online shortly.
    #[display("SOON")]
    Soon,
}

impl StartupStatus {
    pub fn can_transition_to(self, next: StartupStatus) -> bool {
        use StartupStatus::*;
        match self {
            PreStart => matches!(next, LoadingConfig),
            LoadingConfig => matches!(next, BadConfig | EmptyConfig | EmptyUnreachable | Started),
            EmptyConfig => matches!(next, Soon | BadConfig | EmptyUnreachable | LoadingConfig),
            EmptyUnreachable => matches!(next, EmptyConfig | LoadingConfig | Started),
            Soon => matches!(next, LoadingConfig | Started),
            Started => false,
            BadConfig => false,
        }
    }
}

/// A consistent view of the status and its message.
#[derive(Clone, Debug, PartialEq)]
pub struct StartupState {
    pub status: StartupStatus,
    pub message: String,
}

/// Owner of the startup status. Transitions are checked against the transition table.
pub struct StatusHandle {
    inner: spin::Mutex<StartupState>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self {
            inner: spin::Mutex::new(StartupState {
                status: StartupStatus::PreStart,
                message: String::new(),
            }),
        }
    }

    pub fn status(&self) -> StartupStatus {
        self.inner.lock().status
    }

    pub fn snapshot(&self) -> StartupState {
        self.inner.lock().clone()
    }

    pub fn transition(&self, next: StartupStatus, message: impl Into<String>) -> Result<(), Error> {
        let mut cur = self.inner.lock();
        if !cur.status.can_transition_to(next) {
            return Err(Error::IllegalTransition {
                from: cur.status,
                to: next,
            });
        }
        let message = message.into();
        info!("startup status {} -> {next} ({message})", cur.status);
        *cur = StartupState {
            status: next,
            message,
        };
        Ok(())
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}
