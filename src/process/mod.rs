use self::{child::PlumbChild, status::PlumbExitStatus};
use crate::error::EngineError;

pub mod child;
pub mod reaper;
pub mod status;
pub mod streams;

/// What dispatching one node produced.
#[derive(Debug)]
pub enum Completion {
    /// Launched and not collected; the caller decides whether to wait.
    Pending(PlumbChild),
    Done(PlumbExitStatus),
}

impl From<PlumbChild> for Completion {
    fn from(value: PlumbChild) -> Self {
        Self::Pending(value)
    }
}

impl From<PlumbExitStatus> for Completion {
    fn from(value: PlumbExitStatus) -> Self {
        Self::Done(value)
    }
}

impl Completion {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Waits for a pending child, or hands back the known status.
    pub async fn collect(self) -> Result<PlumbExitStatus, EngineError> {
        match self {
            Self::Pending(child) => child.wait().await,
            Self::Done(status) => Ok(status),
        }
    }
}
