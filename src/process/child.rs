use tokio::{process::Child, task::JoinHandle};

use super::status::PlumbExitStatus;
use crate::error::EngineError;

/// Something launched that has not been collected yet.
#[derive(Debug)]
pub enum PlumbChild {
    Process(Child),
    /// A compound sub-tree running on its own task.
    Task(JoinHandle<Result<PlumbExitStatus, EngineError>>),
}

impl From<Child> for PlumbChild {
    fn from(value: Child) -> Self {
        Self::Process(value)
    }
}

impl PlumbChild {
    /// Blocks until the child has finished and returns its status.
    pub async fn wait(self) -> Result<PlumbExitStatus, EngineError> {
        match self {
            Self::Process(mut process) => process
                .wait()
                .await
                .map(Into::into)
                .map_err(EngineError::Collect),
            Self::Task(handle) => handle.await?,
        }
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            Self::Process(process) => process.id(),
            Self::Task(_) => None,
        }
    }
}
