use std::process::ExitStatus;

/// The verdict for one dispatched node once it is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlumbExitStatus {
    Process(ExitStatus),
    Synthetic(SyntheticStatus),
}

impl From<ExitStatus> for PlumbExitStatus {
    fn from(value: ExitStatus) -> Self {
        Self::Process(value)
    }
}

impl From<SyntheticStatus> for PlumbExitStatus {
    fn from(value: SyntheticStatus) -> Self {
        Self::Synthetic(value)
    }
}

impl PlumbExitStatus {
    /// `None` when the process was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Process(status) => status.code(),
            Self::Synthetic(status) => status.code(),
        }
    }

    /// True iff the process exited normally with status zero.
    pub fn success(&self) -> bool {
        match self {
            Self::Process(status) => status.success(),
            Self::Synthetic(status) => status.success(),
        }
    }
}

/// A status the engine decided on without collecting a process: the verdict
/// of a background item, or a program that could not be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticStatus(i32);

impl SyntheticStatus {
    pub fn new_success() -> Self {
        Self(0)
    }

    pub fn with_code(code: i32) -> Self {
        Self(code)
    }

    pub fn success(&self) -> bool {
        self.0 == 0
    }

    pub fn code(&self) -> Option<i32> {
        Some(self.0)
    }
}
