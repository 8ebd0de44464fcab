use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;
use tokio::task::JoinError;

use crate::cmd::command_tree::Direction;

/// Failures of the engine itself. A program exiting non-zero is not one of
/// these, it is reported as an unsuccessful status.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot open {} for {direction} redirection", path.display())]
    Redirect {
        direction: Direction,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create pipe")]
    Pipe(#[source] nix::Error),
    #[error("failed to duplicate stream descriptor")]
    Duplicate(#[source] io::Error),
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to collect child process")]
    Collect(#[source] io::Error),
    #[error("detached command task did not finish")]
    Detached(#[from] JoinError),
    #[error("invalid command tree: {0}")]
    InvalidTree(String),
    #[error("command tree did not finish within {0:?}")]
    DeadlineExceeded(Duration),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

impl EngineError {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Redirect { source, .. }
            | Self::Duplicate(source)
            | Self::Spawn { source, .. }
            | Self::Collect(source) => Some(source.kind()),
            Self::Pipe(errno) => Some(io::Error::from(*errno).kind()),
            _ => None,
        }
    }
}
