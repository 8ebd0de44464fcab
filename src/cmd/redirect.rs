use std::{fs::File, path::Path};

use tokio::fs::OpenOptions;

use super::{
    command_tree::{Direction, Redirection},
    execute::Engine,
};
use crate::{
    prelude::*,
    process::{streams::Streams, Completion},
};

impl Engine {
    /// Runs the target with one stream rebound to the file. The caller's
    /// `Streams` are never touched; the rebound set is dropped once the target
    /// has been launched, which is all a restore has to do.
    pub(crate) async fn redirect(
        &self,
        redirect: &Redirection,
        streams: Streams,
    ) -> Result<Completion> {
        let file = open_target(redirect.direction, &redirect.path).await?;

        trace!(
            direction = %redirect.direction,
            path = %redirect.path.display(),
            "rebinding stream"
        );

        let scoped = match redirect.direction {
            Direction::Input => streams.with_stdin(file),
            Direction::Output | Direction::Append => streams.with_stdout(file),
        };

        self.run_command(&redirect.target, scoped).await
    }
}

/// Opens a redirection target with the mode its direction calls for. New
/// files are created with 0666 before umask.
pub async fn open_target(direction: Direction, path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();

    match direction {
        Direction::Input => options.read(true),
        Direction::Output => options.write(true).create(true).truncate(true).mode(0o666),
        Direction::Append => options.append(true).create(true).mode(0o666),
    };

    let file = options
        .open(path)
        .await
        .map_err(|source| EngineError::Redirect {
            direction,
            path: path.to_path_buf(),
            source,
        })?;

    Ok(file.into_std().await)
}
