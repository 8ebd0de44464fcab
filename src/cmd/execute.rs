use std::{io, process::Stdio, sync::Arc};

use async_recursion::async_recursion;
use itertools::Itertools;
use nix::errno::Errno;
use tokio::process::Command;

use super::command_tree::CommandNode;
use crate::{
    config::EngineConfig,
    prelude::*,
    process::{
        child::PlumbChild,
        reaper::Reaper,
        status::{PlumbExitStatus, SyntheticStatus},
        streams::Streams,
        Completion,
    },
};

/// Executes command trees. Cloning is cheap and clones share one reaper.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    reaper: Reaper,
}

impl Engine {
    /// Must be called inside a tokio runtime, the reaper starts right away.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            reaper: Reaper::spawn(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reaper(&self) -> &Reaper {
        &self.reaper
    }

    /// Runs a whole tree against the orchestrator's own streams and waits for
    /// the root to finish.
    pub async fn run(&self, node: &CommandNode) -> Result<PlumbExitStatus> {
        node.validate()?;
        debug!(%node, "running command tree");

        let run = async { self.dispatch(node).await?.collect().await };

        let status = match self.config.deadline() {
            Some(deadline) => tokio::time::timeout(deadline, run)
                .await
                .map_err(|_| EngineError::DeadlineExceeded(deadline))??,
            None => run.await?,
        };

        debug!(success = status.success(), code = ?status.code(), "command tree finished");
        Ok(status)
    }

    /// Dispatches the root without collecting it.
    pub async fn dispatch(&self, node: &CommandNode) -> Result<Completion> {
        self.run_command(node, Streams::inherit()).await
    }

    #[async_recursion]
    pub async fn run_command(&self, node: &CommandNode, streams: Streams) -> Result<Completion> {
        match node {
            CommandNode::Simple(argv) => self.launch(argv, streams),
            CommandNode::Pipeline(stages) => self.pipeline(stages, streams).await,
            CommandNode::Sequence(sequence) => self.sequence(sequence, streams).await,
            CommandNode::Redirect(redirect) => self.redirect(redirect, streams).await,
        }
    }

    /// Starts one process with the given streams and returns without waiting.
    fn launch(&self, argv: &[String], streams: Streams) -> Result<Completion> {
        let Some((program, args)) = argv.split_first() else {
            return Err(EngineError::InvalidTree("simple command with empty argv".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(streams.stdin.into_stdio())
            .stdout(streams.stdout.into_stdio())
            .stderr(Stdio::inherit());

        trace!("spawning command: {:?}", cmd);

        match cmd.spawn() {
            Ok(child) => {
                debug!(pid = ?child.id(), argv = %argv.iter().join(" "), "launched");
                Ok(Completion::Pending(child.into()))
            }
            Err(err) => match self.exec_failure_status(&err) {
                Some(code) => {
                    debug!(%program, code, "cannot execute: {err}");
                    Ok(Completion::Done(SyntheticStatus::with_code(code).into()))
                }
                None => Err(EngineError::Spawn {
                    program: program.clone(),
                    source: err,
                }),
            },
        }
    }

    fn exec_failure_status(&self, err: &io::Error) -> Option<i32> {
        match err.kind() {
            io::ErrorKind::NotFound => Some(self.config.not_found_status),
            io::ErrorKind::PermissionDenied => Some(self.config.not_executable_status),
            _ if err.raw_os_error() == Some(Errno::ENOEXEC as i32) => {
                Some(self.config.not_executable_status)
            }
            _ => None,
        }
    }

    /// Runs a sub-tree on its own task so the caller is not held up by the
    /// processes it waits on.
    pub(crate) fn detach(&self, node: &CommandNode, streams: Streams) -> PlumbChild {
        let engine = self.clone();
        let node = node.clone();

        trace!(%node, "detaching");

        PlumbChild::Task(tokio::task::spawn(async move {
            engine.run_command(&node, streams).await?.collect().await
        }))
    }
}
