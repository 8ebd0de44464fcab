use super::{command_tree::CommandNode, execute::Engine};
use crate::{
    prelude::*,
    process::{
        reaper::Origin,
        streams::{Pipe, Streams},
        Completion,
    },
};

impl Engine {
    /// Launches every stage left to right, each stage's stdout feeding the
    /// next stage's stdin. Only the last stage's completion is returned; the
    /// others are handed to the reaper and run concurrently.
    pub(crate) async fn pipeline(
        &self,
        stages: &[CommandNode],
        streams: Streams,
    ) -> Result<Completion> {
        let Some((last, init)) = stages.split_last() else {
            return Err(EngineError::InvalidTree("pipeline with no stages".into()));
        };

        if init.is_empty() {
            return self.run_command(last, streams).await;
        }

        let mut input = streams.stdin;

        for (i, stage) in init.iter().enumerate() {
            let pipe = Pipe::new()?;
            let stage_streams = Streams {
                stdin: input,
                stdout: pipe.writer.into(),
            };

            trace!(stage = i, %stage, "launching pipeline stage");

            let completion = if stage.blocks() {
                Completion::Pending(self.detach(stage, stage_streams))
            } else {
                self.run_command(stage, stage_streams).await?
            };

            match completion {
                Completion::Pending(child) => self.reaper().adopt(child, Origin::PipelineStage),
                Completion::Done(status) => {
                    debug!(stage = i, success = status.success(), "pipeline stage finished early");
                }
            }

            // our copy of the write end is gone, only the stage holds it now
            input = pipe.reader.into();
        }

        trace!(stage = init.len(), %last, "launching final pipeline stage");

        self.run_command(
            last,
            Streams {
                stdin: input,
                stdout: streams.stdout,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use super::*;
    use crate::{cmd::command_tree::Direction, config::EngineConfig};

    fn engine() -> Engine {
        Engine::new(EngineConfig::default())
    }

    #[tokio::test]
    async fn single_stage_pipeline_is_the_stage() {
        let engine = engine();
        let completion = engine
            .dispatch(&CommandNode::pipeline([CommandNode::simple(["true"])]))
            .await
            .unwrap();

        assert!(completion.is_pending());
        assert_eq!(engine.reaper().outstanding(), 0);
        assert!(completion.collect().await.unwrap().success());
    }

    #[tokio::test]
    async fn status_is_the_last_stage() {
        let engine = engine();

        let ok = CommandNode::pipeline([CommandNode::simple(["false"]), CommandNode::simple(["true"])]);
        assert!(engine.run(&ok).await.unwrap().success());

        let failed = CommandNode::pipeline([CommandNode::simple(["true"]), CommandNode::simple(["false"])]);
        assert!(!engine.run(&failed).await.unwrap().success());
    }

    #[tokio::test]
    async fn three_stages_chain_through_pipes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let engine = engine();

        let tree = CommandNode::pipeline([
            CommandNode::simple(["printf", "b\\na\\nc\\n"]),
            CommandNode::simple(["sort"]),
            CommandNode::simple(["head", "-n", "2"]).redirect(Direction::Output, &out),
        ]);
        assert!(engine.run(&tree).await.unwrap().success());

        assert_eq!(fs::read_to_string(&out).unwrap(), "a\nb\n");
        tokio::time::timeout(Duration::from_secs(5), engine.reaper().settle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn endless_producer_stops_when_consumer_exits() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let engine = engine();

        let tree = CommandNode::pipeline([
            CommandNode::simple(["yes"]),
            CommandNode::simple(["head", "-n", "3"]).redirect(Direction::Output, &out),
        ]);
        assert!(engine.run(&tree).await.unwrap().success());
        assert_eq!(fs::read_to_string(&out).unwrap(), "y\ny\ny\n");

        // `yes` only dies of SIGPIPE if no other write end survived
        tokio::time::timeout(Duration::from_secs(5), engine.reaper().settle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn redirected_stage_waiting_on_a_fifo_runs_detached() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("fifo");
        let out = dir.path().join("out");
        nix::unistd::mkfifo(&fifo, nix::sys::stat::Mode::S_IRWXU).unwrap();
        let engine = engine();

        // cat < fifo | cat > out
        let tree = CommandNode::pipeline([
            CommandNode::simple(["cat"]).redirect(Direction::Input, &fifo),
            CommandNode::simple(["cat"]).redirect(Direction::Output, &out),
        ]);
        let completion = tokio::time::timeout(Duration::from_secs(5), engine.dispatch(&tree))
            .await
            .expect("opening the fifo stalled the chainer")
            .unwrap();
        assert_eq!(engine.reaper().outstanding(), 1);

        tokio::fs::write(&fifo, "through the fifo\n").await.unwrap();
        assert!(completion.collect().await.unwrap().success());
        assert_eq!(fs::read_to_string(&out).unwrap(), "through the fifo\n");

        tokio::time::timeout(Duration::from_secs(5), engine.reaper().settle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn compound_stage_runs_detached() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let engine = engine();

        let producer = CommandNode::conditional(CommandNode::simple(["echo", "first"]))
            .and(CommandNode::simple(["echo", "second"]))
            .build();
        let tree = CommandNode::pipeline([
            producer,
            CommandNode::simple(["cat"]).redirect(Direction::Output, &out),
        ]);
        assert!(engine.run(&tree).await.unwrap().success());

        assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");
    }
}
