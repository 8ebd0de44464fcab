use super::{
    command_tree::{CommandNode, ConditionalOp, PlainOp, Sequence},
    execute::Engine,
};
use crate::{
    prelude::*,
    process::{
        reaper::Origin,
        status::{PlumbExitStatus, SyntheticStatus},
        streams::Streams,
        Completion,
    },
};

impl Engine {
    pub(crate) async fn sequence(&self, sequence: &Sequence, streams: Streams) -> Result<Completion> {
        match sequence {
            Sequence::Plain(items) => self.plain(items, &streams).await,
            Sequence::Conditional { head, tail } => self.conditional(head, tail, &streams).await,
        }
    }

    /// Each item runs according to its own operator; the result is the
    /// verdict of the last item.
    async fn plain(&self, items: &[(CommandNode, PlainOp)], streams: &Streams) -> Result<Completion> {
        let mut verdict = None;

        for (node, op) in items {
            let status = match op {
                PlainOp::Sequential => {
                    trace!(%node, "SEQ: executing");
                    self.run_command(node, streams.try_clone()?)
                        .await?
                        .collect()
                        .await?
                }
                PlainOp::Background => {
                    trace!(%node, "BG: executing");
                    self.background(node, streams.try_clone()?).await?;
                    SyntheticStatus::new_success().into()
                }
            };

            debug!(%op, success = status.success(), "sequence item finished");
            verdict = Some(status);
        }

        verdict
            .map(Completion::Done)
            .ok_or_else(|| EngineError::InvalidTree("sequence with no items".into()))
    }

    /// Launches without waiting; the reaper collects whatever was started.
    async fn background(&self, node: &CommandNode, streams: Streams) -> Result<()> {
        let child = if node.blocks() {
            self.detach(node, streams)
        } else {
            match self.run_command(node, streams).await? {
                Completion::Pending(child) => child,
                Completion::Done(status) => {
                    debug!(%node, code = ?status.code(), "background command finished at launch");
                    return Ok(());
                }
            }
        };

        debug!(pid = ?child.id(), %node, "running in background");
        self.reaper().adopt(child, Origin::Background);

        Ok(())
    }

    /// Short-circuit evaluation, left to right: a skipped item never launches
    /// and the running verdict is kept.
    async fn conditional(
        &self,
        head: &CommandNode,
        tail: &[(ConditionalOp, CommandNode)],
        streams: &Streams,
    ) -> Result<Completion> {
        trace!(%head, "COND: executing head");
        let mut verdict = self.run_to_end(head, streams).await?;

        for (op, node) in tail {
            let runs = match op {
                ConditionalOp::Conjunction => verdict.success(),
                ConditionalOp::Disjunction => !verdict.success(),
            };

            if !runs {
                trace!(%op, %node, success = verdict.success(), "COND: skipping");
                continue;
            }

            trace!(%op, %node, "COND: executing");
            verdict = self.run_to_end(node, streams).await?;
        }

        Ok(Completion::Done(verdict))
    }

    async fn run_to_end(&self, node: &CommandNode, streams: &Streams) -> Result<PlumbExitStatus> {
        self.run_command(node, streams.try_clone()?)
            .await?
            .collect()
            .await
    }
}
