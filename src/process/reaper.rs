use std::sync::Arc;

use strum::Display;
use tokio::{
    select,
    sync::{mpsc::error::SendError, watch},
    task::JoinSet,
};

use super::child::PlumbChild;
use crate::prelude::*;

/// Why the engine is not waiting on a child itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Origin {
    Background,
    PipelineStage,
}

/// Collects children the engine launched but will never wait on itself
/// (background items and non-final pipeline stages), so none of them is left
/// as an uncollected process-table entry.
#[derive(Debug, Clone)]
pub struct Reaper {
    tx: Sender<(PlumbChild, Origin)>,
    outstanding: Arc<watch::Sender<usize>>,
}

impl Reaper {
    /// Starts the collection loop. Must be called inside a tokio runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = unbounded_channel::<(PlumbChild, Origin)>();
        let outstanding = Arc::new(watch::channel(0usize).0);
        let counter = outstanding.clone();

        tokio::task::spawn(async move {
            let mut collecting = JoinSet::new();

            loop {
                select! {
                    Some((child, origin)) = rx.recv() => {
                        let id = child.id();
                        trace!(?id, %origin, "reaper adopted child");
                        collecting.spawn(async move { (id, origin, child.wait().await) });
                    }
                    Some(joined) = collecting.join_next() => {
                        match joined {
                            // a failing upstream stage is routine (SIGPIPE), a failing background job is not
                            Ok((id, Origin::Background, Ok(status))) if !status.success() => {
                                warn!(?id, code = ?status.code(), "background command failed");
                            }
                            Ok((id, origin, Ok(status))) => {
                                debug!(?id, %origin, success = status.success(), code = ?status.code(), "reaped child");
                            }
                            Ok((id, origin, Err(err))) => {
                                warn!(?id, %origin, "unwaited command failed: {err}");
                            }
                            Err(err) => {
                                warn!("reaper lost a child: {err}");
                            }
                        }
                        counter.send_modify(|n| *n = n.saturating_sub(1));
                    }
                    else => break,
                }
            }

            trace!("reaper finished");
        });

        Self { tx, outstanding }
    }

    /// Hands a child over for collection. Never blocks.
    pub fn adopt(&self, child: PlumbChild, origin: Origin) {
        self.outstanding.send_modify(|n| *n += 1);

        if let Err(SendError((child, _))) = self.tx.send((child, origin)) {
            self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
            warn!(id = ?child.id(), "reaper is gone, child will not be collected");
        }
    }

    /// Number of adopted children not collected yet.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Waits until every adopted child has been collected.
    pub async fn settle(&self) {
        let mut rx = self.outstanding.subscribe();

        while *rx.borrow_and_update() != 0 {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}
