pub use tokio::sync::mpsc::{unbounded_channel, UnboundedSender as Sender};

pub use crate::error::EngineError;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
