//! Executes shell-style command trees (simple commands, pipelines,
//! redirections and sequences) over real OS processes.
//!
//! The stream bindings every node runs against are an explicit [`Streams`]
//! value handed down the tree, so the orchestrator's own descriptors are never
//! rebound and independent runs can share a process.

#[macro_use]
extern crate tracing;

pub mod cmd;
pub mod config;
pub mod error;
pub mod prelude;
pub mod process;

pub use cmd::{
    command_tree::{
        CommandNode, ConditionalChain, ConditionalOp, Direction, PlainChain, PlainOp, Redirection,
        Sequence,
    },
    execute::Engine,
};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError};
pub use process::{
    child::PlumbChild,
    reaper::{Origin, Reaper},
    status::{PlumbExitStatus, SyntheticStatus},
    streams::{Binding, Pipe, Streams},
    Completion,
};
