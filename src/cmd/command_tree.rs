use std::{fmt, path::PathBuf};

use itertools::Itertools;
use strum::Display;

use crate::error::EngineError;

/// One node of a command tree. Trees are built by the caller and only read by
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandNode {
    /// A single program invocation, `argv[0]` is the program.
    Simple(Vec<String>),
    /// Stages connected stdout-to-stdin, left to right.
    Pipeline(Vec<CommandNode>),
    Sequence(Sequence),
    Redirect(Redirection),
}

/// Rebinds exactly one standard stream around `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub direction: Direction,
    pub path: PathBuf,
    pub target: Box<CommandNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    Append,
}

impl Direction {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Input => "<",
            Self::Output => ">",
            Self::Append => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sequence {
    /// Every item carries the operator that governs how that item runs.
    Plain(Vec<(CommandNode, PlainOp)>),
    /// Operators sit between items, so there is always one fewer operator
    /// than there are items.
    Conditional {
        head: Box<CommandNode>,
        tail: Vec<(ConditionalOp, CommandNode)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PlainOp {
    #[strum(serialize = ";")]
    Sequential,
    #[strum(serialize = "&")]
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConditionalOp {
    #[strum(serialize = "&&")]
    Conjunction,
    #[strum(serialize = "||")]
    Disjunction,
}

impl CommandNode {
    pub fn simple<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Simple(argv.into_iter().map(Into::into).collect())
    }

    pub fn pipeline(stages: impl IntoIterator<Item = CommandNode>) -> Self {
        Self::Pipeline(stages.into_iter().collect())
    }

    /// Wraps `self` in a redirection of one standard stream to `path`.
    pub fn redirect(self, direction: Direction, path: impl Into<PathBuf>) -> Self {
        Self::Redirect(Redirection {
            direction,
            path: path.into(),
            target: Box::new(self),
        })
    }

    pub fn plain() -> PlainChain {
        PlainChain::default()
    }

    pub fn conditional(head: CommandNode) -> ConditionalChain {
        ConditionalChain {
            head,
            tail: Vec::new(),
        }
    }

    /// Whether dispatching this node awaits a process or a file open before
    /// returning. Opening a redirect target can wait indefinitely (a FIFO with
    /// no peer), so every redirect counts.
    pub fn blocks(&self) -> bool {
        match self {
            Self::Simple(_) => false,
            Self::Sequence(_) | Self::Redirect(_) => true,
            // non-final stages that block are detached by the chainer
            Self::Pipeline(stages) => stages.last().map_or(false, CommandNode::blocks),
        }
    }

    /// Checks the shape invariants of the whole tree.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Self::Simple(argv) if argv.is_empty() => {
                Err(EngineError::InvalidTree("simple command with empty argv".into()))
            }
            Self::Simple(_) => Ok(()),
            Self::Pipeline(stages) if stages.is_empty() => {
                Err(EngineError::InvalidTree("pipeline with no stages".into()))
            }
            Self::Pipeline(stages) => stages.iter().try_for_each(CommandNode::validate),
            Self::Redirect(redirect) => redirect.target.validate(),
            Self::Sequence(Sequence::Plain(items)) if items.is_empty() => {
                Err(EngineError::InvalidTree("sequence with no items".into()))
            }
            Self::Sequence(Sequence::Plain(items)) => {
                items.iter().try_for_each(|(node, _)| node.validate())
            }
            Self::Sequence(Sequence::Conditional { head, tail }) => {
                head.validate()?;
                tail.iter().try_for_each(|(_, node)| node.validate())
            }
        }
    }
}

/// Builder for [`Sequence::Plain`].
#[derive(Debug, Default)]
pub struct PlainChain {
    items: Vec<(CommandNode, PlainOp)>,
}

impl PlainChain {
    pub fn then(mut self, node: CommandNode) -> Self {
        self.items.push((node, PlainOp::Sequential));
        self
    }

    pub fn background(mut self, node: CommandNode) -> Self {
        self.items.push((node, PlainOp::Background));
        self
    }

    pub fn build(self) -> CommandNode {
        CommandNode::Sequence(Sequence::Plain(self.items))
    }
}

/// Builder for [`Sequence::Conditional`].
#[derive(Debug)]
pub struct ConditionalChain {
    head: CommandNode,
    tail: Vec<(ConditionalOp, CommandNode)>,
}

impl ConditionalChain {
    pub fn and(mut self, node: CommandNode) -> Self {
        self.tail.push((ConditionalOp::Conjunction, node));
        self
    }

    pub fn or(mut self, node: CommandNode) -> Self {
        self.tail.push((ConditionalOp::Disjunction, node));
        self
    }

    pub fn build(self) -> CommandNode {
        CommandNode::Sequence(Sequence::Conditional {
            head: Box::new(self.head),
            tail: self.tail,
        })
    }
}

struct Operand<'a>(&'a CommandNode);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            CommandNode::Sequence(_) => write!(f, "({})", self.0),
            node => write!(f, "{node}"),
        }
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(argv) => write!(f, "{}", argv.iter().join(" ")),
            Self::Pipeline(stages) => write!(f, "{}", stages.iter().map(Operand).join(" | ")),
            Self::Redirect(redirect) => write!(
                f,
                "{} {} {}",
                Operand(&redirect.target),
                redirect.direction.symbol(),
                redirect.path.display()
            ),
            Self::Sequence(Sequence::Plain(items)) => {
                let last = items.len().saturating_sub(1);
                let mut rendered = items.iter().enumerate().map(|(i, (node, op))| match op {
                    PlainOp::Sequential if i == last => Operand(node).to_string(),
                    op => format!("{} {op}", Operand(node)),
                });
                write!(f, "{}", rendered.join(" "))
            }
            Self::Sequence(Sequence::Conditional { head, tail }) => {
                write!(f, "{}", Operand(head))?;
                for (op, node) in tail {
                    write!(f, " {op} {}", Operand(node))?;
                }
                Ok(())
            }
        }
    }
}
