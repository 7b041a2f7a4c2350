//! Console commands.
//!
//! Command is a request to the debugger that defines an action and a list of input arguments,
//! commands are produced by the [`parser`] from user input.

pub mod r#break;
pub mod parser;

use crate::debugger::Error;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parsing(String),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Render a dashboard with selected views, configured views if empty.
    Context(Vec<String>),
    StepInstruction,
    Continue,
    Breakpoint(r#break::Command),
    /// Dump `count` pointer-sized slots at an address.
    Telescope { addr: usize, count: Option<usize> },
    Help,
    Quit,
    SkipInput,
}
