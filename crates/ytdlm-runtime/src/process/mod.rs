//! Captured child processes.
//!
//! # Structure
//!
//! - `command` - [`CapturedProcess`]: spawn with piped output in its own process group
//! - `stream` - lossy UTF-8 line readers feeding a shared channel
//! - `shutdown` - process-tree termination with bounded grace

mod command;
mod shutdown;
mod stream;

pub use command::CapturedProcess;
pub use shutdown::{TerminateError, terminate_tree};
pub use stream::{OutputLine, StreamKind, spawn_line_reader};
