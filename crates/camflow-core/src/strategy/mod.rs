//! # Strategy Registry
//!
//! Named strategies per kind (`process`, `task`, ...), each with a label, a generator, a
//! schema of recognised parameters with their defaults, and a sort weight.
//!
//! - Process strategies turn a process, a tool radius and a bound box into a path generator
//!   plus the motion grid it follows.
//! - Task strategies run a whole task and produce a toolpath.
//!
//! Parameter groups connect a kind to whatever tracks its "current" values (a form, a CLI,
//! an in-memory [`ParameterState`]) so the registry never depends on presentation state.

mod generator;
mod parameters;
mod registry;

pub use generator::*;
pub use parameters::*;
pub use registry::*;

/// Kind of the strategies generating motion for processes
pub const PROCESS_KIND: &str = "process";

/// Kind of the strategies running tasks
pub const TASK_KIND: &str = "task";
