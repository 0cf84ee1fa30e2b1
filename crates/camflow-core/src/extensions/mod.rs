//! # Extension Registry
//!
//! Weight-ordered extension points.
//!
//! - **Sections** hold contributions and are rebuilt (clear, then re-add everything in
//!   ascending weight) on every membership change.
//! - **Chains** hold callables that run in ascending weight on every `call_chain`, sharing
//!   one mutable argument.
//!
//! Equal weights keep insertion order.

mod chains;
mod sections;

pub use chains::*;
pub use sections::*;
