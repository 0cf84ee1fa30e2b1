//! Common type definitions and aliases.

mod aliases;

pub use aliases::*;
