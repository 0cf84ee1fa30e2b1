//! Type aliases for commonly used complex types.
//!
//! The kernel is single-threaded: one event loop drives every emission, so shared state
//! uses `Rc<RefCell<T>>` rather than locks.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camflow_core::types::*;
//!
//! // Instead of: Rc<RefCell<Vec<String>>>
//! let log: SharedVec<String> = shared(Vec::new());
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
pub type Shared<T> = Rc<RefCell<T>>;

/// A shared vector for single-threaded collection management.
pub type SharedVec<T> = Rc<RefCell<Vec<T>>>;

/// An opaque object published across module boundaries, compared by identity.
pub type SharedAny = Rc<dyn Any>;

/// Progress callback used by path generators.
///
/// Receives the fraction of work done (`0.0..=1.0`); returning `true` requests that
/// generation stops early.
pub type ProgressCallback = Rc<dyn Fn(f64) -> bool>;

/// Create a new `Shared<T>` from a value.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Create a new shared object for the namespace or an extension section.
#[inline]
pub fn shared_any<T: Any>(value: T) -> SharedAny {
    Rc::new(value)
}
