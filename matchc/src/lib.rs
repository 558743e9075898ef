//! A compiler for match expressions.
//!
//! Match sites dispatch on a scrutinee to one of several handlers, by the
//! value of a discriminant field, by a literal key, or by a sequence of guard
//! predicates. Each site is compiled into a decision tree suited to the shape
//! of its keys, and is checked for exhaustiveness against the static domain
//! of its scrutinee when one is known.

// Supporting modules
pub mod alloc;
pub mod files;
pub mod source;
pub mod symbol;

// Intermediate languages
pub mod core;
pub mod surface;

// Match compilation
pub mod domain;
pub mod matching;

// Top level API
pub mod driver;
pub mod pass;

pub use crate::driver::{Driver, Status};
