//! Structured edits to element trees.

pub mod change;
pub mod merge;

pub use change::{Change, InsertChild, InsertPosition};
pub use merge::merge;
