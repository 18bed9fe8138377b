//! screenflow: onboarding flow runtime.
//!
//! Renders server-authored, branching screen sequences over a session-scoped
//! Variable Store, and applies streamed AI edits to element trees.

pub mod actions;
pub mod analytics;
pub mod assist;
pub mod config;
pub mod element;
pub mod error;
pub mod flow;
pub mod patch;
pub mod resolve;
pub mod source;
pub mod variables;
