//! Variable-driven resolution: templates, conditions, and destinations.

pub mod condition;
pub mod destination;
pub mod template;

pub use condition::{Condition, Operator, evaluate};
pub use destination::{
    ConditionalDestination, ConditionalRoutes, Destination, NavTarget, Route, resolve_destination,
};
pub use template::{resolve_template, template_tokens};
