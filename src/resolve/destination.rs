//! Destination Resolver: conditional navigation targets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::condition::{Condition, evaluate};

/// A concrete navigation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Next,
    Previous,
    Screen(String),
}

impl NavTarget {
    pub fn from_token(token: &str) -> Self {
        match token {
            "next" => Self::Next,
            "previous" => Self::Previous,
            id => Self::Screen(id.to_string()),
        }
    }
}

impl std::fmt::Display for NavTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Previous => write!(f, "previous"),
            Self::Screen(id) => write!(f, "{id}"),
        }
    }
}

/// A navigation target, possibly conditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Destination {
    Literal(String),
    Routes(ConditionalRoutes),
    Conditional(ConditionalDestination),
}

/// `{ if, then, else? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalDestination {
    #[serde(rename = "if")]
    pub condition: Condition,
    pub then: Box<Destination>,
    #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<Box<Destination>>,
}

/// `{ routes: [{condition, destination}], default }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRoutes {
    pub routes: Vec<Route>,
    pub default: Box<Destination>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub condition: Condition,
    pub destination: Destination,
}

impl Destination {
    pub fn literal(token: impl Into<String>) -> Self {
        Self::Literal(token.into())
    }

    /// The literal token, if this destination needs no evaluation.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(token) => Some(token),
            _ => None,
        }
    }
}

/// Resolve a destination to a concrete token.
///
/// `None` means no branch applied; callers fall back to [`NavTarget::Next`].
pub fn resolve_destination(
    destination: &Destination,
    variables: &Map<String, Value>,
) -> Option<NavTarget> {
    match destination {
        Destination::Literal(token) => Some(NavTarget::from_token(token)),
        Destination::Conditional(branch) => {
            if evaluate(&branch.condition, variables) {
                resolve_destination(&branch.then, variables)
            } else {
                branch
                    .otherwise
                    .as_deref()
                    .and_then(|d| resolve_destination(d, variables))
            }
        }
        Destination::Routes(table) => table
            .routes
            .iter()
            .find(|route| evaluate(&route.condition, variables))
            .map(|route| &route.destination)
            .map_or_else(
                || resolve_destination(&table.default, variables),
                |d| resolve_destination(d, variables),
            ),
    }
}
