//! Assistant response documents.

use serde::{Deserialize, Serialize};

use crate::element::ElementNode;
use crate::patch::Change;

/// Discriminator of a response document, available before the document is
/// complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Message,
    Edit,
    Generation,
}

impl ResponseKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "message" => Some(Self::Message),
            "edit" => Some(Self::Edit),
            "generation" => Some(Self::Generation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Edit => write!(f, "edit"),
            Self::Generation => write!(f, "generation"),
        }
    }
}

/// One complete response document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistResponse {
    Message {
        #[serde(default)]
        content: String,
    },
    Edit {
        #[serde(default)]
        changes: Vec<Change>,
        #[serde(default)]
        message: String,
    },
    Generation {
        #[serde(default)]
        elements: Vec<ElementNode>,
        #[serde(default)]
        message: String,
    },
}

impl AssistResponse {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Message { .. } => ResponseKind::Message,
            Self::Edit { .. } => ResponseKind::Edit,
            Self::Generation { .. } => ResponseKind::Generation,
        }
    }

    /// Text to show the user alongside the result.
    pub fn message(&self) -> &str {
        match self {
            Self::Message { content } => content,
            Self::Edit { message, .. } | Self::Generation { message, .. } => message,
        }
    }
}
