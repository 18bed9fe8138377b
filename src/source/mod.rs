//! Screen Source: where a flow's screen definitions come from.

pub mod cached;
pub mod file;
pub mod http;

pub use cached::CachedScreenSource;
pub use file::FileScreenSource;
pub use http::HttpScreenSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::flow::ScreenDefinition;

/// An experiment running on a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The payload of a screen-source fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub screens: Vec<ScreenDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiments: Vec<Experiment>,
}

/// A user's variant of an experiment, with its alternate screen list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAssignment {
    pub variant: String,
    pub screens: Vec<ScreenDefinition>,
}

/// Supplies screen definitions to a flow session.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// One-shot fetch of the flow's screens and active experiments.
    async fn fetch(&self) -> Result<FlowConfig, SourceError>;

    /// Variant assignment for `(experiment, user)`. `None` keeps the
    /// default screens.
    async fn assign_variant(
        &self,
        _experiment_id: &str,
        _user_id: &str,
    ) -> Result<Option<VariantAssignment>, SourceError> {
        Ok(None)
    }
}
