//! Local JSON file screen source.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SourceError;

use super::{FlowConfig, ScreenSource};

/// Reads a [`FlowConfig`] from a JSON file on every fetch.
pub struct FileScreenSource {
    path: PathBuf,
}

impl FileScreenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScreenSource for FileScreenSource {
    async fn fetch(&self) -> Result<FlowConfig, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
