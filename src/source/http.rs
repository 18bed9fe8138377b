//! HTTP screen source.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SourceError;

use super::{FlowConfig, ScreenSource, VariantAssignment};

/// Fetches `GET {url}` for the flow and
/// `GET {url}/experiments/{id}/assignment?user_id=` for variants.
pub struct HttpScreenSource {
    url: String,
    client: reqwest::Client,
}

impl HttpScreenSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// `Ok(Err(status))` for a 404 or 204, which carry no body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Result<T, u16>, SourceError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Err(status.as_u16()));
        }
        if !status.is_success() {
            return Err(SourceError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| SourceError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Ok(serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl ScreenSource for HttpScreenSource {
    async fn fetch(&self) -> Result<FlowConfig, SourceError> {
        debug!(url = %self.url, "Fetching screen source");
        self.get_json(&self.url, &[])
            .await?
            .map_err(|status| SourceError::Empty {
                url: self.url.clone(),
                status,
            })
    }

    async fn assign_variant(
        &self,
        experiment_id: &str,
        user_id: &str,
    ) -> Result<Option<VariantAssignment>, SourceError> {
        let url = format!("{}/experiments/{experiment_id}/assignment", self.url);
        Ok(self.get_json(&url, &[("user_id", user_id)]).await?.ok())
    }
}
