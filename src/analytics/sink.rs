//! Analytics sinks: where flushed batches go.

use async_trait::async_trait;
use tracing::info;

use crate::error::AnalyticsError;

use super::record::AnalyticsRecord;

/// Receives batches of analytics records. Delivery is best-effort.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send_batch(&self, batch: &[AnalyticsRecord]) -> Result<(), AnalyticsError>;
}

/// Posts batches as `{"events": [...]}` to an HTTP endpoint.
pub struct HttpAnalyticsSink {
    url: String,
    client: reqwest::Client,
}

impl HttpAnalyticsSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn send_batch(&self, batch: &[AnalyticsRecord]) -> Result<(), AnalyticsError> {
        let body = serde_json::json!({ "events": batch });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalyticsError::SendFailed {
                sink: self.name().to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(AnalyticsError::SendFailed {
                sink: self.name().to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }
        Ok(())
    }
}

/// Writes batches to the tracing log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AnalyticsSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_batch(&self, batch: &[AnalyticsRecord]) -> Result<(), AnalyticsError> {
        for record in batch {
            info!(
                event = %record.event,
                session_id = %record.session_id,
                properties = %record.properties,
                "Analytics event"
            );
        }
        Ok(())
    }
}
