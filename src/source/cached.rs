//! Last-good fallback around another screen source.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::SourceError;

use super::{FlowConfig, ScreenSource, VariantAssignment};

/// Remembers the last successful fetch in memory and, optionally, in a JSON
/// cache file. When the inner source fails the cached config is served.
pub struct CachedScreenSource<S> {
    inner: S,
    cache_path: Option<PathBuf>,
    last_good: RwLock<Option<FlowConfig>>,
}

impl<S: ScreenSource> CachedScreenSource<S> {
    pub fn new(inner: S, cache_path: Option<PathBuf>) -> Self {
        Self {
            inner,
            cache_path,
            last_good: RwLock::new(None),
        }
    }

    async fn store(&self, config: &FlowConfig) {
        *self.last_good.write().await = Some(config.clone());

        let Some(path) = &self.cache_path else {
            return;
        };
        let write = async {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            let json = serde_json::to_vec(config)?;
            tokio::fs::write(path, json).await?;
            Ok::<_, SourceError>(())
        };
        if let Err(e) = write.await {
            warn!(path = %path.display(), error = %e, "Could not write screen source cache");
        }
    }

    async fn load_cached(&self) -> Option<FlowConfig> {
        if let Some(config) = self.last_good.read().await.clone() {
            return Some(config);
        }
        let path = self.cache_path.as_ref()?;
        let raw = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable screen source cache");
                None
            }
        }
    }
}

#[async_trait]
impl<S: ScreenSource> ScreenSource for CachedScreenSource<S> {
    async fn fetch(&self) -> Result<FlowConfig, SourceError> {
        match self.inner.fetch().await {
            Ok(config) => {
                self.store(&config).await;
                Ok(config)
            }
            Err(e) => match self.load_cached().await {
                Some(config) => {
                    info!(error = %e, "Screen source unavailable, using cached screens");
                    Ok(config)
                }
                None => Err(SourceError::NoCache(Box::new(e))),
            },
        }
    }

    async fn assign_variant(
        &self,
        experiment_id: &str,
        user_id: &str,
    ) -> Result<Option<VariantAssignment>, SourceError> {
        self.inner.assign_variant(experiment_id, user_id).await
    }
}
