//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Where screen definitions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Fetch over HTTP from this URL.
    Url(String),
    /// Read a local JSON file.
    File(PathBuf),
}

/// Analytics batching configuration.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Endpoint receiving batches. `None` logs batches instead.
    pub url: Option<String>,
    /// Flush as soon as this many records are buffered.
    pub batch_size: usize,
    /// Flush whatever is buffered on this interval.
    pub flush_interval: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            url: None,
            batch_size: 20,
            flush_interval: Duration::from_secs(10),
        }
    }
}

/// AI generation endpoint configuration.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub url: String,
    pub api_key: Option<SecretString>,
}

/// Runtime configuration for a flow host.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Screen source location.
    pub source: Option<SourceLocation>,
    /// Last-good screen source cache file.
    pub cache_path: Option<PathBuf>,
    /// User id attached to analytics and variant assignment.
    pub user_id: String,
    pub analytics: AnalyticsConfig,
    /// AI editing endpoint, if enabled.
    pub assist: Option<AssistConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            source: None,
            cache_path: None,
            user_id: "anonymous".to_string(),
            analytics: AnalyticsConfig::default(),
            assist: None,
        }
    }
}

impl RuntimeConfig {
    /// Build configuration from `SCREENFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let source = match (
            lookup("SCREENFLOW_SOURCE_URL"),
            lookup("SCREENFLOW_SOURCE_FILE"),
        ) {
            (Some(url), _) => Some(SourceLocation::Url(url)),
            (None, Some(path)) => Some(SourceLocation::File(PathBuf::from(path))),
            (None, None) => None,
        };

        let batch_size = match lookup("SCREENFLOW_ANALYTICS_BATCH_SIZE") {
            Some(raw) => parse_number::<usize>("SCREENFLOW_ANALYTICS_BATCH_SIZE", &raw)?,
            None => defaults.analytics.batch_size,
        };
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCREENFLOW_ANALYTICS_BATCH_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let flush_interval = match lookup("SCREENFLOW_ANALYTICS_FLUSH_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>(
                "SCREENFLOW_ANALYTICS_FLUSH_SECS",
                &raw,
            )?),
            None => defaults.analytics.flush_interval,
        };

        let assist = match lookup("SCREENFLOW_ASSIST_URL") {
            Some(url) => Some(AssistConfig {
                url,
                api_key: lookup("SCREENFLOW_ASSIST_KEY").map(SecretString::from),
            }),
            None => {
                if lookup("SCREENFLOW_ASSIST_KEY").is_some() {
                    return Err(ConfigError::MissingRequired {
                        key: "SCREENFLOW_ASSIST_URL".to_string(),
                        hint: "SCREENFLOW_ASSIST_KEY is set but no endpoint was given".to_string(),
                    });
                }
                None
            }
        };

        Ok(Self {
            source,
            cache_path: lookup("SCREENFLOW_CACHE_PATH").map(PathBuf::from),
            user_id: lookup("SCREENFLOW_USER_ID").unwrap_or(defaults.user_id),
            analytics: AnalyticsConfig {
                url: lookup("SCREENFLOW_ANALYTICS_URL"),
                batch_size,
                flush_interval,
            },
            assist,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got {raw:?}"),
    })
}
