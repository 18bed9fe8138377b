//! AI generation endpoint seam.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AssistConfig;
use crate::element::ElementNode;
use crate::error::AssistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior exchange turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// What the endpoint receives for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistRequest {
    pub prompt: String,
    /// The current tree, sanitized.
    pub tree: Vec<ElementNode>,
    pub history: Vec<ChatTurn>,
    /// Names of the variables the flow defines.
    pub variables: Vec<String>,
    /// Names of the assets available to the flow.
    pub assets: Vec<String>,
}

/// Text chunks of one streamed response, ending with a completion marker.
pub type TextStream = BoxStream<'static, Result<String, AssistError>>;

#[async_trait]
pub trait GenerationEndpoint: Send + Sync {
    async fn stream(&self, request: &AssistRequest) -> Result<TextStream, AssistError>;
}

/// Streams a response from `POST {url}`.
pub struct HttpGenerationEndpoint {
    url: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpGenerationEndpoint {
    pub fn new(url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            url: url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AssistConfig) -> Self {
        Self::new(config.url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl GenerationEndpoint for HttpGenerationEndpoint {
    async fn stream(&self, request: &AssistRequest) -> Result<TextStream, AssistError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| AssistError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssistError::BadStatus {
                status: status.as_u16(),
            });
        }
        debug!(url = %self.url, "Generation stream opened");

        let mut decoder = Utf8ChunkDecoder::default();
        let stream = resp.bytes_stream().map(move |chunk| {
            let bytes = chunk.map_err(|e| AssistError::Stream(e.to_string()))?;
            Ok(decoder.push(&bytes))
        });
        Ok(stream.boxed())
    }
}

/// Decodes UTF-8 from byte chunks that may split a multi-byte character.
/// Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete trailing sequence, wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }
}
