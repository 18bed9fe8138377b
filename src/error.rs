//! Error types for screenflow.

/// Top-level error type for the runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Screen source error: {0}")]
    Source(#[from] SourceError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Element tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Assist error: {0}")]
    Assist(#[from] AssistError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors fetching screen definitions.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Screen source returned HTTP {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Screen source at {url} has no flow (HTTP {status})")]
    Empty { url: String, status: u16 },

    #[error("Invalid screen definitions: {0}")]
    InvalidPayload(String),

    #[error("No cached screen source available after: {0}")]
    NoCache(Box<SourceError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flow session errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Flow failed to load: {0}")]
    LoadFailed(String),

    #[error("Flow has no navigable screens")]
    NoScreens,

    #[error("Flow is not ready (state: {state})")]
    NotReady { state: String },

    #[error("Element {id} not found on screen {screen_id}")]
    ElementNotFound { id: String, screen_id: String },

    #[error("Screen {screen_id} is not a custom component screen")]
    NotCustomScreen { screen_id: String },
}

/// Action side-effect errors.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Could not open {url}: {reason}")]
    LinkFailed { url: String, reason: String },
}

/// Element tree invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Duplicate element id: {id}")]
    DuplicateId { id: String },

    #[error("Element {id} of kind {kind} cannot have children")]
    LeafWithChildren { id: String, kind: String },
}

/// Analytics delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Analytics sink {sink} failed: {reason}")]
    SendFailed { sink: String, reason: String },

    #[error("Analytics queue is closed")]
    QueueClosed,
}

/// AI assistant exchange errors.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    #[error("Generation endpoint returned HTTP {status}")]
    BadStatus { status: u16 },

    #[error("Generation stream failed: {0}")]
    Stream(String),

    #[error("Response contains no JSON document")]
    NoDocument,

    #[error("Could not parse response: {0}")]
    Parse(String),

    #[error("Truncated response could not be repaired: {0}")]
    Unrepairable(String),

    #[error("Response produced an invalid element tree: {0}")]
    InvalidTree(#[from] TreeError),
}

/// Result type alias for the runtime.
pub type Result<T> = std::result::Result<T, Error>;
