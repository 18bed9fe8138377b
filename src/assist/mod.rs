//! AI-assisted editing: streamed responses, repair, and application to a tree.

pub mod editor;
pub mod endpoint;
pub mod repair;
pub mod response;
pub mod scanner;
pub mod stream;

pub use editor::AssistEditor;
pub use endpoint::{
    AssistRequest, ChatRole, ChatTurn, GenerationEndpoint, HttpGenerationEndpoint, TextStream,
    Utf8ChunkDecoder,
};
pub use repair::repair_truncated_json;
pub use response::{AssistResponse, ResponseKind};
pub use scanner::KeyScanner;
pub use stream::{COMPLETE_MARKER, StreamAssembler, TRUNCATED_MARKER, Termination};
