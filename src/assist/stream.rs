//! Streaming Response Assembler.
//!
//! Accumulates one response document from text chunks, classifies it early
//! from the top-level `type` key, and on [`StreamAssembler::finish`] parses
//! it, repairing the text first only when the stream says it was truncated.

use tracing::{debug, info, warn};

use crate::error::AssistError;

use super::repair::repair_truncated_json;
use super::response::{AssistResponse, ResponseKind};
use super::scanner::KeyScanner;

/// Trailing marker of a stream that ended normally.
pub const COMPLETE_MARKER: &str = "[[STREAM_END:complete]]";
/// Trailing marker of a stream cut off at the size limit.
pub const TRUNCATED_MARKER: &str = "[[STREAM_END:truncated]]";

/// How the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Complete,
    Truncated,
    /// No marker arrived. Treated like `Complete`.
    Unmarked,
}

pub struct StreamAssembler {
    buffer: String,
    scanner: KeyScanner,
    kind: Option<ResponseKind>,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            scanner: KeyScanner::new("type"),
            kind: None,
        }
    }

    /// Append a chunk. Returns the provisional kind the first time it is known.
    pub fn push(&mut self, chunk: &str) -> Option<ResponseKind> {
        self.buffer.push_str(chunk);
        let raw = self.scanner.push(chunk)?;
        match ResponseKind::parse(raw) {
            Some(kind) => {
                debug!(kind = %kind, buffered = self.buffer.len(), "Response classified");
                self.kind = Some(kind);
                Some(kind)
            }
            None => {
                warn!(raw_type = raw, "Response has an unknown type");
                None
            }
        }
    }

    pub fn kind(&self) -> Option<ResponseKind> {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Parse the accumulated document.
    pub fn finish(self) -> Result<AssistResponse, AssistError> {
        let (body, termination) = split_marker(&self.buffer);
        let candidate = extract_document(strip_code_fence(body)).ok_or(AssistError::NoDocument)?;

        match serde_json::from_str::<AssistResponse>(candidate) {
            Ok(response) => Ok(response),
            Err(e) if termination == Termination::Truncated => {
                info!(error = %e, len = candidate.len(), "Repairing truncated response");
                let repaired = repair_truncated_json(candidate);
                serde_json::from_str(&repaired).map_err(|e| AssistError::Unrepairable(e.to_string()))
            }
            Err(e) => Err(AssistError::Parse(e.to_string())),
        }
    }
}

/// Split off a trailing completion marker.
pub fn split_marker(text: &str) -> (&str, Termination) {
    let trimmed = text.trim_end();
    if let Some(body) = trimmed.strip_suffix(TRUNCATED_MARKER) {
        return (body, Termination::Truncated);
    }
    if let Some(body) = trimmed.strip_suffix(COMPLETE_MARKER) {
        return (body, Termination::Complete);
    }
    (trimmed, Termination::Unmarked)
}

/// Inner text of a markdown code fence, if the text is wrapped in one. An
/// unterminated fence yields everything after its opening line.
///
/// A fence only counts when it opens before the document's first `{`, so
/// backticks inside string content are left alone. The closing fence is the
/// last one with no `}` after it.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    if trimmed.find('{').is_some_and(|brace| brace < start) {
        return trimmed;
    }
    let after = &trimmed[start + 3..];
    // Drop the language tag line
    let after = match after.find('\n') {
        Some(nl) if !after[..nl].contains('{') => &after[nl + 1..],
        _ => after,
    };
    match after.rfind("```") {
        Some(end) if !after[end + 3..].contains('}') => after[..end].trim(),
        _ => after.trim(),
    }
}

/// First `{` through last `}`. Without a closing brace after the first `{`,
/// runs to the end of the text.
pub fn extract_document(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(chunks: &[&str]) -> (Vec<ResponseKind>, Result<AssistResponse, AssistError>) {
        let mut assembler = StreamAssembler::new();
        let kinds = chunks.iter().filter_map(|c| assembler.push(c)).collect();
        (kinds, assembler.finish())
    }

    #[test]
    fn classifies_before_document_completes() {
        let mut assembler = StreamAssembler::new();
        assert_eq!(assembler.push(r#"{"type":"#), None);
        assert_eq!(assembler.push(r#" "edit", "chan"#), Some(ResponseKind::Edit));
        assert_eq!(assembler.kind(), Some(ResponseKind::Edit));
        assert_eq!(assembler.push(r#"ges": []}"#), None);
    }

    #[test]
    fn parses_fenced_document_with_marker() {
        let (kinds, result) = assemble(&[
            "```json\n",
            r#"{"type": "message", "content": "Hello"}"#,
            "\n```\n",
            COMPLETE_MARKER,
        ]);
        assert_eq!(kinds, [ResponseKind::Message]);
        assert_eq!(result.unwrap().message(), "Hello");
    }

    #[test]
    fn repairs_only_when_truncated() {
        let cut = r#"{"type": "edit", "changes": [{"id": "title", "props": {"text": "A"}}, {"id": "cta", "sty"#;

        let (_, repaired) = assemble(&[cut, "\n", TRUNCATED_MARKER]);
        match repaired.unwrap() {
            AssistResponse::Edit { changes, .. } => {
                assert_eq!(changes.len(), 1);
                assert_eq!(changes[0].id.as_deref(), Some("title"));
            }
            other => panic!("expected edit, got {other:?}"),
        }

        let (_, complete) = assemble(&[cut, COMPLETE_MARKER]);
        assert!(matches!(complete, Err(AssistError::Parse(_))));

        let (_, unmarked) = assemble(&[cut]);
        assert!(matches!(unmarked, Err(AssistError::Parse(_))));
    }

    #[test]
    fn unrepairable_truncation_is_an_error() {
        let (_, result) = assemble(&[r#"{"ty"#, TRUNCATED_MARKER]);
        assert!(matches!(result, Err(AssistError::Unrepairable(_))));
    }

    #[test]
    fn text_without_braces_has_no_document() {
        let (_, result) = assemble(&["I could not do that.", COMPLETE_MARKER]);
        assert!(matches!(result, Err(AssistError::NoDocument)));
    }

    #[test]
    fn fence_helpers() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1"), "{\"a\":1");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(extract_document("note {\"a\":{}} trailing"), Some("{\"a\":{}}"));
        assert_eq!(extract_document("{\"a\":[1"), Some("{\"a\":[1"));
    }

    #[test]
    fn backticks_inside_unfenced_document_are_content() {
        let doc = r#"{"type": "message", "content": "Use ```rust``` blocks"}"#;
        let (kinds, result) = assemble(&[doc, "\n", COMPLETE_MARKER]);
        assert_eq!(kinds, [ResponseKind::Message]);
        assert_eq!(result.unwrap().message(), "Use ```rust``` blocks");

        let prefixed = format!("Here you go: {doc}");
        assert_eq!(strip_code_fence(&prefixed), prefixed);
    }

    #[test]
    fn fenced_document_keeps_inner_backticks() {
        let (_, result) = assemble(&[
            "```json\n",
            r#"{"type": "message", "content": "Use ```x``` here"}"#,
            "\n```",
            COMPLETE_MARKER,
        ]);
        assert_eq!(result.unwrap().message(), "Use ```x``` here");

        let unterminated = "```json\n{\"content\": \"a ```x``` b\"}";
        assert_eq!(strip_code_fence(unterminated), "{\"content\": \"a ```x``` b\"}");
    }
}
