//! AssistEditor: applies assistant responses to an element tree.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use crate::element::{ElementNode, sanitize_for_assist, validate_tree};
use crate::error::AssistError;
use crate::patch::merge;

use super::endpoint::{AssistRequest, ChatTurn, GenerationEndpoint};
use super::response::{AssistResponse, ResponseKind};
use super::stream::StreamAssembler;

/// Holds the tree being edited and the conversation so far. A failed
/// exchange leaves both untouched.
pub struct AssistEditor {
    endpoint: Arc<dyn GenerationEndpoint>,
    tree: Vec<ElementNode>,
    history: Vec<ChatTurn>,
    variables: Vec<String>,
    assets: Vec<String>,
}

impl AssistEditor {
    pub fn new(endpoint: Arc<dyn GenerationEndpoint>, tree: Vec<ElementNode>) -> Self {
        Self {
            endpoint,
            tree,
            history: Vec::new(),
            variables: Vec::new(),
            assets: Vec::new(),
        }
    }

    pub fn with_variables(mut self, names: Vec<String>) -> Self {
        self.variables = names;
        self
    }

    pub fn with_assets(mut self, names: Vec<String>) -> Self {
        self.assets = names;
        self
    }

    pub fn tree(&self) -> &[ElementNode] {
        &self.tree
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Run one exchange. `on_kind` fires once, as soon as the response type
    /// is known.
    pub async fn send<F>(&mut self, prompt: &str, mut on_kind: F) -> Result<AssistResponse, AssistError>
    where
        F: FnMut(ResponseKind),
    {
        let request = AssistRequest {
            prompt: prompt.to_string(),
            tree: sanitize_for_assist(&self.tree),
            history: self.history.clone(),
            variables: self.variables.clone(),
            assets: self.assets.clone(),
        };

        let mut stream = self.endpoint.stream(&request).await?;
        let mut assembler = StreamAssembler::new();
        while let Some(chunk) = stream.next().await {
            if let Some(kind) = assembler.push(&chunk?) {
                on_kind(kind);
            }
        }

        let response = assembler.finish().inspect_err(|e| {
            warn!(error = %e, "Assist response rejected, tree unchanged");
        })?;

        match &response {
            AssistResponse::Message { .. } => {}
            AssistResponse::Edit { changes, .. } => {
                let merged = merge(&self.tree, changes);
                validate_tree(&merged)?;
                info!(changes = changes.len(), "Applied assist edit");
                self.tree = merged;
            }
            AssistResponse::Generation { elements, .. } => {
                validate_tree(elements)?;
                info!(elements = elements.len(), "Replaced tree with generated elements");
                self.tree = elements.clone();
            }
        }

        self.history.push(ChatTurn::user(prompt));
        self.history.push(ChatTurn::assistant(response.message()));
        Ok(response)
    }
}
