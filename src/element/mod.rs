//! Element Tree Model: node/value types and tree-wide invariants.

pub mod model;
pub mod style;
pub mod visit;

pub use model::{Action, ElementConditions, ElementKind, ElementNode, VisibleWhen};
pub use style::{Alignment, Color, Dimension, EdgeInsets, ResolvedStyle};
pub use visit::{Visitor, Walk, find_node, parent_of, referenced_variables, walk};

use serde_json::Value;

use crate::error::TreeError;

/// Check the invariants of one screen's element roots: ids are unique and
/// only container kinds carry children.
pub fn validate_tree(roots: &[ElementNode]) -> Result<(), TreeError> {
    struct Validator<'a> {
        ids: visit::IdCollector<'a>,
        leaf_with_children: Option<&'a ElementNode>,
    }

    impl<'a> Visitor<'a> for Validator<'a> {
        fn visit(&mut self, node: &'a ElementNode, path: &[&'a ElementNode]) -> Walk {
            self.ids.visit(node, path);
            if !self.ids.duplicates.is_empty() {
                return Walk::Stop;
            }
            if !node.kind.is_container() && !node.children.is_empty() {
                self.leaf_with_children = Some(node);
                return Walk::Stop;
            }
            Walk::Continue
        }
    }

    let mut validator = Validator {
        ids: visit::IdCollector::default(),
        leaf_with_children: None,
    };
    walk(roots, &mut validator);

    if let Some(id) = validator.ids.duplicates.first() {
        return Err(TreeError::DuplicateId { id: id.to_string() });
    }
    if let Some(node) = validator.leaf_with_children {
        return Err(TreeError::LeafWithChildren {
            id: node.id.clone(),
            kind: node.kind.to_string(),
        });
    }
    Ok(())
}

/// Placeholder substituted for inline asset payloads.
pub const INLINE_ASSET_PLACEHOLDER: &str = "[inline asset]";

/// Copy of `roots` safe to send to the AI endpoint: inline `data:` payloads
/// are replaced by a placeholder and layout positions are dropped.
pub fn sanitize_for_assist(roots: &[ElementNode]) -> Vec<ElementNode> {
    roots.iter().map(sanitize_node).collect()
}

fn sanitize_node(node: &ElementNode) -> ElementNode {
    let mut clean = node.clone();
    clean.position = None;
    for value in clean.props.values_mut() {
        if value.as_str().is_some_and(|s| s.starts_with("data:")) {
            *value = Value::String(INLINE_ASSET_PLACEHOLDER.to_string());
        }
    }
    clean.children = node.children.iter().map(sanitize_node).collect();
    clean
}
