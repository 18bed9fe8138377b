//! Generic depth-first traversal with ancestor path, plus the read-only
//! strategies built on it.

use std::collections::{BTreeSet, HashSet};

use crate::resolve::template_tokens;

use super::model::{Action, ElementNode};

/// What the walker should do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
    Stop,
}

/// A traversal strategy. `path` holds the ancestors of `node`, root first.
pub trait Visitor<'a> {
    fn visit(&mut self, node: &'a ElementNode, path: &[&'a ElementNode]) -> Walk;
}

/// Walk `roots` depth-first in document order.
pub fn walk<'a, V: Visitor<'a>>(roots: &'a [ElementNode], visitor: &mut V) {
    let mut path = Vec::new();
    for root in roots {
        if !walk_node(root, &mut path, visitor) {
            return;
        }
    }
}

fn walk_node<'a, V: Visitor<'a>>(
    node: &'a ElementNode,
    path: &mut Vec<&'a ElementNode>,
    visitor: &mut V,
) -> bool {
    match visitor.visit(node, path) {
        Walk::Stop => return false,
        Walk::SkipChildren => return true,
        Walk::Continue => {}
    }
    path.push(node);
    for child in &node.children {
        if !walk_node(child, path, visitor) {
            path.pop();
            return false;
        }
    }
    path.pop();
    true
}

/// Finds a node by id, remembering its parent.
pub struct FindById<'a, 'q> {
    id: &'q str,
    pub found: Option<&'a ElementNode>,
    pub parent: Option<&'a ElementNode>,
}

impl<'a, 'q> FindById<'a, 'q> {
    pub fn new(id: &'q str) -> Self {
        Self {
            id,
            found: None,
            parent: None,
        }
    }
}

impl<'a> Visitor<'a> for FindById<'a, '_> {
    fn visit(&mut self, node: &'a ElementNode, path: &[&'a ElementNode]) -> Walk {
        if node.id == self.id {
            self.found = Some(node);
            self.parent = path.last().copied();
            Walk::Stop
        } else {
            Walk::Continue
        }
    }
}

/// Looks up a node by id.
pub fn find_node<'a>(roots: &'a [ElementNode], id: &str) -> Option<&'a ElementNode> {
    let mut finder = FindById::new(id);
    walk(roots, &mut finder);
    finder.found
}

/// Looks up the parent of a node. `None` for roots and missing ids.
pub fn parent_of<'a>(roots: &'a [ElementNode], id: &str) -> Option<&'a ElementNode> {
    let mut finder = FindById::new(id);
    walk(roots, &mut finder);
    finder.parent
}

/// Collects ids, recording any seen more than once.
#[derive(Default)]
pub struct IdCollector<'a> {
    pub seen: HashSet<&'a str>,
    pub duplicates: Vec<&'a str>,
}

impl<'a> Visitor<'a> for IdCollector<'a> {
    fn visit(&mut self, node: &'a ElementNode, _path: &[&'a ElementNode]) -> Walk {
        if !self.seen.insert(node.id.as_str()) {
            self.duplicates.push(node.id.as_str());
        }
        Walk::Continue
    }
}

/// Collects every variable name a tree reads or writes: `show_if`
/// conditions, `{token}` props, `set_variable` actions, and input keys.
#[derive(Default)]
pub struct VariableCollector {
    pub names: BTreeSet<String>,
}

impl<'a> Visitor<'a> for VariableCollector {
    fn visit(&mut self, node: &'a ElementNode, _path: &[&'a ElementNode]) -> Walk {
        if let Some(condition) = node.conditions.as_ref().and_then(|c| c.show_if.as_ref()) {
            condition.for_each_variable(&mut |name| {
                self.names.insert(name.to_string());
            });
        }
        for value in node.props.values() {
            if let Some(text) = value.as_str() {
                self.names
                    .extend(template_tokens(text).map(str::to_string));
            }
        }
        for action in node.all_actions() {
            if let Action::SetVariable { variable, .. } = action {
                self.names.insert(variable.clone());
            }
        }
        if node.kind == super::model::ElementKind::Input {
            self.names.insert(node.input_key().to_string());
        }
        Walk::Continue
    }
}

/// Variable names referenced anywhere in `roots`.
pub fn referenced_variables(roots: &[ElementNode]) -> BTreeSet<String> {
    let mut collector = VariableCollector::default();
    walk(roots, &mut collector);
    collector.names
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::element::ElementKind;
    use crate::resolve::Condition;

    fn tree() -> Vec<ElementNode> {
        vec![
            ElementNode::new("root", ElementKind::VStack).with_children(vec![
                ElementNode::text("title", "Hello {name}"),
                ElementNode::new("row", ElementKind::HStack).with_children(vec![
                    ElementNode::new("email", ElementKind::Input)
                        .with_prop("variable", json!("email")),
                ]),
            ]),
            ElementNode::text("footer", "bye")
                .with_show_if(Condition::leaf("plan", "equals", json!("pro"))),
        ]
    }

    struct Recorder(Vec<(String, usize)>);

    impl<'a> Visitor<'a> for Recorder {
        fn visit(&mut self, node: &'a ElementNode, path: &[&'a ElementNode]) -> Walk {
            self.0.push((node.id.clone(), path.len()));
            if node.id == "row" {
                Walk::SkipChildren
            } else {
                Walk::Continue
            }
        }
    }

    #[test]
    fn walks_in_document_order_with_depth() {
        let roots = tree();
        let mut recorder = Recorder(Vec::new());
        walk(&roots, &mut recorder);
        let visited: Vec<_> = recorder.0.iter().map(|(id, d)| (id.as_str(), *d)).collect();
        assert_eq!(
            visited,
            vec![("root", 0), ("title", 1), ("row", 1), ("footer", 0)]
        );
    }

    #[test]
    fn finds_node_and_parent() {
        let roots = tree();
        assert_eq!(find_node(&roots, "email").unwrap().kind, ElementKind::Input);
        assert_eq!(parent_of(&roots, "email").unwrap().id, "row");
        assert!(parent_of(&roots, "root").is_none());
        assert!(find_node(&roots, "nope").is_none());
    }

    #[test]
    fn collects_duplicate_ids() {
        let roots = vec![
            ElementNode::text("a", "x"),
            ElementNode::new("b", ElementKind::VStack)
                .with_children(vec![ElementNode::text("a", "y")]),
        ];
        let mut ids = IdCollector::default();
        walk(&roots, &mut ids);
        assert_eq!(ids.duplicates, vec!["a"]);
    }

    #[test]
    fn collects_referenced_variables() {
        let names = referenced_variables(&tree());
        let names: Vec<_> = names.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["email", "name", "plan"]);
    }
}
