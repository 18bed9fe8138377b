//! Patch Merge Engine.
//!
//! [`merge`] rebuilds the tree depth-first and never touches its input.
//! Changes are indexed by target id and applied in change-list order.
//! Changes naming ids that are absent, or that sit under a removed node,
//! have no effect.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::element::ElementNode;

use super::change::{Change, InsertPosition};

/// Apply `changes` to `tree`, returning the edited copy.
pub fn merge(tree: &[ElementNode], changes: &[Change]) -> Vec<ElementNode> {
    let index = ChangeIndex::new(changes);
    let mut roots = build_children(tree, &index);
    apply_inserts(&mut roots, &index.root_inserts);
    roots
}

struct ChangeIndex<'a> {
    by_id: HashMap<&'a str, Vec<&'a Change>>,
    root_inserts: Vec<&'a Change>,
}

impl<'a> ChangeIndex<'a> {
    fn new(changes: &'a [Change]) -> Self {
        let mut by_id: HashMap<&str, Vec<&Change>> = HashMap::new();
        let mut root_inserts = Vec::new();
        for change in changes {
            match change.id.as_deref() {
                Some(id) => by_id.entry(id).or_default().push(change),
                None if change.insert_child.is_some() => root_inserts.push(change),
                None => debug!("Ignoring change without a target id"),
            }
        }
        Self {
            by_id,
            root_inserts,
        }
    }

    fn for_id(&self, id: &str) -> &[&'a Change] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn build_children(nodes: &[ElementNode], index: &ChangeIndex<'_>) -> Vec<ElementNode> {
    nodes
        .iter()
        .filter_map(|node| build_node(node, index))
        .collect()
}

fn build_node(node: &ElementNode, index: &ChangeIndex<'_>) -> Option<ElementNode> {
    let changes = index.for_id(&node.id);
    if changes.iter().any(|c| c.remove) {
        debug!(id = %node.id, "Removing element subtree");
        return None;
    }

    let mut built = without_children(node);
    let mut replaced_children = None;
    for change in changes {
        apply_edit(&mut built, change);
        if let Some(children) = &change.children {
            replaced_children = Some(children);
        }
    }

    let is_container = node.kind.is_container();
    built.children = match replaced_children {
        Some(children) if is_container => children.clone(),
        Some(_) => {
            debug!(id = %node.id, kind = %node.kind, "Ignoring children for leaf element");
            build_children(&node.children, index)
        }
        None => build_children(&node.children, index),
    };

    let inserts: Vec<&Change> = changes
        .iter()
        .copied()
        .filter(|c| c.insert_child.is_some())
        .collect();
    if !inserts.is_empty() {
        if is_container {
            apply_inserts(&mut built.children, &inserts);
        } else {
            debug!(id = %node.id, kind = %node.kind, "Ignoring insert into leaf element");
        }
    }

    Some(built)
}

/// Shallow-merge `style`/`props`, replace the wholesale fields present.
fn apply_edit(node: &mut ElementNode, change: &Change) {
    if let Some(style) = &change.style {
        node.style
            .extend(style.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(props) = &change.props {
        node.props
            .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(action) = &change.action {
        node.action = Some(action.clone());
    }
    if let Some(actions) = &change.actions {
        node.actions = Some(actions.clone());
    }
    if let Some(visible_when) = &change.visible_when {
        node.visible_when = Some(visible_when.clone());
    }
    if let Some(conditions) = &change.conditions {
        node.conditions = Some(conditions.clone());
    }
    if let Some(entrance) = &change.entrance {
        node.entrance = Some(entrance.clone());
    }
    if let Some(text_animation) = &change.text_animation {
        node.text_animation = Some(text_animation.clone());
    }
    if let Some(interactive) = &change.interactive {
        node.interactive = Some(interactive.clone());
    }
}

/// Insert into an already-built child list.
///
/// `first` inserts go to the front and `before:`/`after:` inserts land next
/// to their anchor in one pass, each group keeping change order. Everything
/// else, including inserts whose anchor is missing, is appended. An element
/// whose id is already among the children is skipped.
fn apply_inserts(children: &mut Vec<ElementNode>, inserts: &[&Change]) {
    let mut present: HashSet<String> = children.iter().map(|c| c.id.clone()).collect();
    let mut first = Vec::new();
    let mut before: HashMap<String, Vec<ElementNode>> = HashMap::new();
    let mut after: HashMap<String, Vec<ElementNode>> = HashMap::new();
    let mut tail = Vec::new();

    for change in inserts {
        let Some(element) = change.inserted() else {
            continue;
        };
        if !present.insert(element.id.clone()) {
            debug!(id = %element.id, "Skipping insert of an element already present");
            continue;
        }
        let element = element.clone();
        match change.insert_position() {
            InsertPosition::First => first.push(element),
            InsertPosition::Before(anchor) if has_child(children, &anchor) => {
                before.entry(anchor).or_default().push(element)
            }
            InsertPosition::After(anchor) if has_child(children, &anchor) => {
                after.entry(anchor).or_default().push(element)
            }
            _ => tail.push(element),
        }
    }

    let existing = std::mem::take(children);
    children.reserve(existing.len() + first.len() + tail.len());
    children.extend(first);
    for child in existing {
        if let Some(nodes) = before.remove(&child.id) {
            children.extend(nodes);
        }
        let anchor = child.id.clone();
        children.push(child);
        if let Some(nodes) = after.remove(&anchor) {
            children.extend(nodes);
        }
    }
    children.extend(tail);
}

fn has_child(children: &[ElementNode], id: &str) -> bool {
    children.iter().any(|c| c.id == id)
}

fn without_children(node: &ElementNode) -> ElementNode {
    ElementNode {
        id: node.id.clone(),
        kind: node.kind,
        style: node.style.clone(),
        props: node.props.clone(),
        children: Vec::new(),
        position: node.position.clone(),
        action: node.action.clone(),
        actions: node.actions.clone(),
        visible_when: node.visible_when.clone(),
        conditions: node.conditions.clone(),
        entrance: node.entrance.clone(),
        text_animation: node.text_animation.clone(),
        interactive: node.interactive.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::element::{Action, ElementKind, find_node};

    fn ids(nodes: &[ElementNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn tree() -> Vec<ElementNode> {
        vec![
            ElementNode::new("root", ElementKind::VStack).with_children(vec![
                ElementNode::text("title", "Welcome").with_style("fontSize", json!(28)),
                ElementNode::new("card", ElementKind::HStack)
                    .with_children(vec![ElementNode::text("caption", "inside")]),
                ElementNode::text("footer", "bye"),
            ]),
        ]
    }

    #[test]
    fn empty_changes_are_identity() {
        let original = tree();
        assert_eq!(merge(&original, &[]), original);
    }

    #[test]
    fn remove_drops_subtree_and_descendant_changes() {
        let original = tree();
        let changes = vec![
            Change::remove("card"),
            Change::target("caption").with_prop("text", json!("changed")),
            Change::insert(
                Some("card"),
                ElementNode::text("late", "x"),
                InsertPosition::Last,
            ),
        ];
        let merged = merge(&original, &changes);

        assert_eq!(ids(&merged[0].children), ["title", "footer"]);
        assert!(find_node(&merged, "caption").is_none());
        assert!(find_node(&merged, "late").is_none());
        // input untouched
        assert!(find_node(&original, "card").is_some());
    }

    #[test]
    fn insert_first_shifts_children_right() {
        let merged = merge(
            &tree(),
            &[Change::insert(
                Some("root"),
                ElementNode::new("new", ElementKind::Divider),
                InsertPosition::First,
            )],
        );
        assert_eq!(ids(&merged[0].children), ["new", "title", "card", "footer"]);
    }

    #[test]
    fn anchored_inserts_in_one_pass() {
        let changes = vec![
            Change::insert(
                Some("root"),
                ElementNode::text("a1", "x"),
                InsertPosition::After("title".into()),
            ),
            Change::insert(
                Some("root"),
                ElementNode::text("a2", "x"),
                InsertPosition::After("title".into()),
            ),
            Change::insert(
                Some("root"),
                ElementNode::text("b1", "x"),
                InsertPosition::Before("footer".into()),
            ),
            Change::insert(
                Some("root"),
                ElementNode::text("lost", "x"),
                InsertPosition::Before("missing".into()),
            ),
        ];
        let merged = merge(&tree(), &changes);
        assert_eq!(
            ids(&merged[0].children),
            ["title", "a1", "a2", "card", "b1", "footer", "lost"]
        );
    }

    #[test]
    fn duplicate_insert_is_skipped() {
        let changes = vec![
            Change::insert(
                Some("root"),
                ElementNode::text("cta", "x"),
                InsertPosition::After("title".into()),
            ),
            Change::insert(Some("root"), ElementNode::text("cta", "x"), InsertPosition::Last),
            Change::insert(Some("root"), ElementNode::text("footer", "x"), InsertPosition::Last),
        ];
        let merged = merge(&tree(), &changes);
        assert_eq!(ids(&merged[0].children), ["title", "cta", "card", "footer"]);
    }

    #[test]
    fn style_and_props_merge_shallowly() {
        let merged = merge(
            &tree(),
            &[Change::target("title")
                .with_style("color", json!("#ffffff"))
                .with_prop("text", json!("Hello"))],
        );
        let title = find_node(&merged, "title").unwrap();
        assert_eq!(title.style["fontSize"], 28);
        assert_eq!(title.style["color"], "#ffffff");
        assert_eq!(title.props["text"], "Hello");
    }

    #[test]
    fn wholesale_fields_replace() {
        let original = vec![
            ElementNode::new("cta", ElementKind::HStack)
                .with_action(Action::Tap)
                .with_visible_when("plan", Some("pro")),
        ];
        let change = Change {
            action: Some(Action::Dismiss),
            visible_when: Some(crate::element::VisibleWhen {
                group: "tier".into(),
                selected: None,
            }),
            ..Change::target("cta")
        };
        let merged = merge(&original, &[change]);
        assert_eq!(merged[0].action, Some(Action::Dismiss));
        assert_eq!(merged[0].visible_when.as_ref().unwrap().group, "tier");
        assert!(merged[0].visible_when.as_ref().unwrap().selected.is_none());
    }

    #[test]
    fn children_replacement_does_not_recurse() {
        let changes = vec![
            Change::target("card").with_children(vec![ElementNode::text("fresh", "new")]),
            Change::target("fresh").with_prop("text", json!("not applied")),
        ];
        let merged = merge(&tree(), &changes);
        let card = find_node(&merged, "card").unwrap();
        assert_eq!(ids(&card.children), ["fresh"]);
        assert_eq!(card.children[0].props["text"], "new");
    }

    #[test]
    fn leaf_targets_ignore_structure_changes() {
        let changes = vec![
            Change::target("title").with_children(vec![ElementNode::text("x", "x")]),
            Change::insert(Some("footer"), ElementNode::text("y", "y"), InsertPosition::Last),
        ];
        let merged = merge(&tree(), &changes);
        assert!(find_node(&merged, "title").unwrap().children.is_empty());
        assert!(find_node(&merged, "y").is_none());
    }

    #[test]
    fn root_level_insert_appends() {
        let merged = merge(
            &tree(),
            &[Change::insert(
                None,
                ElementNode::new("banner", ElementKind::ZStack),
                InsertPosition::Last,
            )],
        );
        assert_eq!(ids(&merged), ["root", "banner"]);
    }

    #[test]
    fn missing_targets_are_no_ops() {
        let original = tree();
        let merged = merge(
            &original,
            &[
                Change::target("ghost").with_prop("text", json!("boo")),
                Change::remove("phantom"),
            ],
        );
        assert_eq!(merged, original);
    }
}
