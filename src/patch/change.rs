//! Change records: id-targeted, partially-specified edits to an element tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::{Action, ElementConditions, ElementNode, VisibleWhen};

/// Where an inserted child goes among its parent's children.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InsertPosition {
    First,
    #[default]
    Last,
    Before(String),
    After(String),
}

impl From<String> for InsertPosition {
    /// Unrecognized positions append.
    fn from(raw: String) -> Self {
        let raw = raw.trim();
        if let Some(anchor) = raw.strip_prefix("before:") {
            return Self::Before(anchor.trim().to_string());
        }
        if let Some(anchor) = raw.strip_prefix("after:") {
            return Self::After(anchor.trim().to_string());
        }
        match raw {
            "first" => Self::First,
            _ => Self::Last,
        }
    }
}

impl From<InsertPosition> for String {
    fn from(position: InsertPosition) -> Self {
        match position {
            InsertPosition::First => "first".to_string(),
            InsertPosition::Last => "last".to_string(),
            InsertPosition::Before(id) => format!("before:{id}"),
            InsertPosition::After(id) => format!("after:{id}"),
        }
    }
}

/// The `insertChild` payload: `{ element, position? }` or a bare element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertChild {
    Anchored {
        element: ElementNode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<InsertPosition>,
    },
    Bare(ElementNode),
}

impl InsertChild {
    pub fn element(&self) -> &ElementNode {
        match self {
            Self::Anchored { element, .. } | Self::Bare(element) => element,
        }
    }
}

/// One edit. `id` names the target node, or the parent for `insertChild`.
/// Without an `id`, `insertChild` inserts at the root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub remove: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<VisibleWhen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ElementConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_animation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ElementNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_child: Option<InsertChild>,
    /// Position for a bare `insertChild`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<InsertPosition>,
}

impl Change {
    /// An empty change targeting `id`.
    pub fn target(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn remove(id: impl Into<String>) -> Self {
        Self {
            remove: true,
            ..Self::target(id)
        }
    }

    /// Insert `element` under `parent`, or at the root when `parent` is `None`.
    pub fn insert(parent: Option<&str>, element: ElementNode, position: InsertPosition) -> Self {
        Self {
            id: parent.map(str::to_string),
            insert_child: Some(InsertChild::Anchored {
                element,
                position: Some(position),
            }),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: Value) -> Self {
        self.style
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = Some(children);
        self
    }

    /// The element to insert, if any.
    pub fn inserted(&self) -> Option<&ElementNode> {
        self.insert_child.as_ref().map(InsertChild::element)
    }

    /// Effective insert position: the anchored one, else the change-level
    /// one, else `last`.
    pub fn insert_position(&self) -> InsertPosition {
        match &self.insert_child {
            Some(InsertChild::Anchored {
                position: Some(position),
                ..
            }) => position.clone(),
            _ => self.position.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_positions() {
        assert_eq!(InsertPosition::from("first".to_string()), InsertPosition::First);
        assert_eq!(
            InsertPosition::from("before:title".to_string()),
            InsertPosition::Before("title".into())
        );
        assert_eq!(
            InsertPosition::from("after: cta".to_string()),
            InsertPosition::After("cta".into())
        );
        assert_eq!(InsertPosition::from("middle".to_string()), InsertPosition::Last);
    }

    #[test]
    fn parses_both_insert_shapes() {
        let anchored: Change = serde_json::from_value(json!({
            "id": "root",
            "insertChild": {
                "element": {"id": "new", "type": "text"},
                "position": "after:title"
            }
        }))
        .unwrap();
        assert_eq!(anchored.inserted().unwrap().id, "new");
        assert_eq!(anchored.insert_position(), InsertPosition::After("title".into()));

        let bare: Change = serde_json::from_value(json!({
            "id": "root",
            "insertChild": {"id": "new", "type": "divider"},
            "position": "first"
        }))
        .unwrap();
        assert_eq!(bare.inserted().unwrap().id, "new");
        assert_eq!(bare.insert_position(), InsertPosition::First);
    }

    #[test]
    fn parses_partial_edit() {
        let change: Change = serde_json::from_value(json!({
            "id": "cta",
            "style": {"backgroundColor": "#ff0000"},
            "textAnimation": {"kind": "fade"},
            "visibleWhen": {"group": "plan"}
        }))
        .unwrap();
        assert!(!change.remove);
        assert_eq!(change.style.as_ref().unwrap()["backgroundColor"], "#ff0000");
        assert!(change.props.is_none());
        assert_eq!(change.visible_when.as_ref().unwrap().group, "plan");
        assert_eq!(change.insert_position(), InsertPosition::Last);
    }
}
