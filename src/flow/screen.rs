//! Screen definitions and the custom-component registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::ElementNode;

/// One screen of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hidden screens are dropped from the navigable sequence at load.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(flatten)]
    pub content: ScreenContent,
}

/// What a screen shows: an element tree or a host-registered component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenContent {
    Elements {
        elements: Vec<ElementNode>,
    },
    Custom {
        component: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        props: Map<String, Value>,
    },
}

impl ScreenDefinition {
    pub fn elements(id: impl Into<String>, elements: Vec<ElementNode>) -> Self {
        Self {
            id: id.into(),
            name: None,
            hidden: false,
            content: ScreenContent::Elements { elements },
        }
    }

    pub fn custom(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            hidden: false,
            content: ScreenContent::Custom {
                component: component.into(),
                props: Map::new(),
            },
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Element roots, empty for custom screens.
    pub fn roots(&self) -> &[ElementNode] {
        match &self.content {
            ScreenContent::Elements { elements } => elements,
            ScreenContent::Custom { .. } => &[],
        }
    }
}

/// Names of custom screen components the host can render.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    names: BTreeSet<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_both_screen_shapes() {
        let screens: Vec<ScreenDefinition> = serde_json::from_value(json!([
            {"id": "welcome", "elements": [{"id": "t", "type": "text", "props": {"text": "Hi"}}]},
            {"id": "paywall", "component": "Paywall", "props": {"sku": "pro"}, "hidden": true}
        ]))
        .unwrap();

        assert_eq!(screens[0].roots().len(), 1);
        assert!(!screens[0].hidden);
        match &screens[1].content {
            ScreenContent::Custom { component, props } => {
                assert_eq!(component, "Paywall");
                assert_eq!(props["sku"], "pro");
            }
            other => panic!("expected custom screen, got {other:?}"),
        }
        assert!(screens[1].hidden);
        assert!(screens[1].roots().is_empty());
    }

    #[test]
    fn registry_lookup() {
        let mut registry = ComponentRegistry::new();
        registry.register("Paywall").register("Permissions");
        assert!(registry.contains("Paywall"));
        assert!(!registry.contains("Quiz"));
    }
}
