//! Element tree node and value types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resolve::{Condition, Destination};

/// Closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    VStack,
    HStack,
    ZStack,
    ScrollView,
    Text,
    Image,
    Video,
    Lottie,
    Icon,
    Input,
    Spacer,
    Divider,
}

impl ElementKind {
    /// Whether this kind may hold children.
    pub fn is_container(&self) -> bool {
        match self {
            Self::VStack | Self::HStack | Self::ZStack | Self::ScrollView => true,
            Self::Text
            | Self::Image
            | Self::Video
            | Self::Lottie
            | Self::Icon
            | Self::Input
            | Self::Spacer
            | Self::Divider => false,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::VStack => "vstack",
            Self::HStack => "hstack",
            Self::ZStack => "zstack",
            Self::ScrollView => "scrollview",
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Lottie => "lottie",
            Self::Icon => "icon",
            Self::Input => "input",
            Self::Spacer => "spacer",
            Self::Divider => "divider",
        };
        write!(f, "{s}")
    }
}

/// A user-triggered action attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Tap,
    Navigate {
        destination: Destination,
    },
    /// Toggles the owning element. Grouped toggles are single-select.
    Toggle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
    },
    SetVariable {
        variable: String,
        #[serde(default)]
        value: Value,
    },
    Link {
        url: String,
    },
    Dismiss,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Navigate { .. } => "navigate",
            Self::Toggle { .. } => "toggle",
            Self::SetVariable { .. } => "set_variable",
            Self::Link { .. } => "link",
            Self::Dismiss => "dismiss",
        }
    }
}

/// Visibility gated on a toggle group's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleWhen {
    pub group: String,
    /// Required selected id. `None` means any selection in the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

/// Variable-gated visibility.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
}

/// One node of a screen's element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub style: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
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
}

impl ElementNode {
    /// A bare node with no style, props, or behavior.
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            style: Map::new(),
            props: Map::new(),
            children: Vec::new(),
            position: None,
            action: None,
            actions: None,
            visible_when: None,
            conditions: None,
            entrance: None,
            text_animation: None,
            interactive: None,
        }
    }

    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, ElementKind::Text).with_prop("text", Value::String(text.into()))
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: Value) -> Self {
        self.style.insert(key.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_show_if(mut self, condition: Condition) -> Self {
        self.conditions = Some(ElementConditions {
            show_if: Some(condition),
        });
        self
    }

    pub fn with_visible_when(mut self, group: impl Into<String>, selected: Option<&str>) -> Self {
        self.visible_when = Some(VisibleWhen {
            group: group.into(),
            selected: selected.map(str::to_string),
        });
        self
    }

    /// Singular action first, then the list, in declared order.
    pub fn all_actions(&self) -> impl Iterator<Item = &Action> {
        self.action
            .iter()
            .chain(self.actions.iter().flat_map(|list| list.iter()))
    }

    pub fn has_actions(&self) -> bool {
        self.all_actions().next().is_some()
    }

    /// Variable name an input element buffers into.
    pub fn input_key(&self) -> &str {
        self.props
            .get("variable")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}
