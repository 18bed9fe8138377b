//! Resolved view of the current screen for a host renderer.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::actions::{InputBuffer, SelectionState};
use crate::element::{ElementKind, ElementNode, ResolvedStyle};
use crate::resolve::{evaluate, resolve_template};

use super::screen::{ComponentRegistry, ScreenContent, ScreenDefinition};

/// What the host should draw for the current screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedScreen {
    Elements {
        screen_id: String,
        elements: Vec<RenderedNode>,
    },
    Custom {
        screen_id: String,
        component: String,
        props: Map<String, Value>,
    },
    /// The component is not registered. The host shows `message` and offers
    /// to skip the screen.
    MissingComponent {
        screen_id: String,
        component: String,
        message: String,
    },
}

/// One visible node with templates resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedNode {
    pub id: String,
    pub kind: ElementKind,
    pub style: ResolvedStyle,
    pub props: Map<String, Value>,
    pub selected: bool,
    pub has_action: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedNode>,
}

/// Inputs a render reads.
pub struct RenderContext<'a> {
    pub variables: &'a Map<String, Value>,
    pub selection: &'a SelectionState,
    pub inputs: &'a InputBuffer,
    pub components: &'a ComponentRegistry,
}

pub fn render_screen(screen: &ScreenDefinition, ctx: &RenderContext<'_>) -> RenderedScreen {
    match &screen.content {
        ScreenContent::Elements { elements } => RenderedScreen::Elements {
            screen_id: screen.id.clone(),
            elements: render_nodes(elements, ctx),
        },
        ScreenContent::Custom { component, props } if ctx.components.contains(component) => {
            RenderedScreen::Custom {
                screen_id: screen.id.clone(),
                component: component.clone(),
                props: resolve_props(props, ctx.variables),
            }
        }
        ScreenContent::Custom { component, .. } => RenderedScreen::MissingComponent {
            screen_id: screen.id.clone(),
            component: component.clone(),
            message: format!("custom screen component '{component}' is not registered"),
        },
    }
}

/// Render the visible subset of `nodes`. A hidden node hides its subtree.
pub fn render_nodes(nodes: &[ElementNode], ctx: &RenderContext<'_>) -> Vec<RenderedNode> {
    nodes
        .iter()
        .filter(|node| is_visible(node, ctx))
        .map(|node| render_node(node, ctx))
        .collect()
}

/// `show_if` over the variables and `visibleWhen` over the selection must both pass.
pub fn is_visible(node: &ElementNode, ctx: &RenderContext<'_>) -> bool {
    let condition_ok = node
        .conditions
        .as_ref()
        .and_then(|c| c.show_if.as_ref())
        .is_none_or(|condition| evaluate(condition, ctx.variables));
    let gate_ok = node
        .visible_when
        .as_ref()
        .is_none_or(|gate| ctx.selection.allows(gate));
    condition_ok && gate_ok
}

fn render_node(node: &ElementNode, ctx: &RenderContext<'_>) -> RenderedNode {
    let mut props = resolve_props(&node.props, ctx.variables);
    if node.kind == ElementKind::Input {
        if let Some(text) = ctx.inputs.get(node.input_key()) {
            props.insert("value".to_string(), Value::String(text.to_string()));
        }
    }

    RenderedNode {
        id: node.id.clone(),
        kind: node.kind,
        style: ResolvedStyle::from_map(&node.style),
        props,
        selected: ctx.selection.is_toggled(&node.id),
        has_action: node.has_actions(),
        children: render_nodes(&node.children, ctx),
    }
}

fn resolve_props(props: &Map<String, Value>, variables: &Map<String, Value>) -> Map<String, Value> {
    props
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(resolve_template(s, variables).into_owned()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}
