//! Action Dispatcher: executes an element's actions in declared order.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::element::{Action, ElementNode};
use crate::error::ActionError;
use crate::resolve::{NavTarget, resolve_destination};
use crate::variables::VariableStore;

use super::input::InputBuffer;
use super::selection::{SelectionAction, SelectionState};

/// Destination label recorded for conditional navigation.
pub const CONDITIONAL_DESTINATION: &str = "conditional";

/// Opens external URLs for `link` actions.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ActionError>;
}

/// Link opener that only logs. Used when the host has no browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLinkOpener;

impl LinkOpener for LogLinkOpener {
    fn open(&self, url: &str) -> Result<(), ActionError> {
        info!(url = %url, "Open external link");
        Ok(())
    }
}

/// Where the flow should go after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Go(NavTarget),
    Dismiss,
}

/// One executed action, for analytics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub action_type: &'static str,
    pub element_id: String,
    /// Literal destination of a `navigate`, or [`CONDITIONAL_DESTINATION`].
    pub destination: Option<String>,
}

/// Result of dispatching one element's actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// One record per executed action, in execution order.
    pub records: Vec<ActionRecord>,
    /// First navigation requested, if any. Later ones are not followed.
    pub navigation: Option<Navigation>,
}

/// Mutable session state actions operate on.
pub struct DispatchContext<'a> {
    pub variables: &'a mut VariableStore,
    /// Session-collected data, unioned under the variables for resolution.
    pub collected: &'a Map<String, Value>,
    pub selection: &'a mut SelectionState,
    pub inputs: &'a mut InputBuffer,
    pub links: &'a dyn LinkOpener,
}

/// Execute `node.action` then each of `node.actions`.
pub fn dispatch(node: &ElementNode, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for action in node.all_actions() {
        let (record, navigation) = execute(node, action, ctx);
        outcome.records.push(record);
        if let Some(navigation) = navigation {
            if outcome.navigation.is_none() {
                outcome.navigation = Some(navigation);
            } else {
                debug!(
                    element_id = %node.id,
                    ignored = ?navigation,
                    "Navigation already requested for this dispatch"
                );
            }
        }
    }
    outcome
}

fn execute(
    node: &ElementNode,
    action: &Action,
    ctx: &mut DispatchContext<'_>,
) -> (ActionRecord, Option<Navigation>) {
    let mut record = ActionRecord {
        action_type: action.kind(),
        element_id: node.id.clone(),
        destination: None,
    };

    let navigation = match action {
        Action::Tap => None,
        Action::SetVariable { variable, value } => {
            ctx.variables.set(variable.clone(), value.clone());
            ctx.inputs.flush_into(ctx.variables);
            None
        }
        Action::Toggle { group } => {
            let selection = std::mem::take(ctx.selection);
            *ctx.selection = selection.reduce(SelectionAction::Toggle {
                id: node.id.clone(),
                group: group.clone(),
            });
            None
        }
        Action::Navigate { destination } => {
            let flushed = ctx.inputs.flush_into(ctx.variables);
            if flushed > 0 {
                debug!(count = flushed, "Flushed buffered inputs before navigation");
            }
            record.destination = Some(
                destination
                    .as_literal()
                    .unwrap_or(CONDITIONAL_DESTINATION)
                    .to_string(),
            );
            let variables = ctx.variables.overlay_on(ctx.collected);
            let target = resolve_destination(destination, &variables).unwrap_or(NavTarget::Next);
            Some(Navigation::Go(target))
        }
        Action::Link { url } => {
            if let Err(e) = ctx.links.open(url) {
                warn!(url = %url, error = %e, "Failed to open link");
            }
            None
        }
        Action::Dismiss => Some(Navigation::Dismiss),
    };

    (record, navigation)
}
