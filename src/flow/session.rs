//! FlowSession: one user's pass through an onboarding flow.
//!
//! Owns the navigable screens, the Variable Store, collected screen data,
//! selection state and buffered inputs. Navigation goes through
//! [`FlowState::apply`]; every state change fans out to analytics and to
//! [`SessionEvent`] subscribers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actions::{
    DispatchContext, DispatchOutcome, InputBuffer, LinkOpener, LogLinkOpener, Navigation,
    SelectionState, dispatch,
};
use crate::analytics::{AnalyticsHandle, AnalyticsRecord, events};
use crate::element::{ElementNode, find_node, validate_tree};
use crate::error::FlowError;
use crate::resolve::NavTarget;
use crate::source::ScreenSource;
use crate::variables::VariableStore;

use super::render::{RenderContext, RenderedScreen, render_screen};
use super::screen::{ComponentRegistry, ScreenContent, ScreenDefinition};
use super::state::{FlowEvent, FlowState};

/// Key under which the Variable Store is nested in the completion payload.
pub const VARIABLES_KEY: &str = "_variables";

/// Lifecycle notifications for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        session_id: Uuid,
        screen_count: usize,
    },
    ScreenViewed {
        screen_id: String,
        index: usize,
    },
    Completed {
        payload: Map<String, Value>,
    },
    Abandoned {
        screen_id: Option<String>,
    },
}

pub struct FlowSession {
    id: Uuid,
    user_id: String,
    screens: Vec<ScreenDefinition>,
    state: FlowState,
    variant: Option<String>,
    collected: Map<String, Value>,
    variables: VariableStore,
    selection: SelectionState,
    inputs: InputBuffer,
    components: ComponentRegistry,
    analytics: Option<AnalyticsHandle>,
    links: Arc<dyn LinkOpener>,
    events: broadcast::Sender<SessionEvent>,
    completion: Option<Map<String, Value>>,
}

impl FlowSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            screens: Vec::new(),
            state: FlowState::Loading,
            variant: None,
            collected: Map::new(),
            variables: VariableStore::new(),
            selection: SelectionState::new(),
            inputs: InputBuffer::new(),
            components: ComponentRegistry::new(),
            analytics: None,
            links: Arc::new(LogLinkOpener),
            events,
            completion: None,
        }
    }

    /// Seed the Variable Store before load.
    pub fn with_variables(mut self, initial: Map<String, Value>) -> Self {
        self.variables = VariableStore::with_initial(initial);
        self
    }

    pub fn with_components(mut self, components: ComponentRegistry) -> Self {
        self.components = components;
        self
    }

    pub fn with_analytics(mut self, analytics: AnalyticsHandle) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn with_link_opener(mut self, links: Arc<dyn LinkOpener>) -> Self {
        self.links = links;
        self
    }

    /// Fetch screens, apply the user's variant of the first experiment, and
    /// enter the first screen. Failure moves the session to `Error`.
    pub async fn load(&mut self, source: &dyn ScreenSource) -> Result<(), FlowError> {
        self.ensure_loading()?;

        let config = match source.fetch().await {
            Ok(config) => config,
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Flow failed to load");
                let failed = self.state.apply(
                    &FlowEvent::LoadFailed {
                        message: message.clone(),
                    },
                    0,
                    |_| None,
                );
                self.set_state(failed);
                return Err(FlowError::LoadFailed(message));
            }
        };

        let mut screens = config.screens;
        if let Some(experiment) = config.experiments.first() {
            match source.assign_variant(&experiment.id, &self.user_id).await {
                Ok(Some(assignment)) => {
                    info!(
                        experiment = %experiment.id,
                        variant = %assignment.variant,
                        "Using experiment variant screens"
                    );
                    self.variant = Some(assignment.variant);
                    screens = assignment.screens;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(experiment = %experiment.id, error = %e, "Variant assignment failed, using default screens");
                }
            }
        }

        self.load_screens(screens)
    }

    /// Enter the flow with an already-fetched screen list.
    pub fn load_screens(&mut self, screens: Vec<ScreenDefinition>) -> Result<(), FlowError> {
        self.ensure_loading()?;

        for screen in &screens {
            if let Err(e) = validate_tree(screen.roots()) {
                warn!(screen_id = %screen.id, error = %e, "Screen element tree is malformed");
            }
        }
        let total = screens.len();
        self.screens = screens.into_iter().filter(|s| !s.hidden).collect();
        debug!(total, navigable = self.screens.len(), "Screens loaded");

        let next = self.state.apply(
            &FlowEvent::Loaded {
                screen_count: self.screens.len(),
            },
            self.screens.len(),
            |_| None,
        );
        self.set_state(next);
        if self.screens.is_empty() {
            return Err(FlowError::NoScreens);
        }

        info!(session_id = %self.id, user_id = %self.user_id, screens = self.screens.len(), "Flow started");
        let mut properties = json!({ "screen_count": self.screens.len() });
        if let Some(variant) = &self.variant {
            properties["variant"] = json!(variant);
        }
        self.track(events::FLOW_STARTED, properties);
        let _ = self.events.send(SessionEvent::Started {
            session_id: self.id,
            screen_count: self.screens.len(),
        });
        self.on_screen_entered();
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn screens(&self) -> &[ScreenDefinition] {
        &self.screens
    }

    pub fn current_screen(&self) -> Option<&ScreenDefinition> {
        self.state.index().and_then(|i| self.screens.get(i))
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn collected(&self) -> &Map<String, Value> {
        &self.collected
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Variable Store unioned over collected data; the store wins.
    pub fn effective_variables(&self) -> Map<String, Value> {
        self.variables.overlay_on(&self.collected)
    }

    /// The completion payload, once the flow has completed.
    pub fn completion(&self) -> Option<&Map<String, Value>> {
        self.completion.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Resolved view of the current screen.
    pub fn render(&self) -> Option<RenderedScreen> {
        let screen = self.current_screen()?;
        let variables = self.effective_variables();
        let ctx = RenderContext {
            variables: &variables,
            selection: &self.selection,
            inputs: &self.inputs,
            components: &self.components,
        };
        Some(render_screen(screen, &ctx))
    }

    /// Buffer text typed into an input element on the current screen.
    pub fn set_input(&mut self, element_id: &str, text: impl Into<String>) -> Result<(), FlowError> {
        let node = self.current_node(element_id)?;
        let key = node.input_key().to_string();
        self.inputs.record(key, text);
        Ok(())
    }

    /// Run an element's actions and follow the first navigation requested.
    pub fn dispatch(&mut self, element_id: &str) -> Result<DispatchOutcome, FlowError> {
        let node = self.current_node(element_id)?.clone();
        let screen_id = self.current_screen_id().unwrap_or_default();

        let mut ctx = DispatchContext {
            variables: &mut self.variables,
            collected: &self.collected,
            selection: &mut self.selection,
            inputs: &mut self.inputs,
            links: self.links.as_ref(),
        };
        let outcome = dispatch(&node, &mut ctx);

        for record in &outcome.records {
            let mut properties = json!({
                "screen_id": screen_id,
                "element_id": record.element_id,
                "action_type": record.action_type,
            });
            if let Some(destination) = &record.destination {
                properties["destination"] = json!(destination);
            }
            self.track(events::ACTION_TRIGGERED, properties);
        }

        match &outcome.navigation {
            Some(Navigation::Go(NavTarget::Next)) => {
                self.next();
            }
            Some(Navigation::Go(NavTarget::Previous)) => {
                self.back();
            }
            Some(Navigation::Go(NavTarget::Screen(id))) => {
                self.navigate_to(id);
            }
            Some(Navigation::Dismiss) => {
                self.skip_all();
            }
            None => {}
        }
        Ok(outcome)
    }

    /// Accept a custom screen's output: merge it into collected data and the
    /// Variable Store, then advance.
    pub fn complete_custom_screen(&mut self, data: Map<String, Value>) -> Result<&FlowState, FlowError> {
        let screen = self.current_screen().ok_or_else(|| self.not_ready())?;
        if !matches!(screen.content, ScreenContent::Custom { .. }) {
            return Err(FlowError::NotCustomScreen {
                screen_id: screen.id.clone(),
            });
        }
        self.collected.extend(data.clone());
        self.variables.extend(data);
        Ok(self.next())
    }

    pub fn next(&mut self) -> &FlowState {
        self.transition(FlowEvent::Next)
    }

    pub fn back(&mut self) -> &FlowState {
        self.transition(FlowEvent::Back)
    }

    pub fn skip_screen(&mut self) -> &FlowState {
        self.transition(FlowEvent::SkipScreen)
    }

    pub fn skip_all(&mut self) -> &FlowState {
        self.transition(FlowEvent::SkipAll)
    }

    pub fn navigate_to(&mut self, screen_id: &str) -> &FlowState {
        self.transition(FlowEvent::NavigateTo(screen_id.to_string()))
    }

    fn transition(&mut self, event: FlowEvent) -> &FlowState {
        let next = self.state.apply(&event, self.screens.len(), |id| {
            self.screens.iter().position(|s| s.id == id)
        });
        if next == self.state {
            debug!(state = %self.state, event = ?event, "Navigation had no effect");
            return &self.state;
        }

        let left = self.current_screen_id();
        self.set_state(next);
        match self.state {
            FlowState::Ready { .. } => self.on_screen_entered(),
            FlowState::Completed => self.on_completed(),
            FlowState::Abandoned => self.on_abandoned(left),
            FlowState::Loading | FlowState::Error { .. } => {}
        }
        &self.state
    }

    fn set_state(&mut self, next: FlowState) {
        if !self.state.can_transition_to(&next) {
            warn!(from = %self.state, to = %next, "Unexpected flow state transition");
        }
        debug!(from = %self.state, to = %next, "Flow state changed");
        self.state = next;
    }

    fn on_screen_entered(&mut self) {
        let Some(index) = self.state.index() else {
            return;
        };
        let Some(screen_id) = self.screens.get(index).map(|s| s.id.clone()) else {
            return;
        };
        debug!(screen_id = %screen_id, index, "Screen viewed");
        self.track(
            events::SCREEN_VIEWED,
            json!({ "screen_id": screen_id, "index": index }),
        );
        let _ = self.events.send(SessionEvent::ScreenViewed { screen_id, index });
    }

    fn on_completed(&mut self) {
        if self.completion.is_some() {
            return;
        }
        let mut payload = self.collected.clone();
        payload.insert(
            VARIABLES_KEY.to_string(),
            Value::Object(self.variables.as_map().clone()),
        );
        info!(session_id = %self.id, keys = payload.len(), "Flow completed");
        self.track(events::FLOW_COMPLETED, json!({ "screen_count": self.screens.len() }));
        let _ = self.events.send(SessionEvent::Completed {
            payload: payload.clone(),
        });
        self.completion = Some(payload);
    }

    fn on_abandoned(&mut self, screen_id: Option<String>) {
        info!(session_id = %self.id, screen_id = ?screen_id, "Flow abandoned");
        self.track(events::FLOW_ABANDONED, json!({ "screen_id": screen_id }));
        let _ = self.events.send(SessionEvent::Abandoned { screen_id });
    }

    fn track(&self, event: &str, properties: Value) {
        if let Some(analytics) = &self.analytics {
            analytics.track(AnalyticsRecord::new(
                event,
                self.user_id.clone(),
                self.id,
                properties,
            ));
        }
    }

    fn current_screen_id(&self) -> Option<String> {
        self.current_screen().map(|s| s.id.clone())
    }

    fn current_node(&self, element_id: &str) -> Result<&ElementNode, FlowError> {
        let screen = self.current_screen().ok_or_else(|| self.not_ready())?;
        find_node(screen.roots(), element_id).ok_or_else(|| FlowError::ElementNotFound {
            id: element_id.to_string(),
            screen_id: screen.id.clone(),
        })
    }

    fn ensure_loading(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Loading => Ok(()),
            _ => Err(self.not_ready()),
        }
    }

    fn not_ready(&self) -> FlowError {
        FlowError::NotReady {
            state: self.state.to_string(),
        }
    }
}
