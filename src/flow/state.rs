//! Flow navigation state machine.
//!
//! `Loading → Ready(index) → Completed | Abandoned`, with `Error` reachable
//! only from `Loading`.

use serde::{Deserialize, Serialize};

/// Where a flow session is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    Loading,
    Ready { index: usize },
    Completed,
    Abandoned,
    Error { message: String },
}

/// An input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Screens are available; `screen_count` navigable screens.
    Loaded { screen_count: usize },
    LoadFailed { message: String },
    Next,
    Back,
    SkipScreen,
    SkipAll,
    /// Jump to this screen id; unknown ids behave like `Next`.
    NavigateTo(String),
}

impl FlowState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, target),
            (Loading, Ready { .. })
                | (Loading, Error { .. })
                | (Ready { .. }, Ready { .. })
                | (Ready { .. }, Completed)
                | (Ready { .. }, Abandoned)
        )
    }

    /// Whether the session is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Error { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Ready { index } => Some(*index),
            _ => None,
        }
    }

    /// Compute the next state. `position_of` maps a screen id to its index
    /// in the navigable sequence of `screen_count` screens. Invalid events
    /// leave the state unchanged.
    pub fn apply<F>(&self, event: &FlowEvent, screen_count: usize, position_of: F) -> FlowState
    where
        F: Fn(&str) -> Option<usize>,
    {
        use FlowState::*;
        match (self, event) {
            (Loading, FlowEvent::Loaded { screen_count: 0 }) => Error {
                message: "flow has no navigable screens".to_string(),
            },
            (Loading, FlowEvent::Loaded { .. }) => Ready { index: 0 },
            (Loading, FlowEvent::LoadFailed { message }) => Error {
                message: message.clone(),
            },
            (Ready { index }, FlowEvent::Next | FlowEvent::SkipScreen) => {
                advance(*index, screen_count)
            }
            (Ready { index }, FlowEvent::Back) => Ready {
                index: index.saturating_sub(1),
            },
            (Ready { .. }, FlowEvent::SkipAll) => Abandoned,
            (Ready { index }, FlowEvent::NavigateTo(id)) => match position_of(id) {
                Some(target) => Ready { index: target },
                None => advance(*index, screen_count),
            },
            (state, _) => state.clone(),
        }
    }
}

fn advance(index: usize, screen_count: usize) -> FlowState {
    if index + 1 >= screen_count {
        FlowState::Completed
    } else {
        FlowState::Ready { index: index + 1 }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Ready { index } => write!(f, "ready({index})"),
            Self::Completed => write!(f, "completed"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: [&str; 3] = ["a", "b", "c"];

    fn step(state: &FlowState, event: FlowEvent) -> FlowState {
        state.apply(&event, IDS.len(), |id| IDS.iter().position(|s| *s == id))
    }

    #[test]
    fn load_enters_first_screen() {
        let ready = step(&FlowState::Loading, FlowEvent::Loaded { screen_count: 3 });
        assert_eq!(ready, FlowState::Ready { index: 0 });
        assert!(FlowState::Loading.can_transition_to(&ready));
    }

    #[test]
    fn load_failure_and_empty_flow_are_errors() {
        let failed = step(
            &FlowState::Loading,
            FlowEvent::LoadFailed {
                message: "offline".into(),
            },
        );
        assert_eq!(
            failed,
            FlowState::Error {
                message: "offline".into()
            }
        );
        let empty = step(&FlowState::Loading, FlowEvent::Loaded { screen_count: 0 });
        assert!(matches!(empty, FlowState::Error { .. }));
    }

    #[test]
    fn next_walks_then_completes() {
        let mut state = FlowState::Ready { index: 0 };
        state = step(&state, FlowEvent::Next);
        assert_eq!(state, FlowState::Ready { index: 1 });
        state = step(&state, FlowEvent::SkipScreen);
        assert_eq!(state, FlowState::Ready { index: 2 });
        state = step(&state, FlowEvent::Next);
        assert_eq!(state, FlowState::Completed);
    }

    #[test]
    fn back_is_clamped_at_first_screen() {
        let state = step(&FlowState::Ready { index: 0 }, FlowEvent::Back);
        assert_eq!(state, FlowState::Ready { index: 0 });
        let state = step(&FlowState::Ready { index: 2 }, FlowEvent::Back);
        assert_eq!(state, FlowState::Ready { index: 1 });
    }

    #[test]
    fn navigate_to_known_and_unknown_ids() {
        let state = step(&FlowState::Ready { index: 0 }, FlowEvent::NavigateTo("c".into()));
        assert_eq!(state, FlowState::Ready { index: 2 });
        let state = step(&FlowState::Ready { index: 0 }, FlowEvent::NavigateTo("zz".into()));
        assert_eq!(state, FlowState::Ready { index: 1 });
        let state = step(&FlowState::Ready { index: 2 }, FlowEvent::NavigateTo("zz".into()));
        assert_eq!(state, FlowState::Completed);
    }

    #[test]
    fn skip_all_abandons() {
        assert_eq!(
            step(&FlowState::Ready { index: 1 }, FlowEvent::SkipAll),
            FlowState::Abandoned
        );
    }

    #[test]
    fn terminal_states_ignore_events() {
        for state in [
            FlowState::Completed,
            FlowState::Abandoned,
            FlowState::Error {
                message: "x".into(),
            },
        ] {
            assert!(state.is_terminal());
            assert_eq!(step(&state, FlowEvent::Next), state);
            assert_eq!(step(&state, FlowEvent::Back), state);
        }
    }

    #[test]
    fn invalid_transitions() {
        assert!(!FlowState::Completed.can_transition_to(&FlowState::Ready { index: 0 }));
        assert!(!FlowState::Ready { index: 0 }.can_transition_to(&FlowState::Loading));
        assert!(!FlowState::Ready { index: 0 }.can_transition_to(&FlowState::Error {
            message: "x".into()
        }));
        assert!(!FlowState::Loading.can_transition_to(&FlowState::Completed));
    }
}
