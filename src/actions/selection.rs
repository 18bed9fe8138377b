//! Toggle and toggle-group selection state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::element::VisibleWhen;

/// A selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    /// Toggle `id`. Grouped toggles are radio-like: the group's previous
    /// selection is released. Ungrouped toggles flip membership.
    Toggle { id: String, group: Option<String> },
    /// Forget all selections.
    Reset,
}

/// Which elements are toggled and which id each group has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    toggled: BTreeSet<String>,
    groups: BTreeMap<String, String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action, producing the next state.
    pub fn reduce(mut self, action: SelectionAction) -> Self {
        match action {
            SelectionAction::Toggle {
                id,
                group: Some(group),
            } => {
                if let Some(previous) = self.groups.insert(group, id.clone()) {
                    if previous != id {
                        self.toggled.remove(&previous);
                    }
                }
                self.toggled.insert(id);
            }
            SelectionAction::Toggle { id, group: None } => {
                if !self.toggled.remove(&id) {
                    self.toggled.insert(id);
                }
            }
            SelectionAction::Reset => {
                self.toggled.clear();
                self.groups.clear();
            }
        }
        self
    }

    pub fn is_toggled(&self, id: &str) -> bool {
        self.toggled.contains(id)
    }

    pub fn selected_in(&self, group: &str) -> Option<&str> {
        self.groups.get(group).map(String::as_str)
    }

    pub fn toggled(&self) -> impl Iterator<Item = &str> {
        self.toggled.iter().map(String::as_str)
    }

    /// Whether a `visibleWhen` gate is open.
    pub fn allows(&self, gate: &VisibleWhen) -> bool {
        match (self.selected_in(&gate.group), gate.selected.as_deref()) {
            (Some(current), Some(required)) => current == required,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}
