//! Buffered text-input values.
//!
//! Keystrokes stay here until a `navigate` or `set_variable` action flushes
//! them into the Variable Store, so typing does not re-resolve the tree.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::variables::VariableStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputBuffer {
    pending: BTreeMap<String, String>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest text for an input key, replacing earlier text.
    pub fn record(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.pending.insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pending.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Write every buffered value into `store` and clear the buffer.
    /// Returns how many values were written.
    pub fn flush_into(&mut self, store: &mut VariableStore) -> usize {
        let count = self.pending.len();
        for (key, text) in std::mem::take(&mut self.pending) {
            store.set(key, Value::String(text));
        }
        count
    }
}
