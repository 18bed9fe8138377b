//! Variable Store: flat, session-scoped name/value mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat mapping from variable name to value. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    values: Map<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with caller-supplied initial values.
    pub fn with_initial(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Shallow-merge `other` into the store; incoming keys overwrite.
    pub fn extend(&mut self, other: Map<String, Value>) {
        self.values.extend(other);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Union `base` with this store; the store's values win on collision.
    pub fn overlay_on(&self, base: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = base.clone();
        merged.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// String form of a value used for template interpolation.
///
/// Strings are verbatim, `null` is empty, arrays are joined with `", "` and
/// objects fall back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn last_write_wins() {
        let mut store = VariableStore::new();
        store.set("plan", json!("basic"));
        store.set("plan", json!("pro"));
        assert_eq!(store.get("plan"), Some(&json!("pro")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn overlay_prefers_store_values() {
        let mut store = VariableStore::new();
        store.set("name", json!("Sam"));
        let collected = json!({"name": "Alex", "age": 30});
        let merged = store.overlay_on(collected.as_object().unwrap());
        assert_eq!(merged["name"], "Sam");
        assert_eq!(merged["age"], 30);
    }

    #[test]
    fn display_forms() {
        assert_eq!(display_value(&json!("hi")), "hi");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(2.5)), "2.5");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!(["a", "b"])), "a, b");
        assert_eq!(display_value(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut store = VariableStore::new();
        store.set("x", json!("yes"));
        assert_eq!(serde_json::to_value(&store).unwrap(), json!({"x": "yes"}));
    }
}
