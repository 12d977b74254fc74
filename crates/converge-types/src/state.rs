//! Typed local-state handle for a managed resource.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

/// The durable local state of one managed resource, owned exclusively by
/// the reconciliation call for its duration.
///
/// Two snapshots are kept: the current field values and the baseline
/// recorded at the last successful apply. The pair drives update-mode
/// mapping ("changed since last apply") without any external diff engine.
///
/// A missing field and an explicit [`Value::Null`] are both "absent" for
/// presence probing, but they still compare distinct for change probing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    values: BTreeMap<String, Value>,
    baseline: BTreeMap<String, Value>,
}

impl ResourceState {
    /// Creates an empty state with an empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field initialization.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field to a new value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Removes a field entirely.
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    /// Returns the current value of a field, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns the string payload of a field, if set to a `Str`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns the integer payload of a field, if set to an `Int`.
    pub fn get_int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_int)
    }

    /// Returns true if the field is set to a non-null value.
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }

    /// Returns the declared field names in deterministic order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of declared fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the (old, new) pair for a field if it changed since the
    /// last apply, `None` otherwise. Missing values read as `Null`.
    pub fn change(&self, field: &str) -> Option<(&Value, &Value)> {
        let old = self.baseline.get(field).unwrap_or(&NULL);
        let new = self.values.get(field).unwrap_or(&NULL);
        if old == new {
            None
        } else {
            Some((old, new))
        }
    }

    /// Returns true if the field differs from the baseline.
    pub fn is_changed(&self, field: &str) -> bool {
        self.change(field).is_some()
    }

    /// Returns true if any field differs from the baseline.
    pub fn is_dirty(&self) -> bool {
        self.values != self.baseline
    }

    /// Records the current values as the new baseline.
    ///
    /// Called after a successful apply; subsequent `change` probes compare
    /// against this snapshot.
    pub fn mark_applied(&mut self) {
        self.baseline = self.values.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_get_has() {
        let mut state = ResourceState::new();
        state.set("name", "web-1");
        state.set("cores", 4);
        state.set("gone", Value::Null);

        assert_eq!(state.get_str("name"), Some("web-1"));
        assert_eq!(state.get_int("cores"), Some(4));
        assert!(state.has("name"));
        assert!(!state.has("gone"));
        assert!(!state.has("missing"));
    }

    #[test]
    fn test_field_names_deterministic() {
        let state = ResourceState::new()
            .with_field("zeta", 1)
            .with_field("alpha", 2);

        let names: Vec<_> = state.field_names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_change_probing() {
        let mut state = ResourceState::new().with_field("name", "web-1");
        state.mark_applied();

        assert!(!state.is_changed("name"));
        assert!(state.change("name").is_none());

        state.set("name", "web-2");
        let (old, new) = state.change("name").unwrap();
        assert_eq!(old, &Value::from("web-1"));
        assert_eq!(new, &Value::from("web-2"));
        assert!(state.is_dirty());
    }

    #[test]
    fn test_new_field_reads_as_changed() {
        let mut state = ResourceState::new();
        state.mark_applied();
        state.set("size", "m3.large");

        let (old, new) = state.change("size").unwrap();
        assert!(old.is_null());
        assert_eq!(new, &Value::from("m3.large"));
    }

    #[test]
    fn test_mark_applied_resets_changes() {
        let mut state = ResourceState::new().with_field("name", "web-1");
        assert!(state.is_changed("name"));

        state.mark_applied();
        assert!(!state.is_changed("name"));
        assert!(!state.is_dirty());
    }
}
