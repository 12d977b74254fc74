//! Response merge engine: wire response + override rules -> local state.

use crate::error::{ConvergeError, ConvergeResult};
use crate::naming::to_local_name;
use converge_types::{ResourceState, Value};
use std::collections::BTreeMap;

/// Transforms a payload value before it is written into local state.
///
/// Typical transforms: numeric coercion, unit-suffix stripping,
/// unmarshalling an embedded serialized sub-structure (see [`transforms`]).
pub type TransformFn = Box<dyn Fn(&Value) -> ConvergeResult<Value>>;

/// Override directive for one top-level payload field.
///
/// Payload fields without a rule are written to the local field named by
/// the default naming-convention transform.
pub struct ResponseRule {
    target: Option<String>,
    transform: Option<TransformFn>,
    keep_auto: bool,
    merge_key: Option<String>,
}

impl ResponseRule {
    /// Creates a rule that keeps the default target and value.
    pub fn new() -> Self {
        Self {
            target: None,
            transform: None,
            keep_auto: false,
            merge_key: None,
        }
    }

    /// Redirects the payload field to an explicit local field.
    pub fn rename(target: impl Into<String>) -> Self {
        Self::new().with_target(target)
    }

    /// Sets the target local field.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Applies a transform to the payload value before writing.
    pub fn with_transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> ConvergeResult<Value> + 'static,
    {
        self.transform = Some(Box::new(f));
        self
    }

    /// Keeps the default mapping in addition to this rule's transform.
    ///
    /// The payload field is written to its default local field unchanged,
    /// and the transformed value is written to the rule's explicit target
    /// (which must name a different local field).
    pub fn keep_auto(mut self) -> Self {
        self.keep_auto = true;
        self
    }

    /// Reconciles a record-list field by identity-field match instead of
    /// overwriting: matched local records are updated in place, unmatched
    /// incoming records are appended.
    pub fn merge_by(mut self, identity_field: impl Into<String>) -> Self {
        self.merge_key = Some(identity_field.into());
        self
    }
}

impl Default for ResponseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRule")
            .field("target", &self.target)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("keep_auto", &self.keep_auto)
            .field("merge_key", &self.merge_key)
            .finish()
    }
}

/// Override rules keyed by top-level payload field name.
#[derive(Debug, Default)]
pub struct ResponseRules {
    rules: BTreeMap<String, ResponseRule>,
}

impl ResponseRules {
    /// Creates an empty rule set (every payload field takes the default
    /// transform).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style rule registration.
    pub fn rule(mut self, payload_field: impl Into<String>, rule: ResponseRule) -> Self {
        self.rules.insert(payload_field.into(), rule);
        self
    }

    /// Returns the rule for a payload field, if declared.
    pub fn get(&self, payload_field: &str) -> Option<&ResponseRule> {
        self.rules.get(payload_field)
    }
}

/// Merges a response payload into local state.
///
/// Each top-level payload field resolves to a target local field via an
/// override rule or the default naming transform, optionally passes
/// through a transform, and is written. The payload itself must be a map.
pub fn merge_response(
    state: &mut ResourceState,
    payload: &Value,
    overrides: &ResponseRules,
) -> ConvergeResult<()> {
    let Some(fields) = payload.as_map() else {
        return Err(ConvergeError::internal(format!(
            "response payload is {}, expected map",
            payload.kind()
        )));
    };

    for (key, value) in fields {
        match overrides.get(key) {
            None => {
                write_field(state, &to_local_name(key), value.clone(), None);
            }
            Some(rule) => {
                if rule.keep_auto {
                    // Default mapping coexists with the transform below.
                    write_field(state, &to_local_name(key), value.clone(), None);
                }
                let incoming = match &rule.transform {
                    Some(f) => apply_transform(f, key, value)?,
                    None => value.clone(),
                };
                let target = match &rule.target {
                    Some(t) => t.clone(),
                    None => to_local_name(key),
                };
                write_field(state, &target, incoming, rule.merge_key.as_deref());
            }
        }
    }

    Ok(())
}

fn apply_transform(f: &TransformFn, key: &str, value: &Value) -> ConvergeResult<Value> {
    f(value).map_err(|err| match err {
        // Transforms do not know the payload key; fill it in here.
        ConvergeError::Mapping { message, .. } => ConvergeError::mapping(key, message),
        other => other,
    })
}

fn write_field(state: &mut ResourceState, target: &str, incoming: Value, merge_key: Option<&str>) {
    if let Some(identity) = merge_key {
        if let (Some(local), Some(records)) = (
            state.get(target).and_then(Value::as_list).map(<[Value]>::to_vec),
            incoming.as_list(),
        ) {
            let merged = reconcile_records(local, records, identity);
            state.set(target, Value::List(merged));
            return;
        }
    }
    state.set(target, incoming);
}

/// Reconciles two record lists by identity field: records whose identity
/// matches a local record update it in place (incoming fields overwrite),
/// the rest are appended in incoming order.
fn reconcile_records(mut local: Vec<Value>, incoming: &[Value], identity: &str) -> Vec<Value> {
    for record in incoming {
        let id = record.as_map().and_then(|m| m.get(identity));
        let matched = id.and_then(|id| {
            local.iter_mut().find(|existing| {
                existing.as_map().and_then(|m| m.get(identity)) == Some(id)
            })
        });
        match matched {
            Some(existing) => {
                if let (Some(dst), Some(src)) = (existing.as_map_mut(), record.as_map()) {
                    for (k, v) in src {
                        dst.insert(k.clone(), v.clone());
                    }
                } else {
                    *existing = record.clone();
                }
            }
            None => local.push(record.clone()),
        }
    }
    local
}

/// Built-in transforms for common payload normalizations.
pub mod transforms {
    use super::{ConvergeError, ConvergeResult, TransformFn, Value};

    /// Coerces a string or float payload value to an integer.
    pub fn to_int() -> TransformFn {
        Box::new(|value: &Value| match value {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Float(f) => Ok(Value::Int(*f as i64)),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                ConvergeError::mapping("", format!("cannot coerce '{s}' to integer"))
            }),
            other => Err(ConvergeError::mapping(
                "",
                format!("cannot coerce {} to integer", other.kind()),
            )),
        })
    }

    /// Strips a unit suffix from a string value ("10 GB" -> "10").
    pub fn strip_suffix(suffix: &'static str) -> TransformFn {
        Box::new(move |value: &Value| match value {
            Value::Str(s) => Ok(Value::Str(
                s.strip_suffix(suffix).unwrap_or(s).trim_end().to_string(),
            )),
            other => Err(ConvergeError::mapping(
                "",
                format!("cannot strip suffix from {}", other.kind()),
            )),
        })
    }

    /// Unmarshals an embedded JSON document (a string payload value) into
    /// a structured value, typically a list of records.
    pub fn parse_embedded() -> TransformFn {
        Box::new(|value: &Value| match value {
            Value::Str(s) => serde_json::from_str::<serde_json::Value>(s)
                .map(Value::from_json)
                .map_err(|e| {
                    ConvergeError::mapping("", format!("embedded document is not valid JSON: {e}"))
                }),
            other => Err(ConvergeError::mapping(
                "",
                format!("embedded document must be a string, got {}", other.kind()),
            )),
        })
    }
}
