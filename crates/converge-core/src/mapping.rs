//! Field mapping engine: local state + rule set -> wire request.

use crate::error::{ConvergeError, ConvergeResult};
use crate::naming::to_wire_name;
use crate::rules::{FieldRule, RuleKind, RuleSet};
use crate::wire::WireRequest;
use converge_types::{ResourceState, Value};
use itertools::Itertools;

/// Whether a request describes a fresh create or a delta update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Include every present, non-ignored field.
    Create,
    /// Include only fields changed since the last apply, plus rules
    /// marked `force_update`.
    Update,
}

/// Maps local state onto a flat wire request according to the rule set.
///
/// Absent and null optional values are omitted, never an error. The pass
/// is pure except for [`RuleKind::Custom`] providers, which may persist a
/// just-computed default back into the state.
pub fn map_to_wire(
    state: &mut ResourceState,
    rules: &RuleSet,
    mode: MapMode,
) -> ConvergeResult<WireRequest> {
    let mut request = WireRequest::new();

    // Providers may mutate the state, so the field list is snapshotted.
    let fields: Vec<String> = state.field_names().map(String::from).collect();

    for field in &fields {
        match rules.get(field) {
            Some(rule) => apply_rule(state, field, rule, mode, &mut request)?,
            None => apply_default(state, field, mode, &mut request)?,
        }
    }

    Ok(request)
}

fn included(state: &ResourceState, field: &str, force_update: bool, mode: MapMode) -> bool {
    match mode {
        MapMode::Create => true,
        MapMode::Update => force_update || state.is_changed(field),
    }
}

fn apply_rule(
    state: &mut ResourceState,
    field: &str,
    rule: &FieldRule,
    mode: MapMode,
    request: &mut WireRequest,
) -> ConvergeResult<()> {
    match &rule.kind {
        RuleKind::Ignore => Ok(()),
        RuleKind::Direct => {
            if !included(state, field, rule.force_update, mode) {
                return Ok(());
            }
            let wire_name = rule
                .wire_name
                .clone()
                .unwrap_or_else(|| to_wire_name(field));
            if let Some(value) = present_value(state, field) {
                request.set(wire_name, flatten(field, &value)?);
            }
            Ok(())
        }
        RuleKind::ExpandArray => {
            if !included(state, field, rule.force_update, mode) {
                return Ok(());
            }
            let base = rule
                .wire_name
                .clone()
                .unwrap_or_else(|| to_wire_name(field));
            let Some(value) = present_value(state, field) else {
                return Ok(());
            };
            let Some(items) = value.as_list() else {
                return Err(ConvergeError::mapping(
                    field,
                    format!("expand requires a list, got {}", value.kind()),
                ));
            };
            let flat: Vec<String> = items
                .iter()
                .map(|item| flatten_scalar(field, item))
                .collect::<ConvergeResult<_>>()?;
            request.expand(&base, flat);
            Ok(())
        }
        RuleKind::Custom(provider) => {
            if !included(state, field, rule.force_update, mode) {
                return Ok(());
            }
            let wire_name = rule
                .wire_name
                .clone()
                .unwrap_or_else(|| to_wire_name(field));
            if let Some(value) = provider(state) {
                if !value.is_null() {
                    request.set(wire_name, flatten(field, &value)?);
                }
            }
            Ok(())
        }
    }
}

fn apply_default(
    state: &ResourceState,
    field: &str,
    mode: MapMode,
    request: &mut WireRequest,
) -> ConvergeResult<()> {
    if !included(state, field, false, mode) {
        return Ok(());
    }
    if let Some(value) = present_value(state, field) {
        request.set(to_wire_name(field), flatten(field, &value)?);
    }
    Ok(())
}

/// Returns the field value when present and non-null.
fn present_value(state: &ResourceState, field: &str) -> Option<Value> {
    state.get(field).filter(|v| !v.is_null()).cloned()
}

/// Flattens a value onto a single wire scalar.
///
/// Lists of scalars join into a comma-delimited string; maps and nested
/// lists have no wire representation and are mapping errors.
fn flatten(field: &str, value: &Value) -> ConvergeResult<String> {
    match value {
        Value::List(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| flatten_scalar(field, item))
                .collect::<ConvergeResult<_>>()?;
            Ok(parts.iter().join(","))
        }
        _ => flatten_scalar(field, value),
    }
}

fn flatten_scalar(field: &str, value: &Value) -> ConvergeResult<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Str(s) => Ok(s.clone()),
        Value::Null | Value::List(_) | Value::Map(_) => Err(ConvergeError::mapping(
            field,
            format!("unsupported value type {}", value.kind()),
        )),
    }
}
