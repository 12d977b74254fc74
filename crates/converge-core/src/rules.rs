//! Per-field mapping rules for request construction.

use converge_types::{ResourceState, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Computes presence and value for a [`RuleKind::Custom`] field from the
/// whole local state.
///
/// The provider receives a mutable handle so a just-computed default can be
/// persisted back into local state immediately (the one documented side
/// channel of the otherwise pure mapping pass). Returning `None` omits the
/// field from the request.
pub type ValueProvider = Box<dyn Fn(&mut ResourceState) -> Option<Value>>;

/// How a local field is carried onto the wire.
pub enum RuleKind {
    /// Copy the value under the rule's wire name, flattening collections
    /// of scalars into a delimited string.
    Direct,
    /// Drop the field unconditionally.
    Ignore,
    /// Emit `Base.1 .. Base.k` for a k-element list.
    ExpandArray,
    /// Derive the value from the whole local state.
    Custom(ValueProvider),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Direct => write!(f, "Direct"),
            RuleKind::Ignore => write!(f, "Ignore"),
            RuleKind::ExpandArray => write!(f, "ExpandArray"),
            RuleKind::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Mapping directive for one local field.
///
/// Fields without a rule fall back to the default naming-convention
/// transform with [`RuleKind::Direct`] semantics.
#[derive(Debug)]
pub struct FieldRule {
    pub(crate) wire_name: Option<String>,
    pub(crate) kind: RuleKind,
    pub(crate) force_update: bool,
}

impl FieldRule {
    /// Copies the field under an explicit wire name.
    pub fn direct(wire_name: impl Into<String>) -> Self {
        Self {
            wire_name: Some(wire_name.into()),
            kind: RuleKind::Direct,
            force_update: false,
        }
    }

    /// Drops the field from every request.
    pub fn ignore() -> Self {
        Self {
            wire_name: None,
            kind: RuleKind::Ignore,
            force_update: false,
        }
    }

    /// Expands a list field into indexed keys under `base`.
    pub fn expand(base: impl Into<String>) -> Self {
        Self {
            wire_name: Some(base.into()),
            kind: RuleKind::ExpandArray,
            force_update: false,
        }
    }

    /// Derives the value with a provider called against the whole state.
    pub fn custom<F>(provider: F) -> Self
    where
        F: Fn(&mut ResourceState) -> Option<Value> + 'static,
    {
        Self {
            wire_name: None,
            kind: RuleKind::Custom(Box::new(provider)),
            force_update: false,
        }
    }

    /// Overrides the wire name (default: naming-convention transform of
    /// the local field name).
    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    /// Includes the field in update-mode requests even when unchanged.
    pub fn force_update(mut self) -> Self {
        self.force_update = true;
        self
    }
}

/// Partial map of local field name to [`FieldRule`].
///
/// Built fresh per call, never persisted. Re-inserting a rule for the same
/// field replaces the previous one.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, FieldRule>,
}

impl RuleSet {
    /// Creates an empty rule set (every field falls back to the default
    /// transform).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style rule registration.
    pub fn rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        self.insert(field, rule);
        self
    }

    /// Registers a rule for a field, replacing any existing rule.
    pub fn insert(&mut self, field: impl Into<String>, rule: FieldRule) {
        self.rules.insert(field.into(), rule);
    }

    /// Returns the rule for a field, if declared.
    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    /// Returns the number of declared rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
