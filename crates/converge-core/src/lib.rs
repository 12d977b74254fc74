//! Reconciliation core for declarative resource management.
//!
//! This crate converges a locally declared resource onto a remote
//! control plane whose API speaks a flat key/value wire format. It
//! provides the four engines every managed resource type shares:
//!
//! - [`mapping`]: local state + rule set -> flat wire request
//! - [`merge`]: wire response + override rules -> local state updates
//! - [`zone`]: availability-zone resolution by retry across a catalog
//! - [`pipeline`]: ordered, fail-fast sequences of mutation steps
//! - [`poll`]: wait-for-convergence status polling
//!
//! # Architecture
//!
//! A lifecycle operation follows this pattern:
//!
//! 1. Build wire requests from [`converge_types::ResourceState`] with
//!    [`mapping::map_to_wire`] (fallible, before any remote call)
//! 2. Register each mutation as a [`pipeline::Step`] and run the
//!    [`pipeline::Sequence`]
//! 3. Steps invoke the remote operation, resolving placement with
//!    [`zone::resolve_zone`] where required, then block on
//!    [`poll::wait_for`] until the resource settles
//! 4. Merge the final response back with [`merge::merge_response`]
//!
//! The core is fully synchronous and single-threaded per invocation; it
//! owns its state handle exclusively for the call's duration. Remote
//! transport, credentials, and per-resource attribute glue are the
//! surrounding runtime's concern and enter only as closures.
//!
//! # Example
//!
//! ```
//! use converge_core::{FieldRule, MapMode, RuleSet, map_to_wire};
//! use converge_types::{ResourceState, Value};
//!
//! let mut state = ResourceState::new()
//!     .with_field("name", "x")
//!     .with_field("tags", Value::string_list(["a", "b", "c"]));
//! let rules = RuleSet::new().rule("tags", FieldRule::expand("Tag"));
//!
//! let request = map_to_wire(&mut state, &rules, MapMode::Create).unwrap();
//! assert_eq!(request.get("Name"), Some("x"));
//! assert_eq!(request.get("Tag.3"), Some("c"));
//! ```

pub mod error;
pub mod mapping;
pub mod merge;
pub mod naming;
pub mod payload;
pub mod pipeline;
pub mod poll;
pub mod rules;
pub mod wire;
pub mod zone;

// Re-export commonly used items at crate root
pub use error::{ConvergeError, ConvergeResult};
pub use mapping::{map_to_wire, MapMode};
pub use merge::{merge_response, ResponseRule, ResponseRules, TransformFn};
pub use pipeline::{Sequence, Step, StepBuilder, StepFn};
pub use poll::{wait_for, PollSpec};
pub use rules::{FieldRule, RuleKind, RuleSet, ValueProvider};
pub use wire::WireRequest;
pub use zone::{resolve_zone, ZoneEntry, ZoneOutcome, ZoneSpec};
