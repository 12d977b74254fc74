//! Core types for the convergence engine.
//!
//! This crate provides the two types shared by every engine in the
//! convergence core:
//!
//! - [`Value`]: a tagged scalar/collection sum type validated once at the
//!   boundary, replacing untyped `string -> any` bags
//! - [`ResourceState`]: the typed local-state handle a reconciliation call
//!   owns for its duration (get/set by field name, presence probing,
//!   changed-since-apply probing)
//!
//! Both are transport-agnostic: nothing in this crate knows about wire
//! formats, zones, or remote calls.

mod state;
mod value;

pub use state::ResourceState;
pub use value::Value;
