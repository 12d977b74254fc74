//! Dotted-path addressing over nested response payloads.
//!
//! Remote responses arrive as arbitrarily nested map/array structures.
//! Two lookup flavors are provided: [`probe`] tolerates absence (a missing
//! path is simply `None`), [`require`] treats it as a hard error. Numeric
//! path segments index into lists, all other segments key into maps.

use crate::error::{ConvergeError, ConvergeResult};
use converge_types::Value;

/// Looks up a dotted path, yielding `None` when any segment is missing.
///
/// # Examples
///
/// ```
/// use converge_core::payload;
/// use converge_types::Value;
///
/// let v = Value::from_json(serde_json::json!({"server": {"ips": ["10.0.0.1"]}}));
/// assert_eq!(payload::probe(&v, "server.ips.0").unwrap().as_str(), Some("10.0.0.1"));
/// assert!(payload::probe(&v, "server.gone").is_none());
/// ```
pub fn probe<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = match current {
            Value::Map(m) => m.get(segment)?,
            Value::List(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Looks up a dotted path, failing with [`ConvergeError::MissingPath`]
/// when any segment is missing.
pub fn require<'a>(payload: &'a Value, path: &str) -> ConvergeResult<&'a Value> {
    probe(payload, path).ok_or_else(|| ConvergeError::missing_path(path))
}
