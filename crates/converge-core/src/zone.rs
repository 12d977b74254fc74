//! Availability-zone resolution by retry.
//!
//! Some remote operations require a placement zone that is not known in
//! advance. The resolver probes the region's zone catalog in order,
//! re-issuing the pending request with each candidate injected, until one
//! invocation is accepted. The winning zone is the only thing written back
//! into durable local state, so later operations on the same resource skip
//! the search entirely.

use crate::error::{ConvergeError, ConvergeResult};
use crate::wire::WireRequest;
use converge_types::{ResourceState, Value};
use tracing::debug;

/// One zone catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    /// Opaque zone identifier.
    pub zone: String,
    /// The region the zone belongs to.
    pub region: String,
}

impl ZoneEntry {
    /// Creates a catalog entry.
    pub fn new(zone: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            region: region.into(),
        }
    }
}

/// Names the governing state field, its wire key, and the active region.
#[derive(Debug, Clone)]
pub struct ZoneSpec {
    field: String,
    wire_name: String,
    region: String,
}

impl ZoneSpec {
    /// Creates a resolution spec.
    ///
    /// `field` is the local state field the winning zone is persisted to;
    /// `wire_name` is the wire key the candidate is injected under.
    pub fn new(
        field: impl Into<String>,
        wire_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            wire_name: wire_name.into(),
            region: region.into(),
        }
    }
}

/// Result of a successful resolution.
#[derive(Debug)]
pub struct ZoneOutcome {
    /// The accepted zone.
    pub zone: String,
    /// The response of the accepted invocation.
    pub payload: Value,
    /// Number of candidates actually invoked.
    pub probed: usize,
    /// True when a previously persisted zone skipped the search.
    pub pinned: bool,
}

/// Resolves the zone for a pending request and executes it.
///
/// If local state already carries a zone under the spec's field, that zone
/// is injected and the request is invoked exactly once; any error
/// propagates unchanged (no search, no catalog validation). Otherwise the
/// catalog is fetched, filtered to the active region, and probed in
/// catalog order. A candidate is accepted when `invoke` succeeds and the
/// optional `exists` predicate confirms the response denotes a real
/// object; acceptance persists the zone into `state` before returning.
///
/// Rejections are not distinguished: a transport error and a "wrong zone"
/// response both advance to the next candidate. Exhausting the catalog is
/// an explicit [`ConvergeError::ZoneExhausted`], never a silent success.
pub fn resolve_zone<C, I>(
    spec: &ZoneSpec,
    state: &mut ResourceState,
    request: &WireRequest,
    catalog: C,
    mut invoke: I,
    exists: Option<&dyn Fn(&Value) -> bool>,
) -> ConvergeResult<ZoneOutcome>
where
    C: FnOnce() -> ConvergeResult<Vec<ZoneEntry>>,
    I: FnMut(&WireRequest) -> ConvergeResult<Value>,
{
    if let Some(zone) = state.get_str(&spec.field).map(String::from) {
        debug!(field = %spec.field, %zone, "zone already resolved, invoking directly");
        let mut attempt = request.clone();
        attempt.set(&spec.wire_name, zone.clone());
        let payload = invoke(&attempt)?;
        return Ok(ZoneOutcome {
            zone,
            payload,
            probed: 1,
            pinned: true,
        });
    }

    let candidates: Vec<ZoneEntry> = catalog()?
        .into_iter()
        .filter(|entry| entry.region == spec.region)
        .collect();

    let mut probed = 0;
    for candidate in candidates {
        let mut attempt = request.clone();
        attempt.set(&spec.wire_name, candidate.zone.clone());
        probed += 1;

        match invoke(&attempt) {
            Err(err) => {
                debug!(zone = %candidate.zone, %err, "zone candidate rejected");
            }
            Ok(payload) => {
                if exists.is_some_and(|confirms| !confirms(&payload)) {
                    debug!(zone = %candidate.zone, "zone candidate returned no object");
                    continue;
                }
                debug!(zone = %candidate.zone, probed, "zone accepted");
                state.set(&spec.field, candidate.zone.clone());
                return Ok(ZoneOutcome {
                    zone: candidate.zone,
                    payload,
                    probed,
                    pinned: false,
                });
            }
        }
    }

    Err(ConvergeError::ZoneExhausted {
        wire_name: spec.wire_name.clone(),
        region: spec.region.clone(),
        attempts: probed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> ConvergeResult<Vec<ZoneEntry>> {
        Ok(vec![
            ZoneEntry::new("zone-a", "eu"),
            ZoneEntry::new("zone-b", "eu"),
            ZoneEntry::new("zone-c", "eu"),
            ZoneEntry::new("zone-x", "us"),
        ])
    }

    fn spec() -> ZoneSpec {
        ZoneSpec::new("availability_zone", "Zone", "eu")
    }

    #[test]
    fn test_accepts_in_catalog_order_and_persists() {
        let mut state = ResourceState::new();
        let mut seen = Vec::new();

        let outcome = resolve_zone(
            &spec(),
            &mut state,
            &WireRequest::new(),
            catalog,
            |req| {
                let zone = req.get("Zone").unwrap().to_string();
                seen.push(zone.clone());
                if zone == "zone-b" {
                    Ok(Value::Null)
                } else {
                    Err(ConvergeError::remote("describe", "not here"))
                }
            },
            None,
        )
        .unwrap();

        assert_eq!(outcome.zone, "zone-b");
        assert_eq!(outcome.probed, 2);
        assert!(!outcome.pinned);
        // zone-c never probed
        assert_eq!(seen, vec!["zone-a", "zone-b"]);
        assert_eq!(state.get_str("availability_zone"), Some("zone-b"));
    }

    #[test]
    fn test_existence_predicate_rejects_empty_response() {
        let mut state = ResourceState::new();

        let outcome = resolve_zone(
            &spec(),
            &mut state,
            &WireRequest::new(),
            catalog,
            |req| match req.get("Zone") {
                Some("zone-c") => Ok(Value::from("srv-1")),
                _ => Ok(Value::Null),
            },
            Some(&|payload: &Value| !payload.is_null()),
        )
        .unwrap();

        assert_eq!(outcome.zone, "zone-c");
        assert_eq!(outcome.probed, 3);
    }

    #[test]
    fn test_exhaustion_probes_every_candidate_once() {
        let mut state = ResourceState::new();
        let mut calls = 0;

        let err = resolve_zone(
            &spec(),
            &mut state,
            &WireRequest::new(),
            catalog,
            |_| {
                calls += 1;
                Err(ConvergeError::remote("describe", "nope"))
            },
            None,
        )
        .unwrap_err();

        // Only the three eu zones are candidates.
        assert_eq!(calls, 3);
        assert!(matches!(err, ConvergeError::ZoneExhausted { attempts: 3, .. }));
        assert!(!state.has("availability_zone"));
    }

    #[test]
    fn test_persisted_zone_skips_search() {
        let mut state = ResourceState::new().with_field("availability_zone", "zone-b");
        let mut seen = Vec::new();

        let outcome = resolve_zone(
            &spec(),
            &mut state,
            &WireRequest::new(),
            || panic!("catalog must not be fetched"),
            |req| {
                seen.push(req.get("Zone").unwrap().to_string());
                Ok(Value::Null)
            },
            None,
        )
        .unwrap();

        assert!(outcome.pinned);
        assert_eq!(outcome.probed, 1);
        assert_eq!(seen, vec!["zone-b"]);
    }

    #[test]
    fn test_persisted_zone_error_propagates() {
        let mut state = ResourceState::new().with_field("availability_zone", "zone-b");

        let err = resolve_zone(
            &spec(),
            &mut state,
            &WireRequest::new(),
            || panic!("catalog must not be fetched"),
            |_| Err(ConvergeError::remote("describe", "gone")),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, ConvergeError::Remote { .. }));
    }
}
