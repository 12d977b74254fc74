//! End-to-end lifecycle flows through all four engines, using the
//! scripted doubles from converge-testkit.

use converge_core::{
    map_to_wire, merge_response, resolve_zone, wait_for, ConvergeError, FieldRule, MapMode,
    PollSpec, ResponseRule, ResponseRules, RuleSet, Sequence, Step, WireRequest, ZoneSpec,
};
use converge_testkit::{MockRemote, StaticCatalog, StatusScript};
use converge_types::{ResourceState, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

fn server_rules() -> RuleSet {
    RuleSet::new()
        .rule("id", FieldRule::ignore())
        .rule("availability_zone", FieldRule::ignore())
        .rule("tags", FieldRule::expand("Tag"))
}

fn fast_poll() -> PollSpec {
    PollSpec::new(["running"])
        .pending(["provisioning"])
        .fail(["error"])
        .min_interval(Duration::from_millis(1))
        .timeout(Duration::from_secs(5))
}

#[test]
fn create_flow_resolves_zone_polls_and_merges() {
    let mut state = ResourceState::new()
        .with_field("name", "web-1")
        .with_field("size", "m3.large")
        .with_field("tags", Value::string_list(["prod", "web"]));

    // zone-a rejects the create, zone-b accepts and returns the new id.
    let remote = MockRemote::new()
        .fail("placement not available")
        .respond_json(json!({"ServerId": "srv-42", "Status": "provisioning"}));
    let catalog = StaticCatalog::new()
        .with_zone("zone-a", "eu")
        .with_zone("zone-b", "eu")
        .with_zone("zone-z", "us");
    let status = StatusScript::new(["provisioning", "provisioning", "running"]);

    // Request building is fallible and happens before any step runs.
    let request = map_to_wire(&mut state, &server_rules(), MapMode::Create).unwrap();
    assert_eq!(request.get("Name"), Some("web-1"));
    assert_eq!(request.get("Tag.1"), Some("prod"));
    assert_eq!(request.get("Tag.2"), Some("web"));
    assert!(!request.contains("Tag.3"));

    let zone_spec = ZoneSpec::new("availability_zone", "AvailabilityZone", "eu");
    let overrides = ResponseRules::new().rule("ServerId", ResponseRule::rename("id"));

    let sequence = Sequence::new()
        .step(Step::new("create server", |state: &mut ResourceState| {
            let outcome = resolve_zone(
                &zone_spec,
                state,
                &request,
                || catalog.fetch(),
                |req| remote.invoke(req),
                None,
            )?;
            merge_response(state, &outcome.payload, &overrides)
        }))
        .maybe_step(None)
        .step(Step::new("wait for running", |state: &mut ResourceState| {
            let attempt = wait_for(&fast_poll(), || status.refresh())?;
            state.set("last_poll_attempts", i64::from(attempt));
            Ok(())
        }));

    sequence.run(&mut state).unwrap();
    state.mark_applied();

    // The winning zone was persisted and the response merged.
    assert_eq!(state.get_str("availability_zone"), Some("zone-b"));
    assert_eq!(state.get_str("id"), Some("srv-42"));
    assert_eq!(state.get_str("status"), Some("provisioning"));
    assert_eq!(state.get_int("last_poll_attempts"), Some(3));
    assert!(!state.is_dirty());

    // Both zone probes carried the full request plus the injected zone.
    let calls = remote.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].get("AvailabilityZone"), Some("zone-a"));
    assert_eq!(calls[1].get("AvailabilityZone"), Some("zone-b"));
    assert_eq!(calls[1].get("Name"), Some("web-1"));
}

#[test]
fn update_flow_sends_only_the_delta() {
    let mut state = ResourceState::new()
        .with_field("name", "web-1")
        .with_field("size", "m3.large")
        .with_field("tags", Value::string_list(["prod"]));
    state.mark_applied();

    state.set("size", "m3.xlarge");

    let request = map_to_wire(&mut state, &server_rules(), MapMode::Update).unwrap();
    let pairs: Vec<_> = request.iter().collect();
    assert_eq!(pairs, vec![("Size", "m3.xlarge")]);
}

#[test]
fn failing_step_aborts_before_later_mutations() {
    let mut state = ResourceState::new().with_field("id", "srv-42");
    let remote = MockRemote::new();

    let err = Sequence::new()
        .step(Step::new("detach volume", |_state: &mut ResourceState| {
            Err(ConvergeError::remote("detach", "volume busy"))
        }))
        .step(Step::new("delete server", |_state: &mut ResourceState| {
            remote.invoke(&WireRequest::new()).map(|_| ())
        }))
        .run(&mut state)
        .unwrap_err();

    assert!(err.is_retryable());
    // The delete step never issued its call.
    assert_eq!(remote.call_count(), 0);
}

#[test]
fn second_operation_reuses_the_persisted_zone() {
    let mut state = ResourceState::new()
        .with_field("name", "web-1")
        .with_field("availability_zone", "zone-b");
    let remote = MockRemote::new().respond_json(json!({"Status": "running"}));

    let zone_spec = ZoneSpec::new("availability_zone", "AvailabilityZone", "eu");
    let outcome = resolve_zone(
        &zone_spec,
        &mut state,
        &WireRequest::new(),
        || panic!("catalog must not be consulted"),
        |req| remote.invoke(req),
        None,
    )
    .unwrap();

    assert!(outcome.pinned);
    assert_eq!(remote.call_count(), 1);
    assert_eq!(
        remote.last_call().unwrap().get("AvailabilityZone"),
        Some("zone-b")
    );
}

#[test]
fn wire_round_trip_reproduces_bijective_fields() {
    let mut original = ResourceState::new()
        .with_field("name", "web-1")
        .with_field("size", "m3.large")
        .with_field("core_count", 4);

    let request = map_to_wire(&mut original, &RuleSet::new(), MapMode::Create).unwrap();

    // Echo the request back as a response payload.
    let payload = Value::Map(
        request
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect(),
    );

    let mut restored = ResourceState::new();
    let rules = ResponseRules::new().rule(
        "CoreCount",
        ResponseRule::new().with_transform(|v| converge_core::merge::transforms::to_int()(v)),
    );
    merge_response(&mut restored, &payload, &rules).unwrap();

    assert_eq!(restored.get_str("name"), Some("web-1"));
    assert_eq!(restored.get_str("size"), Some("m3.large"));
    assert_eq!(restored.get_int("core_count"), Some(4));
}
