//! Glucose node flows: registration, simulation under actuation, the
//! indicator priority and the resource table over the request channel.

use std::rc::Rc;

use futures_lite::future::block_on;

use vitalnode::adapters::collector::SimCollector;
use vitalnode::app::commands::{apply_command, Actuator};
use vitalnode::app::events::AppEvent;
use vitalnode::app::ports::RegistrationResult;
use vitalnode::app::resources::{GlucoseResources, Method, ResponseCode};
use vitalnode::channels::{
    submit_resource_request, try_take_resource_reply, ResourceRequest, RESOURCE_REPLIES,
};
use vitalnode::fsm::registration::{RegState, RegistrationClient, RegistrationStep};
use vitalnode::indicator::{IndicatorController, Pattern, Profile};
use vitalnode::runtime::glucose::{registration_task, serve_next_request};
use vitalnode::sensors::glucose;
use vitalnode::state::{ConnectionState, DeviceState, SharedConnection, SharedDeviceState};

use crate::mocks::{fast_config, FixedRng, MockPanel, RecordingSink, ScriptedLink};

fn shared(level: i32) -> SharedDeviceState {
    SharedDeviceState::new(DeviceState::boot(level))
}

// ── Registration ──────────────────────────────────────────────

#[test]
fn registration_waits_for_link_then_retries_after_timeout() {
    let link = ScriptedLink::new([false, false, true]);
    let probes = link.probes.clone();
    let collector = SimCollector::scripted([None, Some(RegistrationResult::ACCEPT.to_vec())]);
    let mut client = RegistrationClient::new(link, collector, fast_config());
    let mut sink = RecordingSink::default();

    // Link down twice: stay in LINK_CHECK, nothing sent.
    for _ in 0..2 {
        let step = block_on(client.poll(&mut sink));
        assert!(matches!(step, RegistrationStep::Wait(_)));
        assert_eq!(client.state(), RegState::LinkCheck);
        assert_eq!(client.attempts(), 0);
    }

    // Link up: first request times out, retry is scheduled.
    let step = block_on(client.poll(&mut sink));
    assert!(matches!(step, RegistrationStep::Wait(_)));
    assert_eq!(client.state(), RegState::Registering);
    assert_eq!(client.attempts(), 1);

    // Retry is accepted.
    assert_eq!(block_on(client.poll(&mut sink)), RegistrationStep::Registered);
    assert!(client.is_registered());
    assert_eq!(client.attempts(), 2);
    assert_eq!(probes.get(), 3, "link is not probed once registering");

    let attempts: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::RegistrationAttempt { attempt, result } => Some((attempt, result)),
            _ => None,
        })
        .collect();
    assert_eq!(
        attempts,
        vec![
            (1, RegistrationResult::Timeout),
            (2, RegistrationResult::Success)
        ]
    );
}

#[test]
fn rejected_registration_is_retried_not_fatal() {
    let collector = SimCollector::scripted([
        Some(b"Failure".to_vec()),
        Some(b"Failure".to_vec()),
        Some(RegistrationResult::ACCEPT.to_vec()),
    ]);
    let mut client = RegistrationClient::new(ScriptedLink::up(), collector, fast_config());
    let mut sink = RecordingSink::default();

    let mut polls = 0;
    while block_on(client.poll(&mut sink)) != RegistrationStep::Registered {
        polls += 1;
        assert!(polls < 10, "registration never completed");
    }
    assert_eq!(client.attempts(), 3);
}

#[test]
fn registration_task_publishes_connection_state() {
    let connection = Rc::new(SharedConnection::new(ConnectionState::offline(
        "LINK_CHECK",
    )));
    let client = RegistrationClient::new(
        ScriptedLink::new([false]),
        SimCollector::default(),
        fast_config(),
    );

    block_on(registration_task(
        client,
        connection.clone(),
        RecordingSink::default(),
    ));

    let c = connection.read();
    assert!(c.online);
    assert_eq!(c.state, "REGISTERED");
}

// ── Simulation + actuation ────────────────────────────────────

#[test]
fn insulin_takes_precedence_over_glucagon() {
    let state = shared(120);
    let mut sink = RecordingSink::default();

    apply_command(&state, Actuator::Insulin, Some("ON"), &mut sink).unwrap();
    apply_command(&state, Actuator::Glucagon, Some("ON"), &mut sink).unwrap();
    let level = glucose::step(&state, &mut FixedRng(0), &mut sink);

    assert_eq!(level, 110);
    assert_eq!(state.read().vital, 110);
}

#[test]
fn treatment_has_no_floor_or_ceiling() {
    let state = shared(15);
    let mut sink = RecordingSink::default();

    apply_command(&state, Actuator::Insulin, Some("ON"), &mut sink).unwrap();
    for _ in 0..3 {
        glucose::step(&state, &mut FixedRng(0), &mut sink);
    }
    assert_eq!(state.read().vital, -15);

    apply_command(&state, Actuator::Insulin, Some("OFF"), &mut sink).unwrap();
    apply_command(&state, Actuator::Glucagon, Some("ON"), &mut sink).unwrap();
    state.update(|s| s.vital = 245);
    glucose::step(&state, &mut FixedRng(0), &mut sink);
    assert_eq!(state.read().vital, 255);
}

#[test]
fn untreated_level_is_resampled() {
    let state = shared(999);
    let level = glucose::step(&state, &mut FixedRng(7), &mut RecordingSink::default());
    assert_eq!(level, glucose::SAMPLE_RANGE.0 + 7);
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn indicator_blinks_until_registered_then_follows_priority() {
    let state = shared(100);
    let mut panel = MockPanel::default();
    let mut ctl = IndicatorController::new(Profile::Glucose);
    let mut sink = RecordingSink::default();

    assert_eq!(ctl.tick(false, &state.read(), &mut panel), Pattern::Connecting);
    assert_eq!(panel.lit(), (false, true, false));
    assert_eq!(ctl.tick(false, &state.read(), &mut panel), Pattern::Connecting);
    assert_eq!(panel.lit(), (false, false, false));

    assert_eq!(ctl.tick(true, &state.read(), &mut panel), Pattern::Stable);
    assert_eq!(panel.lit(), (false, false, true));

    apply_command(&state, Actuator::Glucagon, Some("ON"), &mut sink).unwrap();
    assert_eq!(ctl.tick(true, &state.read(), &mut panel), Pattern::Treatment);
    assert_eq!(panel.lit(), (false, true, false));

    apply_command(&state, Actuator::Alert, Some("ON"), &mut sink).unwrap();
    assert_eq!(ctl.tick(true, &state.read(), &mut panel), Pattern::Alert);
    assert_eq!(panel.lit(), (true, false, false));

    // The alert flag is not consumed by displaying it.
    assert!(state.read().alert);
}

// ── Resources over the request channel ────────────────────────

fn request(token: u16, method: Method, path: &str, body: &str) -> ResourceRequest {
    ResourceRequest {
        token,
        method,
        path: heapless::String::try_from(path).unwrap(),
        body: heapless::String::try_from(body).unwrap(),
    }
}

#[test]
fn resource_requests_round_trip_through_channels() {
    RESOURCE_REPLIES.clear();
    let state = shared(90);
    let resources = GlucoseResources::new(1);
    let mut sink = RecordingSink::default();

    let serve = |req: ResourceRequest, sink: &mut RecordingSink| {
        assert!(submit_resource_request(req));
        let reply = block_on(serve_next_request(&resources, &state, sink));
        assert_eq!(try_take_resource_reply().as_ref(), Some(&reply));
        reply
    };

    let reply = serve(request(1, Method::Get, "/glucose/level", ""), &mut sink);
    assert_eq!(reply.code, ResponseCode::Content);
    assert_eq!(reply.payload.as_str(), r#"{"patient_Id":1,"glucose_level":90}"#);

    let reply = serve(
        request(2, Method::Put, "/glucose_control/insulin", "status=ON"),
        &mut sink,
    );
    assert_eq!((reply.token, reply.code), (2, ResponseCode::Changed));
    assert!(state.read().insulin);

    let before = state.read();
    let reply = serve(
        request(3, Method::Put, "/glucose_control/glucagon", "status=on"),
        &mut sink,
    );
    assert_eq!(reply.code, ResponseCode::BadRequest);
    assert_eq!(state.read(), before, "rejected command must not change state");

    let reply = serve(request(4, Method::Get, "/glucose/pressure", ""), &mut sink);
    assert_eq!(reply.code, ResponseCode::NotFound);

    let reply = serve(
        request(5, Method::Put, "/glucose/level", "status=ON"),
        &mut sink,
    );
    assert_eq!(reply.code, ResponseCode::MethodNotAllowed);

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandRejected(_))),
        3
    );
}
