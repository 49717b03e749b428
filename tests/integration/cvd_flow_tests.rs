//! CVD node flows: broker session lifecycle, alert messages, cardio
//! reports, the alert hold and the button auto-reset.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures_lite::future::{self, block_on};

use vitalnode::app::events::AppEvent;
use vitalnode::app::ports::{IndicatorPort, Led};
use vitalnode::channels::{BrokerEvent, BrokerEventChannel};
use vitalnode::config::NodeConfig;
use vitalnode::drivers::button::{button_isr_handler, ButtonDebouncer, ButtonState, SharedButton};
use vitalnode::fsm::session::{BrokerSession, ConnectionEvent, SessionState};
use vitalnode::indicator::AlertHold;
use vitalnode::runtime::cvd::{
    alert_task, button_task, publish_report, session_task, wait_for_tick, CvdShared,
};
use vitalnode::runtime::sleep;
use vitalnode::sensors::cardio;
use vitalnode::state::{DeviceState, SharedDeviceState};

use crate::mocks::{
    fast_config, BrokerCall, FixedRng, ManualClock, MockBroker, MockPanel, RecordingSink,
    ScriptedLink,
};

const CLIENT_ID: &str = "deadbeefcafe";

// ── Session over the broker event channel ─────────────────────

#[test]
fn session_lifecycle_driven_by_broker_events() {
    let events = BrokerEventChannel::new();
    let config = NodeConfig {
        // Long tick: waits below only end on broker events.
        session_tick_ms: 60_000,
        ..NodeConfig::default()
    };
    let broker = MockBroker::default();
    let calls = broker.log();
    let mut session = BrokerSession::new(ScriptedLink::up(), broker, config.clone(), CLIENT_ID);
    let device = SharedDeviceState::new(DeviceState::boot(0));
    let button = SharedButton::new(ButtonState::default());
    let mut sink = RecordingSink::default();

    // Link up: connect is issued and the session waits for CONNACK.
    assert_eq!(session.poll(&mut sink), SessionState::Connecting);
    assert_eq!(
        calls.borrow()[0],
        BrokerCall::Connect {
            client_id: CLIENT_ID.into(),
            host: "fd00::1".into(),
            port: 1883,
            keep_alive_secs: 90,
            clean_session: true,
        }
    );

    // Publishing before subscription is refused.
    assert!(publish_report(&mut session, &mut FixedRng(0), &button, &config, &mut sink).is_err());

    events.try_send(BrokerEvent::Connected).unwrap();
    block_on(wait_for_tick(&mut session, &events, &device, &config, &mut sink));
    assert_eq!(session.poll(&mut sink), SessionState::Subscribed);
    assert_eq!(
        calls.borrow()[1],
        BrokerCall::Subscribe("Emergency_Alert".into())
    );

    // Alert messages are applied while waiting; other topics are ignored.
    events
        .try_send(BrokerEvent::message("Other/Topic", b"ON").unwrap())
        .unwrap();
    events
        .try_send(BrokerEvent::message("Emergency_Alert", b"ON").unwrap())
        .unwrap();
    events.try_send(BrokerEvent::Disconnected).unwrap();
    block_on(wait_for_tick(&mut session, &events, &device, &config, &mut sink));
    assert!(device.read().alert);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CommandRejected(_))),
        1
    );

    // Disconnect tears the client down and falls back to INIT.
    assert_eq!(session.poll(&mut sink), SessionState::Init);
    assert_eq!(calls.borrow().last(), Some(&BrokerCall::Disconnect));

    // Next poll reconnects.
    assert_eq!(session.poll(&mut sink), SessionState::Connecting);
    let connects = calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, BrokerCall::Connect { .. }))
        .count();
    assert_eq!(connects, 2);
}

#[test]
fn subscribe_queue_full_parks_session() {
    let broker = MockBroker {
        queue_full: true,
        ..MockBroker::default()
    };
    let calls = broker.log();
    let mut session = BrokerSession::new(
        ScriptedLink::up(),
        broker,
        NodeConfig::default(),
        CLIENT_ID,
    );
    let mut sink = RecordingSink::default();

    session.poll(&mut sink);
    session.on_event(ConnectionEvent::Connected);
    assert_eq!(session.poll(&mut sink), SessionState::Aborted);

    // Dormant: further polls and events change nothing.
    session.on_event(ConnectionEvent::Disconnected);
    assert_eq!(session.poll(&mut sink), SessionState::Aborted);
    assert_eq!(calls.borrow().len(), 2, "connect + subscribe only");
}

#[test]
fn session_task_exits_after_rejected_subscribe() {
    let events = BrokerEventChannel::new();
    events.try_send(BrokerEvent::Connected).unwrap();
    let broker = MockBroker {
        queue_full: true,
        ..MockBroker::default()
    };
    let calls = broker.log();
    let config = fast_config();
    let session = BrokerSession::new(ScriptedLink::up(), broker, config.clone(), CLIENT_ID);
    let shared = CvdShared::default();

    block_on(session_task(
        session,
        &events,
        shared.clone(),
        FixedRng(0),
        config,
        RecordingSink::default(),
    ));

    let c = shared.connection.read();
    assert_eq!(c.state, "ABORTED");
    assert!(!c.online);
    assert_eq!(calls.borrow().len(), 2, "connect + subscribe only");
}

#[test]
fn session_task_publishes_once_per_tick() {
    let events = BrokerEventChannel::new();
    events.try_send(BrokerEvent::Connected).unwrap();
    let broker = MockBroker::default();
    let calls = broker.log();
    let config = NodeConfig {
        session_tick_ms: 20,
        ..fast_config()
    };
    let session = BrokerSession::new(ScriptedLink::up(), broker, config.clone(), CLIENT_ID);
    let shared = CvdShared::default();

    // The task never returns while subscribed; stop it after 110 ms.
    block_on(future::or(
        session_task(
            session,
            &events,
            shared.clone(),
            FixedRng(0),
            config,
            RecordingSink::default(),
        ),
        sleep(Duration::from_millis(110)),
    ));

    assert!(shared.connection.read().online);
    let calls = calls.borrow();
    let publishes: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            BrokerCall::Publish { topic, .. } => Some(topic.as_str()),
            _ => None,
        })
        .collect();
    assert!(publishes.iter().all(|t| *t == "Heart/Data"));
    // One report on subscribing, then one per 20 ms tick at most.
    assert!(
        (2..=6).contains(&publishes.len()),
        "{} reports in 110 ms",
        publishes.len()
    );
}

#[test]
fn subscribed_session_publishes_cardio_report() {
    let broker = MockBroker::default();
    let calls = broker.log();
    let config = NodeConfig::default();
    let mut session = BrokerSession::new(ScriptedLink::up(), broker, config.clone(), CLIENT_ID);
    let mut sink = RecordingSink::default();
    session.poll(&mut sink);
    session.on_event(ConnectionEvent::Connected);
    assert_eq!(session.poll(&mut sink), SessionState::Subscribed);

    let button = SharedButton::new(ButtonState::default());
    button.update(|b| b.press(0, 10_000));
    publish_report(&mut session, &mut FixedRng(3), &button, &config, &mut sink).unwrap();

    let expected = format!(
        r#"{{"patientId":1,"client_id":"{}","heart_rate":{},"blood_pressure":{},"button":1}}"#,
        CLIENT_ID,
        cardio::HEART_RATE_RANGE.0 + 3,
        cardio::BLOOD_PRESSURE_RANGE.0 + 3,
    );
    assert_eq!(
        calls.borrow().last(),
        Some(&BrokerCall::Publish {
            topic: "Heart/Data".into(),
            payload: expected,
        })
    );
}

// ── Alert hold ────────────────────────────────────────────────

#[test]
fn alert_holds_for_full_interval_and_does_not_retrigger_early() {
    let mut panel = MockPanel::default();
    let mut sink = RecordingSink::default();
    let mut hold = AlertHold::new(0, 5_000, 10_000);

    // Flag raised at 1s, noticed on the 5s poll.
    hold.drive(1_000, true, &mut panel, &mut sink);
    assert!(!panel.is_on(Led::Red));
    hold.drive(5_000, true, &mut panel, &mut sink);
    assert!(panel.is_on(Led::Red));

    // Flag cleared mid-hold: LED stays lit.
    hold.drive(10_000, false, &mut panel, &mut sink);
    assert!(panel.is_on(Led::Red));

    // Hold expires at 15s.
    hold.drive(15_000, false, &mut panel, &mut sink);
    assert!(!panel.is_on(Led::Red));

    // A later poll re-triggers.
    hold.drive(20_000, true, &mut panel, &mut sink);
    assert!(panel.is_on(Led::Red));

    assert_eq!(
        sink.events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::AlertIndicator { lit } => Some(lit),
                _ => None,
            })
            .collect::<Vec<_>>(),
        vec![true, false, true]
    );
}

#[test]
fn alert_task_follows_the_clock() {
    let device = Rc::new(SharedDeviceState::new(DeviceState::boot(0)));
    let panel = Rc::new(RefCell::new(MockPanel::default()));
    let clock = Rc::new(ManualClock::default());
    let config = NodeConfig {
        alert_poll_ms: 20,
        alert_hold_ms: 40,
        ..NodeConfig::default()
    };
    let sink = RecordingSink::default();
    let red = || panel.borrow().is_on(Led::Red);

    let script = async {
        // Raised before the first poll: lit once the 20 ms poll comes due.
        device.update(|s| s.alert = true);
        clock.set(20);
        sleep(Duration::from_millis(80)).await;
        assert!(red());

        // Cleared mid-hold: stays lit.
        device.update(|s| s.alert = false);
        clock.set(40);
        sleep(Duration::from_millis(80)).await;
        assert!(red());

        // Hold expires at 60.
        clock.set(60);
        sleep(Duration::from_millis(80)).await;
        assert!(!red());
    };

    block_on(future::or(
        alert_task(
            device.clone(),
            panel.clone(),
            clock.clone(),
            config,
            sink.clone(),
        ),
        script,
    ));

    assert_eq!(
        sink.events(),
        vec![
            AppEvent::AlertIndicator { lit: true },
            AppEvent::AlertIndicator { lit: false },
        ]
    );
}

// ── Button ────────────────────────────────────────────────────

// The only test in this binary that raises ISR edges.
#[test]
fn button_task_latches_isr_edge_and_resets_after_ten_seconds() {
    let button = Rc::new(SharedButton::new(ButtonState::default()));
    let clock = Rc::new(ManualClock::default());
    let sink = RecordingSink::default();

    let script = async {
        clock.set(1_000);
        button_isr_handler();
        sleep(Duration::from_millis(150)).await;
        assert!(button.read().pressed);

        clock.set(10_999);
        sleep(Duration::from_millis(150)).await;
        assert!(button.read().pressed, "still inside the reset window");

        clock.set(11_000);
        sleep(Duration::from_millis(150)).await;
        assert!(!button.read().pressed);
    };

    block_on(future::or(
        button_task(button.clone(), clock.clone(), NodeConfig::default(), sink.clone()),
        script,
    ));

    assert_eq!(
        sink.events(),
        vec![
            AppEvent::ButtonChanged { pressed: true },
            AppEvent::ButtonChanged { pressed: false },
        ]
    );
}

#[test]
fn new_press_extends_the_reset_deadline() {
    let button = SharedButton::new(ButtonState::default());
    let mut debouncer = ButtonDebouncer::new(10_000);
    let mut sink = RecordingSink::default();

    debouncer.on_edge(0, &button, &mut sink);
    debouncer.on_edge(6_000, &button, &mut sink);
    debouncer.poll(10_000, &button, &mut sink);
    assert!(button.read().pressed);
    debouncer.poll(16_000, &button, &mut sink);
    assert!(!button.read().pressed);
}
