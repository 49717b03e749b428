//! CVD node tasks.
//!
//! 1. **Session**: drives [`BrokerSession`], publishes one cardio report
//!    per tick while subscribed and applies alert messages.  Broker
//!    connection events cut the current wait short so a disconnect is
//!    acted on immediately.  A rejected subscribe ends the task.
//! 2. **Indicator**: blinks yellow until the first subscription.
//! 3. **Alert**: red LED with a minimum hold, on its own coarse poll.
//! 4. **Button**: consumes ISR edges and expires the pressed flag.

use core::cell::RefCell;
use core::time::Duration;
use std::rc::Rc;
use std::time::Instant;

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, info, warn};

use super::{publish_connection, sleep, Executor};
use crate::app::commands::handle_broker_message;
use crate::app::payload::{report_vital, CardioReport};
use crate::app::ports::{BrokerClient, Clock, EventSink, IndicatorPort, LinkProbe, RandomSource};
use crate::channels::{BrokerEvent, BrokerEventChannel, BROKER_EVENTS};
use crate::config::NodeConfig;
use crate::drivers::button::{self, ButtonDebouncer, ButtonState, SharedButton};
use crate::error::Result;
use crate::fsm::StateSet;
use crate::fsm::session::{BrokerSession, ConnectionEvent, SessionState};
use crate::indicator::{AlertHold, IndicatorController, Profile};
use crate::sensors::cardio;
use crate::state::{ConnectionState, DeviceState, SharedConnection, SharedDeviceState};

/// Collaborators the CVD node runs against.
pub struct CvdNode<P, B, G, L, C> {
    pub config: NodeConfig,
    pub client_id: heapless::String<24>,
    pub probe: P,
    pub broker: B,
    pub rng: G,
    pub leds: L,
    pub clock: C,
}

/// State shared between the CVD tasks.
#[derive(Clone)]
pub struct CvdShared {
    pub device: Rc<SharedDeviceState>,
    pub button: Rc<SharedButton>,
    pub connection: Rc<SharedConnection>,
}

impl Default for CvdShared {
    fn default() -> Self {
        Self {
            device: Rc::new(SharedDeviceState::new(DeviceState::boot(0))),
            button: Rc::new(SharedButton::new(ButtonState::default())),
            connection: Rc::new(SharedConnection::new(ConnectionState::offline(
                SessionState::Init.name(),
            ))),
        }
    }
}

/// Spawn every CVD task on `executor`.
pub fn spawn<'a, P, B, G, L, C, E>(
    executor: &Executor<'a>,
    node: CvdNode<P, B, G, L, C>,
    shared: CvdShared,
    sink: E,
) where
    P: LinkProbe + 'a,
    B: BrokerClient + 'a,
    G: RandomSource + 'a,
    L: IndicatorPort + 'a,
    C: Clock + 'a,
    E: EventSink + Clone + 'a,
{
    let CvdNode {
        config,
        client_id,
        probe,
        broker,
        rng,
        leds,
        clock,
    } = node;

    let leds = Rc::new(RefCell::new(leds));
    let clock = Rc::new(clock);
    let session = BrokerSession::new(probe, broker, config.clone(), &client_id);

    executor
        .spawn(session_task(
            session,
            &BROKER_EVENTS,
            shared.clone(),
            rng,
            config.clone(),
            sink.clone(),
        ))
        .detach();
    executor
        .spawn(indicator_task(
            shared.connection.clone(),
            leds.clone(),
            config.clone(),
        ))
        .detach();
    executor
        .spawn(alert_task(
            shared.device.clone(),
            leds,
            clock.clone(),
            config.clone(),
            sink.clone(),
        ))
        .detach();
    executor
        .spawn(button_task(shared.button, clock, config, sink))
        .detach();

    info!("CVD node: tasks spawned (client id {})", client_id);
}

/// Build and publish one cardio report.
pub fn publish_report<P: LinkProbe, B: BrokerClient>(
    session: &mut BrokerSession<P, B>,
    rng: &mut impl RandomSource,
    button: &SharedButton,
    config: &NodeConfig,
    sink: &mut impl EventSink,
) -> Result<()> {
    let sample = cardio::sample(rng, button.read().pressed, sink);
    let body = report_vital(&CardioReport {
        patient_id: config.patient_id,
        client_id: session.client_id(),
        heart_rate: sample.heart_rate,
        blood_pressure: sample.blood_pressure,
        button: u8::from(sample.button),
    })?;
    session.publish(&config.report_topic, body.as_bytes())
}

/// Wait out `session`'s tick, applying alert messages from `events` as
/// they arrive.  A connection event is handed to the session and ends the
/// wait early.
pub async fn wait_for_tick<P: LinkProbe, B: BrokerClient>(
    session: &mut BrokerSession<P, B>,
    events: &BrokerEventChannel,
    device: &SharedDeviceState,
    config: &NodeConfig,
    sink: &mut impl EventSink,
) {
    let deadline = Instant::now() + session.next_wait();
    loop {
        let woke = future::or(
            async {
                Timer::at(deadline).await;
                None
            },
            async { Some(events.receive().await) },
        )
        .await;

        match woke {
            None => return,
            Some(BrokerEvent::Message { topic, payload }) => {
                let handled =
                    handle_broker_message(device, &config.alert_topic, &topic, &payload, sink);
                if let Err(e) = handled {
                    debug!("MQTT: message on {} ignored: {}", topic, e);
                }
            }
            Some(BrokerEvent::Connected) => {
                session.on_event(ConnectionEvent::Connected);
                return;
            }
            Some(BrokerEvent::Disconnected) => {
                session.on_event(ConnectionEvent::Disconnected);
                return;
            }
        }
    }
}

pub async fn session_task<P: LinkProbe, B: BrokerClient>(
    mut session: BrokerSession<P, B>,
    events: &BrokerEventChannel,
    shared: CvdShared,
    mut rng: impl RandomSource,
    config: NodeConfig,
    mut sink: impl EventSink,
) {
    loop {
        let state = session.poll(&mut sink);
        publish_connection(&shared.connection, state, state == SessionState::Subscribed);

        match state {
            SessionState::Aborted => {
                warn!("SESSION | subscribe rejected, dormant until reboot");
                return;
            }
            SessionState::Subscribed => {
                let published =
                    publish_report(&mut session, &mut rng, &shared.button, &config, &mut sink);
                if let Err(e) = published {
                    warn!("MQTT: report not published: {}", e);
                }
            }
            _ => {}
        }

        wait_for_tick(&mut session, events, &shared.device, &config, &mut sink).await;
    }
}

pub async fn indicator_task<L: IndicatorPort>(
    connection: Rc<SharedConnection>,
    leds: Rc<RefCell<L>>,
    config: NodeConfig,
) {
    let mut controller = IndicatorController::new(Profile::Cardio);
    let idle = DeviceState::boot(0);
    while !controller.is_online() {
        controller.tick(connection.read().online, &idle, &mut *leds.borrow_mut());
        sleep(config.indicator_interval()).await;
    }
    debug!("LED | connecting blink stopped");
}

/// Delay from `now_ms` until `wake_ms`, at least 1 ms so a wake that is
/// already due never spins.
pub fn delay_until(wake_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(wake_ms.saturating_sub(now_ms).max(1))
}

pub async fn alert_task<L: IndicatorPort, C: Clock>(
    device: Rc<SharedDeviceState>,
    leds: Rc<RefCell<L>>,
    clock: Rc<C>,
    config: NodeConfig,
    mut sink: impl EventSink,
) {
    let mut hold = AlertHold::new(
        clock.now_ms(),
        u64::from(config.alert_poll_ms),
        u64::from(config.alert_hold_ms),
    );
    loop {
        let now = clock.now_ms();
        hold.drive(now, device.read().alert, &mut *leds.borrow_mut(), &mut sink);
        sleep(delay_until(hold.next_wake_ms(), clock.now_ms())).await;
    }
}

pub async fn button_task<C: Clock>(
    button: Rc<SharedButton>,
    clock: Rc<C>,
    config: NodeConfig,
    mut sink: impl EventSink,
) {
    let mut debouncer = ButtonDebouncer::new(u64::from(config.button_reset_ms));
    loop {
        debouncer.tick(clock.now_ms(), &button, &mut sink);
        sleep(Duration::from_millis(button::POLL_MS)).await;
    }
}
