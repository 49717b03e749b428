//! Glucose node tasks.
//!
//! Four tasks share one executor:
//!
//! 1. **Registration**: drives [`RegistrationClient`] until the collector
//!    accepts the node, publishing its state for the indicator.
//! 2. **Simulation**: steps the glucose level every simulation interval.
//!    Runs from boot whether or not the node is registered.
//! 3. **Indicator**: blinks yellow while registering, then shows the
//!    priority pattern.
//! 4. **Resources**: answers requests handed over on
//!    [`RESOURCE_REQUESTS`].

use std::rc::Rc;

use log::{debug, info, warn};

use super::{publish_connection, sleep, Executor};
use crate::app::ports::{EventSink, IndicatorPort, LinkProbe, RandomSource, Registrar};
use crate::app::resources::{GlucoseResources, Request, ResponseCode};
use crate::channels::{ResourceReply, RESOURCE_REPLIES, RESOURCE_REQUESTS};
use crate::config::NodeConfig;
use crate::fsm::registration::{RegistrationClient, RegistrationStep};
use crate::indicator::{IndicatorController, Profile};
use crate::sensors::glucose;
use crate::state::{SharedConnection, SharedDeviceState};

/// Collaborators the glucose node runs against.
pub struct GlucoseNode<P, R, G, L> {
    pub config: NodeConfig,
    pub probe: P,
    pub registrar: R,
    pub rng: G,
    pub leds: L,
}

/// Spawn every glucose task on `executor`.
pub fn spawn<'a, P, R, G, L, E>(
    executor: &Executor<'a>,
    node: GlucoseNode<P, R, G, L>,
    state: Rc<SharedDeviceState>,
    connection: Rc<SharedConnection>,
    sink: E,
) where
    P: LinkProbe + 'a,
    R: Registrar + 'a,
    G: RandomSource + 'a,
    L: IndicatorPort + 'a,
    E: EventSink + Clone + 'a,
{
    let GlucoseNode {
        config,
        probe,
        registrar,
        rng,
        leds,
    } = node;

    let client = RegistrationClient::new(probe, registrar, config.clone());
    executor
        .spawn(registration_task(client, connection.clone(), sink.clone()))
        .detach();
    executor
        .spawn(simulation_task(
            state.clone(),
            rng,
            config.clone(),
            sink.clone(),
        ))
        .detach();
    executor
        .spawn(indicator_task(state.clone(), connection, leds, config.clone()))
        .detach();
    executor
        .spawn(resource_task(
            GlucoseResources::new(config.patient_id),
            state,
            sink,
        ))
        .detach();

    info!("Glucose node: tasks spawned");
}

/// Register with the collector, then finish.
pub async fn registration_task<P: LinkProbe, R: Registrar>(
    mut client: RegistrationClient<P, R>,
    connection: Rc<SharedConnection>,
    mut sink: impl EventSink,
) {
    loop {
        let step = client.poll(&mut sink).await;
        publish_connection(&connection, client.state(), client.is_registered());
        match step {
            RegistrationStep::Wait(delay) => sleep(delay).await,
            RegistrationStep::Registered => {
                info!("REG | registered after {} request(s)", client.attempts());
                return;
            }
        }
    }
}

pub async fn simulation_task(
    state: Rc<SharedDeviceState>,
    mut rng: impl RandomSource,
    config: NodeConfig,
    mut sink: impl EventSink,
) {
    loop {
        sleep(config.simulation_interval()).await;
        glucose::step(&state, &mut rng, &mut sink);
    }
}

pub async fn indicator_task(
    state: Rc<SharedDeviceState>,
    connection: Rc<SharedConnection>,
    mut leds: impl IndicatorPort,
    config: NodeConfig,
) {
    let mut controller = IndicatorController::new(Profile::Glucose);
    loop {
        controller.tick(connection.read().online, &state.read(), &mut leds);
        sleep(config.indicator_interval()).await;
    }
}

pub async fn resource_task(
    resources: GlucoseResources,
    state: Rc<SharedDeviceState>,
    mut sink: impl EventSink,
) {
    loop {
        serve_next_request(&resources, &state, &mut sink).await;
    }
}

/// Wait for one request, answer it and queue the reply for the transport.
pub async fn serve_next_request(
    resources: &GlucoseResources,
    state: &SharedDeviceState,
    sink: &mut impl EventSink,
) -> ResourceReply {
    let msg = RESOURCE_REQUESTS.receive().await;
    let request = Request {
        method: msg.method,
        path: &msg.path,
        body: &msg.body,
    };
    let response = resources.handle(state, &request, sink);

    let mut reply = ResourceReply {
        token: msg.token,
        code: response.code,
        payload: heapless::String::new(),
    };
    if let Some(body) = response.payload {
        if reply.payload.push_str(&body).is_err() {
            warn!("RES | {} body too large ({} bytes)", msg.path, body.len());
            reply.code = ResponseCode::InternalError;
        }
    }

    let (class, detail) = reply.code.code();
    debug!("RES | {:?} {} -> {}.{:02}", msg.method, msg.path, class, detail);
    if RESOURCE_REPLIES.try_send(reply.clone()).is_err() {
        warn!("RES | reply channel full, dropping reply {}", reply.token);
    }
    reply
}
