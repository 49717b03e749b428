//! ESP-IDF MQTT client adapter (CVD node).
//!
//! Implements [`BrokerClient`] on top of `EspMqttClient`.  A dedicated
//! receive thread drains the `EspMqttConnection` and forwards connection
//! changes and complete messages into [`BROKER_EVENTS`] for the session
//! task.  Dropping the client closes the connection, which ends the
//! receive thread.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::{info, warn};

use crate::app::ports::{BrokerClient, ConnectParams, SubscribeOutcome};
use crate::channels::{post_broker_event, BrokerEvent, BROKER_EVENTS};
use crate::config::broker_url;
use crate::drivers::task_pin::{spawn_on_core, Core};
use crate::error::{Error, Result};

/// Stack for the receive thread, in KB.
const RX_STACK_KB: usize = 6;
const RX_PRIORITY: u8 = 5;

/// Bumped on every connect.  A receive thread only forwards events while
/// its own generation is current, so a dying connection cannot inject a
/// stale `Disconnected` into the next session.
static GENERATION: AtomicU32 = AtomicU32::new(0);

#[derive(Default)]
pub struct EspBrokerClient {
    client: Option<EspMqttClient<'static>>,
}

impl EspBrokerClient {
    pub fn new() -> Self {
        Self { client: None }
    }
}

fn spawn_receiver(mut conn: EspMqttConnection, generation: u32) -> Result<()> {
    let forward = move |event: BrokerEvent| {
        if GENERATION.load(Ordering::Acquire) == generation {
            post_broker_event(event);
        }
    };
    spawn_on_core(Core::Pro, RX_PRIORITY, RX_STACK_KB, "mqtt-rx\0", move || {
        loop {
            match conn.next() {
                Ok(event) => match event.payload() {
                    EventPayload::Connected(_) => forward(BrokerEvent::Connected),
                    EventPayload::Disconnected => forward(BrokerEvent::Disconnected),
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        details,
                        ..
                    } => {
                        // Only whole payloads are commands.
                        if !matches!(details, Details::Complete) {
                            continue;
                        }
                        match BrokerEvent::message(topic, data) {
                            Some(msg) => forward(msg),
                            None => warn!(
                                "MQTT: dropping oversized message on {} ({} bytes)",
                                topic,
                                data.len()
                            ),
                        }
                    }
                    _ => {}
                },
                Err(e) => {
                    info!("MQTT: connection closed ({:?})", e);
                    break;
                }
            }
        }
    })
    .map(|_| ())
    .map_err(|_| Error::Init("mqtt receive thread"))
}

impl BrokerClient for EspBrokerClient {
    fn connect(&mut self, params: &ConnectParams<'_>) -> Result<()> {
        self.disconnect();
        let generation = GENERATION.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        BROKER_EVENTS.clear();

        let url = broker_url(params.host, params.port);
        let conf = MqttClientConfiguration {
            client_id: Some(params.client_id),
            keep_alive_interval: Some(Duration::from_secs(u64::from(params.keep_alive_secs))),
            disable_clean_session: !params.clean_session,
            ..Default::default()
        };

        let (client, conn) = EspMqttClient::new(url.as_str(), &conf).map_err(|e| {
            warn!("MQTT: client init for {} failed: {:?}", url, e);
            Error::Disconnected
        })?;
        spawn_receiver(conn, generation)?;
        info!("MQTT: connecting to {} as {}", url, params.client_id);
        self.client = Some(client);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> SubscribeOutcome {
        let Some(client) = self.client.as_mut() else {
            return SubscribeOutcome::QueueFull;
        };
        match client.subscribe(topic, QoS::AtMostOnce) {
            Ok(_) => SubscribeOutcome::Queued,
            Err(e) => {
                warn!("MQTT: subscribe to {} not queued: {:?}", topic, e);
                SubscribeOutcome::QueueFull
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let client = self.client.as_mut().ok_or(Error::Disconnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: publish to {} failed: {:?}", topic, e);
                Error::Publish
            })
    }

    fn disconnect(&mut self) {
        if self.client.take().is_some() {
            GENERATION.fetch_add(1, Ordering::AcqRel);
            info!("MQTT: client dropped");
        }
    }
}
