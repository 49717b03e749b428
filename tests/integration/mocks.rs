//! Mock adapters for integration tests.
//!
//! Every mock records what it was asked to do so tests can assert on the
//! full history without touching real GPIO or a network stack.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use vitalnode::app::events::AppEvent;
use vitalnode::app::ports::{
    BrokerClient, Clock, ConnectParams, EventSink, IndicatorPort, Led, LinkProbe, RandomSource,
    SubscribeOutcome,
};
use vitalnode::config::NodeConfig;
use vitalnode::error::{Error, Result};

// ── Event sink ────────────────────────────────────────────────

/// Clonable sink; clones share one event log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// ── Link probe ────────────────────────────────────────────────

/// Answers from a script, then `true` forever.
pub struct ScriptedLink {
    script: VecDeque<bool>,
    pub probes: Rc<Cell<u32>>,
}

impl ScriptedLink {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            probes: Rc::new(Cell::new(0)),
        }
    }

    pub fn up() -> Self {
        Self::new([])
    }
}

impl LinkProbe for ScriptedLink {
    fn probe_link_reachable(&mut self) -> bool {
        self.probes.set(self.probes.get() + 1);
        self.script.pop_front().unwrap_or(true)
    }
}

// ── Broker client ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Connect {
        client_id: String,
        host: String,
        port: u16,
        keep_alive_secs: u32,
        clean_session: bool,
    },
    Subscribe(String),
    Publish { topic: String, payload: String },
    Disconnect,
}

#[derive(Default)]
pub struct MockBroker {
    pub calls: Rc<RefCell<Vec<BrokerCall>>>,
    pub queue_full: bool,
}

impl MockBroker {
    pub fn log(&self) -> Rc<RefCell<Vec<BrokerCall>>> {
        self.calls.clone()
    }
}

impl BrokerClient for MockBroker {
    fn connect(&mut self, params: &ConnectParams<'_>) -> Result<()> {
        self.calls.borrow_mut().push(BrokerCall::Connect {
            client_id: params.client_id.to_string(),
            host: params.host.to_string(),
            port: params.port,
            keep_alive_secs: params.keep_alive_secs,
            clean_session: params.clean_session,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> SubscribeOutcome {
        self.calls
            .borrow_mut()
            .push(BrokerCall::Subscribe(topic.to_string()));
        if self.queue_full {
            SubscribeOutcome::QueueFull
        } else {
            SubscribeOutcome::Queued
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let payload = String::from_utf8(payload.to_vec()).map_err(|_| Error::Payload)?;
        self.calls.borrow_mut().push(BrokerCall::Publish {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.borrow_mut().push(BrokerCall::Disconnect);
    }
}

// ── Indicator LEDs ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPanel {
    on: [bool; 3],
}

impl MockPanel {
    /// `(red, yellow, green)`.
    pub fn lit(&self) -> (bool, bool, bool) {
        (self.on[0], self.on[1], self.on[2])
    }
}

fn slot(led: Led) -> usize {
    match led {
        Led::Red => 0,
        Led::Yellow => 1,
        Led::Green => 2,
    }
}

impl IndicatorPort for MockPanel {
    fn set_led(&mut self, led: Led, on: bool) {
        self.on[slot(led)] = on;
    }

    fn is_on(&self, led: Led) -> bool {
        self.on[slot(led)]
    }
}

// ── Randomness / time ─────────────────────────────────────────

/// Always returns the same in-range value: `lo + offset`, capped at `hi`.
pub struct FixedRng(pub i32);

impl RandomSource for FixedRng {
    fn uniform(&mut self, lo: i32, hi: i32) -> i32 {
        (lo + self.0).min(hi)
    }
}

#[derive(Default)]
pub struct ManualClock(pub Cell<u64>);

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ── Config ────────────────────────────────────────────────────

/// Default config with millisecond-scale connectivity intervals.
pub fn fast_config() -> NodeConfig {
    NodeConfig {
        link_probe_interval_ms: 1,
        registration_retry_ms: 1,
        session_tick_ms: 1,
        ..NodeConfig::default()
    }
}
