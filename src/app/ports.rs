//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FSM drivers / handlers (domain)
//! ```
//!
//! Driven adapters (link probe, collector, broker client, LEDs, entropy,
//! event sinks) implement these traits.  The connectivity drivers and the
//! task loops consume them via generics, so the domain core never touches
//! the network stack or GPIO directly.

use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Link reachability
// ───────────────────────────────────────────────────────────────

/// Link-layer reachability check (interface up with a routable address).
pub trait LinkProbe {
    fn probe_link_reachable(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Collector registration (glucose node)
// ───────────────────────────────────────────────────────────────

/// Outcome of one registration exchange with the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationResult {
    /// The collector answered `Success`.
    Success,
    /// No reply arrived before the transport gave up.
    Timeout,
    /// A reply arrived but it was not `Success`.
    Rejected,
}

impl RegistrationResult {
    /// Acceptance token the collector sends back.
    pub const ACCEPT: &'static [u8] = b"Success";

    /// Classify a raw reply.  `None` means the exchange timed out.
    pub fn from_reply(reply: Option<&[u8]>) -> Self {
        match reply {
            None => Self::Timeout,
            Some(payload) if payload == Self::ACCEPT => Self::Success,
            Some(_) => Self::Rejected,
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Success => Ok(()),
            Self::Timeout => Err(Error::ConnectivityTimeout),
            Self::Rejected => Err(Error::RegistrationRejected),
        }
    }
}

/// Confirmable POST announcing this node to the collector.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationRequest<'a> {
    pub endpoint: &'a str,
    pub path: &'a str,
    pub payload: &'a str,
}

/// Request/response transport towards the collector.
///
/// The future resolves once a reply arrives or the transport's own
/// retransmission budget is exhausted.
#[allow(async_fn_in_trait)]
pub trait Registrar {
    async fn register(&mut self, request: &RegistrationRequest<'_>) -> RegistrationResult;
}

// ───────────────────────────────────────────────────────────────
// Broker client (CVD node)
// ───────────────────────────────────────────────────────────────

/// Whether a subscribe request made it into the client's out queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Queued,
    QueueFull,
}

/// Parameters for one broker connection attempt.
#[derive(Debug, Clone, Copy)]
pub struct ConnectParams<'a> {
    pub client_id: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub keep_alive_secs: u32,
    pub clean_session: bool,
}

/// Publish/subscribe client.  Connection progress is reported
/// asynchronously as [`BrokerEvent`](crate::channels::BrokerEvent)s.
pub trait BrokerClient {
    /// Start connecting.  `Ok` only means the attempt is under way.
    fn connect(&mut self, params: &ConnectParams<'_>) -> Result<()>;

    fn subscribe(&mut self, topic: &str) -> SubscribeOutcome;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Tear the session down.  Safe to call when not connected.
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Indicator LEDs
// ───────────────────────────────────────────────────────────────

/// The three discrete indicator LEDs fitted to both boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Red,
    Yellow,
    Green,
}

pub trait IndicatorPort {
    fn set_led(&mut self, led: Led, on: bool);

    fn is_on(&self, led: Led) -> bool;

    fn toggle(&mut self, led: Led) {
        let on = self.is_on(led);
        self.set_led(led, !on);
    }

    /// Light exactly one LED, switching the other two off.
    fn show_only(&mut self, led: Led) {
        for l in [Led::Red, Led::Yellow, Led::Green] {
            self.set_led(l, l == led);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Entropy
// ───────────────────────────────────────────────────────────────

pub trait RandomSource {
    /// Uniform integer in `lo..=hi`.
    fn uniform(&mut self, lo: i32, hi: i32) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
