//! Broker session state machine (CVD node).
//!
//! ```text
//!          link up          connect sent      CONNACK          subscribe queued
//!   INIT ─────────▶ LINK_OK ──────────▶ CONNECTING ──────▶ CONNECTED ─────────▶ SUBSCRIBED
//!    ▲                  │                   │                  │                   │
//!    │                  ▼                   ▼                  ▼                   │
//!    └──────────── DISCONNECTED ◀───────────────────────────────────────────────────┘
//!
//!   CONNECTED ── subscribe queue full ──▶ ABORTED (dormant until reboot)
//! ```
//!
//! `DISCONNECTED` tears the client down and falls straight back to `INIT`.
//! A subscribe that cannot be queued is fatal: the session parks in
//! `ABORTED` until reboot.

use core::time::Duration;

use super::{Fsm, StateDescriptor, StateSet, Transition};
use crate::app::events::AppEvent;
use crate::app::ports::{BrokerClient, ConnectParams, EventSink, LinkProbe, SubscribeOutcome};
use crate::config::NodeConfig;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Init = 0,
    LinkOk = 1,
    Connecting = 2,
    Connected = 3,
    Subscribed = 4,
    Disconnected = 5,
    Aborted = 6,
}

impl StateSet for SessionState {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::LinkOk,
            2 => Self::Connecting,
            3 => Self::Connected,
            4 => Self::Subscribed,
            5 => Self::Disconnected,
            6 => Self::Aborted,
            _ => {
                debug_assert!(false, "invalid session state index: {idx}");
                Self::Aborted
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::LinkOk => "LINK_OK",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Subscribed => "SUBSCRIBED",
            Self::Disconnected => "DISCONNECTED",
            Self::Aborted => "ABORTED",
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Connection progress reported by the broker client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

/// Client operation requested by a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Connect,
    Subscribe,
    Disconnect,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    pub link_reachable: bool,
    /// Latest connection event not yet consumed by a handler.
    pub connection: Option<ConnectionEvent>,
    /// Result of the last subscribe request.
    pub subscribe: Option<SubscribeOutcome>,
    /// Client operation the driver must run before the next tick.
    pub pending: Option<SessionAction>,
}

impl SessionContext {
    /// Consume a pending disconnect notification.
    fn take_disconnect(&mut self) -> bool {
        if self.connection == Some(ConnectionEvent::Disconnected) {
            self.connection = None;
            true
        } else {
            false
        }
    }
}

fn init_enter(ctx: &mut SessionContext) {
    // The link is probed afresh at the start of the next poll.
    ctx.link_reachable = false;
    ctx.connection = None;
    ctx.subscribe = None;
}

fn init_update(ctx: &mut SessionContext) -> Option<SessionState> {
    ctx.link_reachable.then_some(SessionState::LinkOk)
}

fn link_ok_enter(ctx: &mut SessionContext) {
    ctx.pending = Some(SessionAction::Connect);
}

fn link_ok_update(ctx: &mut SessionContext) -> Option<SessionState> {
    if ctx.take_disconnect() {
        return Some(SessionState::Disconnected);
    }
    Some(SessionState::Connecting)
}

fn connecting_update(ctx: &mut SessionContext) -> Option<SessionState> {
    match ctx.connection.take()? {
        ConnectionEvent::Connected => Some(SessionState::Connected),
        ConnectionEvent::Disconnected => Some(SessionState::Disconnected),
    }
}

fn connected_enter(ctx: &mut SessionContext) {
    ctx.subscribe = None;
    ctx.pending = Some(SessionAction::Subscribe);
}

fn connected_update(ctx: &mut SessionContext) -> Option<SessionState> {
    if ctx.take_disconnect() {
        return Some(SessionState::Disconnected);
    }
    match ctx.subscribe.take()? {
        SubscribeOutcome::Queued => Some(SessionState::Subscribed),
        SubscribeOutcome::QueueFull => Some(SessionState::Aborted),
    }
}

fn subscribed_update(ctx: &mut SessionContext) -> Option<SessionState> {
    ctx.take_disconnect().then_some(SessionState::Disconnected)
}

fn disconnected_enter(ctx: &mut SessionContext) {
    ctx.pending = Some(SessionAction::Disconnect);
}

fn disconnected_update(_ctx: &mut SessionContext) -> Option<SessionState> {
    Some(SessionState::Init)
}

fn aborted_update(_ctx: &mut SessionContext) -> Option<SessionState> {
    None
}

pub fn build_state_table() -> [StateDescriptor<SessionState, SessionContext>; SessionState::COUNT] {
    [
        StateDescriptor {
            id: SessionState::Init,
            on_enter: Some(init_enter),
            on_exit: None,
            on_update: init_update,
        },
        StateDescriptor {
            id: SessionState::LinkOk,
            on_enter: Some(link_ok_enter),
            on_exit: None,
            on_update: link_ok_update,
        },
        StateDescriptor {
            id: SessionState::Connecting,
            on_enter: None,
            on_exit: None,
            on_update: connecting_update,
        },
        StateDescriptor {
            id: SessionState::Connected,
            on_enter: Some(connected_enter),
            on_exit: None,
            on_update: connected_update,
        },
        StateDescriptor {
            id: SessionState::Subscribed,
            on_enter: None,
            on_exit: None,
            on_update: subscribed_update,
        },
        StateDescriptor {
            id: SessionState::Disconnected,
            on_enter: Some(disconnected_enter),
            on_exit: None,
            on_update: disconnected_update,
        },
        StateDescriptor {
            id: SessionState::Aborted,
            on_enter: None,
            on_exit: None,
            on_update: aborted_update,
        },
    ]
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Upper bound on handler/action rounds per poll.  Every chain of
/// immediate transitions in the table is shorter than this.
const MAX_ROUNDS: usize = 2 * SessionState::COUNT;

/// Runs the session FSM against a link probe and a broker client.
pub struct BrokerSession<P, B> {
    fsm: Fsm<SessionState, SessionContext, { SessionState::COUNT }>,
    ctx: SessionContext,
    probe: P,
    client: B,
    config: NodeConfig,
    client_id: heapless::String<24>,
}

impl<P: LinkProbe, B: BrokerClient> BrokerSession<P, B> {
    pub const MACHINE: &'static str = "SESSION";

    pub fn new(probe: P, client: B, config: NodeConfig, client_id: &str) -> Self {
        let mut fsm = Fsm::new(Self::MACHINE, build_state_table(), SessionState::Init);
        let mut ctx = SessionContext::default();
        fsm.start(&mut ctx);
        let mut id = heapless::String::new();
        // Client ids are twelve hex digits; anything longer is truncated.
        for c in client_id.chars() {
            if id.push(c).is_err() {
                break;
            }
        }
        Self {
            fsm,
            ctx,
            probe,
            client,
            config,
            client_id: id,
        }
    }

    pub fn state(&self) -> SessionState {
        self.fsm.current_state()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Record a connection event from the broker client.  Takes effect on
    /// the next [`poll`](Self::poll).
    pub fn on_event(&mut self, event: ConnectionEvent) {
        self.ctx.connection = Some(event);
    }

    /// One scheduling step: probe the link if needed, then run handlers
    /// and the client operations they request until the FSM settles.
    pub fn poll(&mut self, sink: &mut impl EventSink) -> SessionState {
        if self.state() == SessionState::Init {
            self.ctx.link_reachable = self.probe.probe_link_reachable();
        }

        for _ in 0..MAX_ROUNDS {
            if let Some(action) = self.ctx.pending.take() {
                self.execute(action, sink);
            }
            let moved = self.advance(sink);
            if !moved && self.ctx.pending.is_none() {
                break;
            }
        }
        self.state()
    }

    /// Delay before the next poll in the current state.
    pub fn next_wait(&self) -> Duration {
        match self.state() {
            SessionState::Init => self.config.link_probe_interval(),
            _ => self.config.session_tick(),
        }
    }

    /// Publish on `topic`.  Only valid while subscribed.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        if self.state() != SessionState::Subscribed {
            return Err(Error::Disconnected);
        }
        self.client.publish(topic, payload)
    }

    fn execute(&mut self, action: SessionAction, sink: &mut impl EventSink) {
        match action {
            SessionAction::Connect => {
                let params = ConnectParams {
                    client_id: &self.client_id,
                    host: &self.config.broker_host,
                    port: self.config.broker_port,
                    keep_alive_secs: self.config.keep_alive_secs,
                    clean_session: true,
                };
                if let Err(e) = self.client.connect(&params) {
                    sink.emit(&AppEvent::ConnectivityError(e));
                    self.ctx.connection = Some(ConnectionEvent::Disconnected);
                }
            }
            SessionAction::Subscribe => {
                let outcome = self.client.subscribe(&self.config.alert_topic);
                if outcome == SubscribeOutcome::QueueFull {
                    sink.emit(&AppEvent::ConnectivityError(Error::SubscribeRejected));
                }
                self.ctx.subscribe = Some(outcome);
            }
            SessionAction::Disconnect => {
                sink.emit(&AppEvent::ConnectivityError(Error::Disconnected));
                self.client.disconnect();
            }
        }
    }

    fn advance(&mut self, sink: &mut impl EventSink) -> bool {
        match self.fsm.tick(&mut self.ctx) {
            Some(Transition { from, to }) => {
                sink.emit(&AppEvent::StateChanged {
                    machine: Self::MACHINE,
                    from: from.name(),
                    to: to.name(),
                });
                true
            }
            None => false,
        }
    }
}
