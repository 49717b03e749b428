//! Collector registration state machine (glucose node).
//!
//! ```text
//!            link up              reply "Success"
//!  LINK_CHECK ──────▶ REGISTERING ───────────────▶ REGISTERED
//!      ▲  │                │  ▲
//!      └──┘ probe / 2 s    └──┘ timeout or rejection: resend after 2 s
//! ```
//!
//! Registration is retried forever at a fixed interval; there is no
//! backoff and no attempt limit.  `REGISTERED` is terminal.

use core::time::Duration;

use super::{Fsm, StateDescriptor, StateSet, Transition};
use crate::app::events::AppEvent;
use crate::app::ports::{
    EventSink, LinkProbe, Registrar, RegistrationRequest, RegistrationResult,
};
use crate::config::NodeConfig;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegState {
    LinkCheck = 0,
    Registering = 1,
    Registered = 2,
}

impl StateSet for RegState {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::LinkCheck,
            1 => Self::Registering,
            2 => Self::Registered,
            _ => {
                debug_assert!(false, "invalid registration state index: {idx}");
                Self::LinkCheck
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::LinkCheck => "LINK_CHECK",
            Self::Registering => "REGISTERING",
            Self::Registered => "REGISTERED",
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Blackboard shared by the registration state handlers and the driver.
#[derive(Debug, Default)]
pub struct RegistrationContext {
    /// Result of the most recent link probe.
    pub link_reachable: bool,
    /// Reply to the request in flight, set by the driver.
    pub reply: Option<RegistrationResult>,
    /// Set by handlers when a registration request should be sent.
    pub send_request: bool,
    /// Requests sent so far.
    pub attempts: u32,
}

fn link_check_update(ctx: &mut RegistrationContext) -> Option<RegState> {
    ctx.link_reachable.then_some(RegState::Registering)
}

fn registering_enter(ctx: &mut RegistrationContext) {
    ctx.reply = None;
    ctx.send_request = true;
}

fn registering_update(ctx: &mut RegistrationContext) -> Option<RegState> {
    match ctx.reply.take()? {
        RegistrationResult::Success => Some(RegState::Registered),
        RegistrationResult::Timeout | RegistrationResult::Rejected => {
            ctx.send_request = true;
            None
        }
    }
}

fn registered_update(_ctx: &mut RegistrationContext) -> Option<RegState> {
    None
}

pub fn build_state_table() -> [StateDescriptor<RegState, RegistrationContext>; RegState::COUNT] {
    [
        StateDescriptor {
            id: RegState::LinkCheck,
            on_enter: None,
            on_exit: None,
            on_update: link_check_update,
        },
        StateDescriptor {
            id: RegState::Registering,
            on_enter: Some(registering_enter),
            on_exit: None,
            on_update: registering_update,
        },
        StateDescriptor {
            id: RegState::Registered,
            on_enter: None,
            on_exit: None,
            on_update: registered_update,
        },
    ]
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// What the registration task should do after a [`RegistrationClient::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    /// Poll again after the given delay.
    Wait(Duration),
    /// Registration is complete; the task can end.
    Registered,
}

/// Runs the registration FSM against a link probe and a registrar.
pub struct RegistrationClient<P, R> {
    fsm: Fsm<RegState, RegistrationContext, { RegState::COUNT }>,
    ctx: RegistrationContext,
    probe: P,
    registrar: R,
    config: NodeConfig,
}

impl<P: LinkProbe, R: Registrar> RegistrationClient<P, R> {
    pub const MACHINE: &'static str = "REG";

    pub fn new(probe: P, registrar: R, config: NodeConfig) -> Self {
        let mut fsm = Fsm::new(Self::MACHINE, build_state_table(), RegState::LinkCheck);
        let mut ctx = RegistrationContext::default();
        fsm.start(&mut ctx);
        Self {
            fsm,
            ctx,
            probe,
            registrar,
            config,
        }
    }

    pub fn state(&self) -> RegState {
        self.fsm.current_state()
    }

    pub fn is_registered(&self) -> bool {
        self.state() == RegState::Registered
    }

    /// Requests sent so far.
    pub fn attempts(&self) -> u32 {
        self.ctx.attempts
    }

    /// One scheduling step.
    ///
    /// Probes the link while in `LINK_CHECK`, sends at most one
    /// registration request, and reports how long to wait before the
    /// next step.
    pub async fn poll(&mut self, sink: &mut impl EventSink) -> RegistrationStep {
        if self.state() == RegState::LinkCheck {
            self.ctx.link_reachable = self.probe.probe_link_reachable();
            self.advance(sink);
        }

        if self.ctx.send_request {
            self.ctx.send_request = false;
            self.ctx.attempts += 1;

            let request = RegistrationRequest {
                endpoint: &self.config.collector_endpoint,
                path: &self.config.registration_path,
                payload: &self.config.resource_type,
            };
            let result = self.registrar.register(&request).await;
            sink.emit(&AppEvent::RegistrationAttempt {
                attempt: self.ctx.attempts,
                result,
            });
            if let Err(e) = result.into_result() {
                sink.emit(&AppEvent::ConnectivityError(e));
            }

            self.ctx.reply = Some(result);
            self.advance(sink);
        }

        match self.state() {
            RegState::Registered => RegistrationStep::Registered,
            RegState::LinkCheck => RegistrationStep::Wait(self.config.link_probe_interval()),
            RegState::Registering => RegistrationStep::Wait(self.config.registration_retry()),
        }
    }

    fn advance(&mut self, sink: &mut impl EventSink) {
        if let Some(Transition { from, to }) = self.fsm.tick(&mut self.ctx) {
            sink.emit(&AppEvent::StateChanged {
                machine: Self::MACHINE,
                from: from.name(),
                to: to.name(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use std::collections::VecDeque;

    struct Link(VecDeque<bool>);

    impl LinkProbe for Link {
        fn probe_link_reachable(&mut self) -> bool {
            self.0.pop_front().unwrap_or(true)
        }
    }

    struct Replies(VecDeque<RegistrationResult>);

    impl Registrar for Replies {
        async fn register(&mut self, request: &RegistrationRequest<'_>) -> RegistrationResult {
            assert_eq!(request.payload, "Glucose_monitoring");
            self.0.pop_front().unwrap_or(RegistrationResult::Success)
        }
    }

    struct NullSink;

    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    fn client(
        link: &[bool],
        replies: &[RegistrationResult],
    ) -> RegistrationClient<Link, Replies> {
        RegistrationClient::new(
            Link(link.iter().copied().collect()),
            Replies(replies.iter().copied().collect()),
            NodeConfig::default(),
        )
    }

    #[test]
    fn waits_for_link_at_probe_interval() {
        let mut c = client(&[false, false], &[]);
        let step = block_on(c.poll(&mut NullSink));
        assert_eq!(step, RegistrationStep::Wait(Duration::from_secs(2)));
        assert_eq!(c.state(), RegState::LinkCheck);
        assert_eq!(c.attempts(), 0);
    }

    #[test]
    fn registers_immediately_once_link_is_up() {
        let mut c = client(&[true], &[RegistrationResult::Success]);
        assert_eq!(block_on(c.poll(&mut NullSink)), RegistrationStep::Registered);
        assert_eq!(c.attempts(), 1);
    }

    #[test]
    fn failure_schedules_exactly_one_retry() {
        let mut c = client(&[true], &[RegistrationResult::Rejected, RegistrationResult::Success]);
        let step = block_on(c.poll(&mut NullSink));
        assert_eq!(step, RegistrationStep::Wait(Duration::from_secs(2)));
        assert_eq!(c.state(), RegState::Registering);
        assert_eq!(c.attempts(), 1);

        assert_eq!(block_on(c.poll(&mut NullSink)), RegistrationStep::Registered);
        assert_eq!(c.attempts(), 2);
    }

    #[test]
    fn registered_is_terminal() {
        let mut c = client(&[true], &[RegistrationResult::Success]);
        block_on(c.poll(&mut NullSink));
        assert_eq!(block_on(c.poll(&mut NullSink)), RegistrationStep::Registered);
        assert_eq!(c.attempts(), 1);
    }
}
