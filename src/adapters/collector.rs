//! Simulated collector for the glucose node.
//!
//! Stands in for the CoAP transport: each registration request consumes
//! the next scripted reply.  `None` in the script models an exchange whose
//! retransmissions ran out.  Once the script is exhausted every request is
//! accepted.

use std::collections::VecDeque;
use std::time::Duration;

use async_io_mini::Timer;
use log::info;

use crate::app::ports::{RegistrationRequest, RegistrationResult, Registrar};

pub struct SimCollector {
    script: VecDeque<Option<Vec<u8>>>,
    latency: Duration,
    requests: u32,
}

impl Default for SimCollector {
    /// First exchange times out, the second is accepted.
    fn default() -> Self {
        Self::scripted([None, Some(RegistrationResult::ACCEPT.to_vec())])
    }
}

impl SimCollector {
    pub fn scripted(replies: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
        Self {
            script: replies.into_iter().collect(),
            latency: Duration::ZERO,
            requests: 0,
        }
    }

    /// Delay each reply by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl Registrar for SimCollector {
    async fn register(&mut self, request: &RegistrationRequest<'_>) -> RegistrationResult {
        self.requests += 1;
        info!(
            "REG | POST {}{} payload={:?} (sim #{})",
            request.endpoint, request.path, request.payload, self.requests
        );
        if !self.latency.is_zero() {
            Timer::after(self.latency).await;
        }
        let reply = self
            .script
            .pop_front()
            .unwrap_or_else(|| Some(RegistrationResult::ACCEPT.to_vec()));
        RegistrationResult::from_reply(reply.as_deref())
    }
}
