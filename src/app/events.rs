//! Outbound application events.
//!
//! Handlers, simulators and connectivity drivers emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::commands::Actuator;
use super::ports::RegistrationResult;
use crate::error::Error;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// An actuator command was applied.
    ActuatorSet { actuator: Actuator, on: bool },

    /// An inbound command or request was refused.
    CommandRejected(Error),

    /// The glucose simulator produced a new reading.
    GlucoseUpdated { level: i32 },

    /// A cardio report was sampled for publishing.
    CardioSampled {
        heart_rate: i32,
        blood_pressure: i32,
        button: bool,
    },

    /// A connectivity state machine changed state.
    StateChanged {
        machine: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// One registration exchange completed.
    RegistrationAttempt {
        attempt: u32,
        result: RegistrationResult,
    },

    /// A connectivity operation failed.
    ConnectivityError(Error),

    /// The button pressed flag changed.
    ButtonChanged { pressed: bool },

    /// The emergency alert indicator changed.
    AlertIndicator { lit: bool },
}
