//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RegistrationResult};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ActuatorSet { actuator, on } => {
                info!(
                    "ACT | {} {}",
                    actuator.name(),
                    if *on { "activated" } else { "deactivated" }
                );
            }
            AppEvent::CommandRejected(e) => {
                warn!("CMD | rejected: {}", e);
            }
            AppEvent::GlucoseUpdated { level } => {
                info!("VITAL | glucose={}mg/dL", level);
            }
            AppEvent::CardioSampled {
                heart_rate,
                blood_pressure,
                button,
            } => {
                info!(
                    "VITAL | hr={}bpm bp={}mmHg button={}",
                    heart_rate,
                    blood_pressure,
                    u8::from(*button)
                );
            }
            AppEvent::StateChanged { machine, from, to } => {
                info!("{} | {} -> {}", machine, from, to);
            }
            AppEvent::RegistrationAttempt { attempt, result } => match result {
                RegistrationResult::Success => {
                    info!("REG | attempt {} accepted", attempt);
                }
                RegistrationResult::Timeout => {
                    warn!("REG | attempt {} timed out, retrying", attempt);
                }
                RegistrationResult::Rejected => {
                    warn!("REG | attempt {} rejected, retrying", attempt);
                }
            },
            AppEvent::ConnectivityError(e) => {
                warn!("LINK | {}", e);
            }
            AppEvent::ButtonChanged { pressed } => {
                info!("BTN | {}", if *pressed { "pressed" } else { "released" });
            }
            AppEvent::AlertIndicator { lit } => {
                info!("ALERT | indicator {}", if *lit { "on" } else { "off" });
            }
        }
    }
}
