//! Actuator command handling.
//!
//! Inbound commands name an actuator and carry a status token.  Only the
//! exact tokens `ON` and `OFF` are accepted; anything else is refused as a
//! client error and leaves [`DeviceState`](crate::state::DeviceState)
//! untouched.  Accepted commands set exactly one flag and emit an
//! [`AppEvent::ActuatorSet`].

use super::events::AppEvent;
use super::ports::EventSink;
use crate::error::{CommandError, Error, Result};
use crate::state::SharedDeviceState;

/// Remotely switchable outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Insulin,
    Glucagon,
    Alert,
}

impl Actuator {
    pub const ALL: [Self; 3] = [Self::Insulin, Self::Glucagon, Self::Alert];

    pub fn name(self) -> &'static str {
        match self {
            Self::Insulin => "insulin",
            Self::Glucagon => "glucagon",
            Self::Alert => "alert",
        }
    }
}

/// Parse a status token.  Returns the requested output level.
pub fn parse_status(status: Option<&str>) -> core::result::Result<bool, CommandError> {
    let status = status.ok_or(CommandError::MissingStatus)?;
    if status.is_empty() || status.len() > 3 {
        return Err(CommandError::BadLength);
    }
    match status {
        "ON" => Ok(true),
        "OFF" => Ok(false),
        _ => Err(CommandError::UnknownToken),
    }
}

/// Validate and apply `actuator := status`.
///
/// Returns the applied level.  Refusals are reported to `sink` as well as
/// returned, so no invalid request goes unlogged.
pub fn apply_command(
    state: &SharedDeviceState,
    actuator: Actuator,
    status: Option<&str>,
    sink: &mut impl EventSink,
) -> Result<bool> {
    let on = match parse_status(status) {
        Ok(on) => on,
        Err(e) => {
            let err = Error::from(e);
            sink.emit(&AppEvent::CommandRejected(err));
            return Err(err);
        }
    };

    state.update(|s| match actuator {
        Actuator::Insulin => s.insulin = on,
        Actuator::Glucagon => s.glucagon = on,
        Actuator::Alert => s.alert = on,
    });
    sink.emit(&AppEvent::ActuatorSet { actuator, on });
    Ok(on)
}

/// Handle a message pushed by the broker.  Only `alert_topic` is
/// subscribed; its payload drives the alert flag.
pub fn handle_broker_message(
    state: &SharedDeviceState,
    alert_topic: &str,
    topic: &str,
    payload: &[u8],
    sink: &mut impl EventSink,
) -> Result<bool> {
    if topic != alert_topic {
        let err = Error::from(CommandError::UnknownTopic);
        sink.emit(&AppEvent::CommandRejected(err));
        return Err(err);
    }
    // Non-UTF-8 payloads can never match a token.
    let status = core::str::from_utf8(payload).unwrap_or("\u{fffd}");
    apply_command(state, Actuator::Alert, Some(status), sink)
}
