//! Unified error types for the VitalNode firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the task
//! loops handle failures uniformly.  All variants are `Copy` and carry no
//! heap data, which lets them travel through the FSM context and event
//! sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An inbound command was malformed.  Answered with a client error,
    /// never applied to device state.
    InvalidCommand(CommandError),
    /// The collector did not answer a registration request in time.
    ConnectivityTimeout,
    /// The collector answered a registration request with something other
    /// than an acceptance.
    RegistrationRejected,
    /// The broker client could not queue a subscribe request.
    SubscribeRejected,
    /// The broker session dropped.
    Disconnected,
    /// A publish could not be queued on the broker client.
    Publish,
    /// A report could not be serialised.
    Payload,
    /// Peripheral or client initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand(e) => write!(f, "invalid command: {e}"),
            Self::ConnectivityTimeout => write!(f, "collector did not respond"),
            Self::RegistrationRejected => write!(f, "registration rejected"),
            Self::SubscribeRejected => write!(f, "subscribe rejected (queue full)"),
            Self::Disconnected => write!(f, "broker disconnected"),
            Self::Publish => write!(f, "publish failed"),
            Self::Payload => write!(f, "payload serialisation failed"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Reasons an actuator command or resource request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The request carried no `status` value.
    MissingStatus,
    /// The `status` value is empty or longer than three bytes.
    BadLength,
    /// The `status` value is neither `ON` nor `OFF`.
    UnknownToken,
    /// A broker message arrived on a topic this node does not handle.
    UnknownTopic,
    /// No resource is registered under the requested path.
    UnknownResource,
    /// The resource exists but does not accept the request method.
    MethodNotAllowed,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStatus => write!(f, "missing status"),
            Self::BadLength => write!(f, "status length out of range"),
            Self::UnknownToken => write!(f, "status must be ON or OFF"),
            Self::UnknownTopic => write!(f, "topic not valid"),
            Self::UnknownResource => write!(f, "no such resource"),
            Self::MethodNotAllowed => write!(f, "method not allowed"),
        }
    }
}

impl core::error::Error for Error {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::InvalidCommand(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(_: serde_json::Error) -> Self {
        Self::Payload
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
