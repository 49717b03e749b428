//! Resource table of the glucose node.
//!
//! | Path                       | Method | Effect                          |
//! |----------------------------|--------|---------------------------------|
//! | `glucose/level`            | GET    | JSON glucose report             |
//! | `glucose_control/insulin`  | PUT    | `status=ON|OFF` → insulin flag  |
//! | `glucose_control/glucagon` | PUT    | `status=ON|OFF` → glucagon flag |
//! | `glucose_control/alert`    | PUT    | `status=ON|OFF` → alert flag    |
//!
//! The transport hands over the method, the path and the form-encoded
//! request body; this module never sees protocol framing.

use super::commands::{self, Actuator};
use super::events::AppEvent;
use super::payload::{self, GlucoseReport};
use super::ports::EventSink;
use crate::error::{CommandError, Error};
use crate::state::SharedDeviceState;

pub const LEVEL_PATH: &str = "glucose/level";
pub const INSULIN_PATH: &str = "glucose_control/insulin";
pub const GLUCAGON_PATH: &str = "glucose_control/glucagon";
pub const ALERT_PATH: &str = "glucose_control/alert";

/// Request methods the transport can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

/// Response codes, numbered as `class.detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Changed,
    Content,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InternalError,
}

impl ResponseCode {
    /// `(class, detail)` pair, e.g. `(4, 0)` for Bad Request.
    pub fn code(self) -> (u8, u8) {
        match self {
            Self::Changed => (2, 4),
            Self::Content => (2, 5),
            Self::BadRequest => (4, 0),
            Self::NotFound => (4, 4),
            Self::MethodNotAllowed => (4, 5),
            Self::InternalError => (5, 0),
        }
    }
}

/// Borrowed view of one inbound request.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    /// Form-encoded body, e.g. `status=ON`.
    pub body: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    /// JSON body for `Content` responses.
    pub payload: Option<String>,
}

impl Response {
    fn empty(code: ResponseCode) -> Self {
        Self {
            code,
            payload: None,
        }
    }
}

/// Look up `key` in a form-encoded body (`a=1&b=2`).
pub fn form_value<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn actuator_for(path: &str) -> Option<Actuator> {
    match path {
        INSULIN_PATH => Some(Actuator::Insulin),
        GLUCAGON_PATH => Some(Actuator::Glucagon),
        ALERT_PATH => Some(Actuator::Alert),
        _ => None,
    }
}

/// Router over the glucose node resources.
#[derive(Debug, Clone, Copy)]
pub struct GlucoseResources {
    patient_id: u32,
}

impl GlucoseResources {
    pub fn new(patient_id: u32) -> Self {
        Self { patient_id }
    }

    pub fn handle(
        &self,
        state: &SharedDeviceState,
        request: &Request<'_>,
        sink: &mut impl EventSink,
    ) -> Response {
        let path = request.path.trim_start_matches('/');

        if path == LEVEL_PATH {
            if request.method != Method::Get {
                return self.refuse(CommandError::MethodNotAllowed, sink);
            }
            let report = GlucoseReport {
                patient_id: self.patient_id,
                glucose_level: state.read().vital,
            };
            return match payload::report_vital(&report) {
                Ok(body) => Response {
                    code: ResponseCode::Content,
                    payload: Some(body),
                },
                Err(e) => {
                    sink.emit(&AppEvent::CommandRejected(e));
                    Response::empty(ResponseCode::InternalError)
                }
            };
        }

        let Some(actuator) = actuator_for(path) else {
            return self.refuse(CommandError::UnknownResource, sink);
        };
        if request.method != Method::Put {
            return self.refuse(CommandError::MethodNotAllowed, sink);
        }

        let status = form_value(request.body, "status");
        match commands::apply_command(state, actuator, status, sink) {
            Ok(_) => Response::empty(ResponseCode::Changed),
            // apply_command already reported the refusal.
            Err(_) => Response::empty(ResponseCode::BadRequest),
        }
    }

    fn refuse(&self, reason: CommandError, sink: &mut impl EventSink) -> Response {
        sink.emit(&AppEvent::CommandRejected(Error::from(reason)));
        let code = match reason {
            CommandError::UnknownResource => ResponseCode::NotFound,
            CommandError::MethodNotAllowed => ResponseCode::MethodNotAllowed,
            _ => ResponseCode::BadRequest,
        };
        Response::empty(code)
    }
}
