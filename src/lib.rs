//! VitalNode firmware library.
//!
//! Two node variants share this crate: a glucose node that registers with
//! a collector and serves its readings as resources, and a CVD node that
//! publishes cardio reports to a broker and listens for emergency alerts.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so everything else builds and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod indicator;
pub mod pins;
pub mod runtime;
pub mod sensors;
pub mod state;

mod esp_link_shims;
