//! Node configuration parameters
//!
//! All endpoints, topics, and timing constants for both node variants.
//! The firmware has no provisioning path, so `NodeConfig::default()` is
//! the configuration; it is dumped as JSON at boot for traceability.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Short fixed-capacity string used for endpoints, paths, and topics.
pub type ConfigString = heapless::String<48>;

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Identity ---
    /// Patient identifier embedded in every vitals report
    pub patient_id: u32,
    /// Vital value the shared state holds at boot (glucose, mg/dL)
    pub initial_vital: i32,

    // --- Collector (glucose node) ---
    /// Collector endpoint registration requests are sent to
    pub collector_endpoint: ConfigString,
    /// Resource path on the collector that accepts registrations
    pub registration_path: ConfigString,
    /// Resource type announced in the registration payload
    pub resource_type: ConfigString,

    // --- Broker (CVD node) ---
    /// Broker host (IPv6 literal or name)
    pub broker_host: ConfigString,
    /// Broker TCP port
    pub broker_port: u16,
    /// MQTT keep-alive (seconds)
    pub keep_alive_secs: u32,
    /// Topic carrying remote emergency alerts
    pub alert_topic: ConfigString,
    /// Topic vitals reports are published on
    pub report_topic: ConfigString,

    // --- Timing ---
    /// Link reachability probe period before the link is up (milliseconds)
    pub link_probe_interval_ms: u32,
    /// Wait before re-sending a failed registration (milliseconds)
    pub registration_retry_ms: u32,
    /// Glucose simulation period (milliseconds)
    pub simulation_interval_ms: u32,
    /// Indicator refresh / connecting blink period (milliseconds)
    pub indicator_interval_ms: u32,
    /// Broker session state machine period (milliseconds)
    pub session_tick_ms: u32,
    /// Emergency alert poll period (milliseconds)
    pub alert_poll_ms: u32,
    /// Minimum time the alert indicator stays lit once triggered (milliseconds)
    pub alert_hold_ms: u32,
    /// Time after a button press before the pressed flag auto-resets (milliseconds)
    pub button_reset_ms: u32,
}

fn config_str(value: &str) -> ConfigString {
    let mut s = ConfigString::new();
    // Defaults are compile-time literals well under capacity.
    let _ = s.push_str(value);
    s
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Identity
            patient_id: 1,
            initial_vital: 90,

            // Collector
            collector_endpoint: config_str("coap://[fd00::1]:5683"),
            registration_path: config_str("/registration"),
            resource_type: config_str("Glucose_monitoring"),

            // Broker
            broker_host: config_str("fd00::1"),
            broker_port: 1883,
            keep_alive_secs: 90, // three report periods
            alert_topic: config_str("Emergency_Alert"),
            report_topic: config_str("Heart/Data"),

            // Timing
            link_probe_interval_ms: 2_000,
            registration_retry_ms: 2_000,
            simulation_interval_ms: 5_000,
            indicator_interval_ms: 1_000,
            session_tick_ms: 1_000,
            alert_poll_ms: 5_000,
            alert_hold_ms: 10_000,
            button_reset_ms: 10_000,
        }
    }
}

impl NodeConfig {
    pub fn link_probe_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.link_probe_interval_ms))
    }

    pub fn registration_retry(&self) -> Duration {
        Duration::from_millis(u64::from(self.registration_retry_ms))
    }

    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.simulation_interval_ms))
    }

    pub fn indicator_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.indicator_interval_ms))
    }

    pub fn session_tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.session_tick_ms))
    }

    /// Broker URL in the form the ESP-IDF MQTT client expects.
    pub fn broker_url(&self) -> heapless::String<64> {
        broker_url(&self.broker_host, self.broker_port)
    }
}

/// `mqtt://host:port`, bracketing IPv6 literals.
pub fn broker_url(host: &str, port: u16) -> heapless::String<64> {
    use core::fmt::Write;
    let mut url = heapless::String::new();
    if host.contains(':') {
        let _ = write!(url, "mqtt://[{}]:{}", host, port);
    } else {
        let _ = write!(url, "mqtt://{}:{}", host, port);
    }
    url
}
