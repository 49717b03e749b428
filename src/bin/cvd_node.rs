//! CVD node entry point.
//!
//! ```text
//!  NetifProbe ─────┐                         ┌── GpioLed ×3 (StatusLeds)
//!  EspBrokerClient ┼── BrokerSession         │
//!  HwRandom ───────┘   indicator · alert ────┘
//!  button ISR ──▶ BUTTON_EDGES ──▶ button task
//!  mqtt-rx thread ──▶ BROKER_EVENTS ──▶ session task
//! ```

use anyhow::Result;
use log::{error, info};

use vitalnode::adapters::device_id;
use vitalnode::adapters::log_sink::LogEventSink;
use vitalnode::adapters::mqtt::EspBrokerClient;
use vitalnode::adapters::network::NetifProbe;
use vitalnode::adapters::random::HwRandom;
use vitalnode::adapters::time::MonotonicClock;
use vitalnode::config::NodeConfig;
use vitalnode::drivers::hw_init;
use vitalnode::drivers::status_led::{GpioLed, StatusLeds};
use vitalnode::pins;
use vitalnode::runtime::cvd::{CvdNode, CvdShared};
use vitalnode::runtime::{self, Executor};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("════════════════════════════════════════");
    info!("  VitalNode CVD node v{}", env!("CARGO_PKG_VERSION"));
    info!("════════════════════════════════════════");

    // ── 2. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals().inspect_err(|e| error!("HAL init failed: {}", e))?;
    if let Err(e) = hw_init::init_button_isr() {
        // The node still reports vitals, the button flag just stays clear.
        error!("Button ISR init failed: {}, continuing without button", e);
    }

    // ── 3. Config + identity ──────────────────────────────────
    let config = NodeConfig::default();
    info!("Config: {}", serde_json::to_string(&config)?);
    let client_id = device_id::client_id(&device_id::read_mac());
    info!("Client ID: {} (broker {})", client_id, config.broker_url());

    // ── 4. Adapters ───────────────────────────────────────────
    let node = CvdNode {
        config,
        client_id,
        probe: NetifProbe::new(),
        broker: EspBrokerClient::new(),
        rng: HwRandom::default(),
        leds: StatusLeds::new(
            GpioLed::new(pins::LED_RED_GPIO),
            GpioLed::new(pins::LED_YELLOW_GPIO),
            GpioLed::new(pins::LED_GREEN_GPIO),
        ),
        clock: MonotonicClock::new(),
    };

    // ── 5. Run ────────────────────────────────────────────────
    let executor: Executor<'_> = Executor::new();
    runtime::cvd::spawn(&executor, node, CvdShared::default(), LogEventSink::new());
    info!("System ready. Entering executor.");
    runtime::run_forever(&executor);
    Ok(())
}
