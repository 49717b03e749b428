//! Glucose node entry point.
//!
//! ```text
//!  NetifProbe ──┐                            ┌── GpioLed ×3 (StatusLeds)
//!  SimCollector ┼── RegistrationClient       │
//!  HwRandom ────┘   simulation · indicator ──┘
//!                   resources ◀── RESOURCE_REQUESTS
//! ```

use std::rc::Rc;

use anyhow::Result;
use log::{error, info};

use vitalnode::adapters::collector::SimCollector;
use vitalnode::adapters::log_sink::LogEventSink;
use vitalnode::adapters::network::NetifProbe;
use vitalnode::adapters::random::HwRandom;
use vitalnode::config::NodeConfig;
use vitalnode::drivers::hw_init;
use vitalnode::drivers::status_led::{GpioLed, StatusLeds};
use vitalnode::fsm::StateSet;
use vitalnode::fsm::registration::RegState;
use vitalnode::pins;
use vitalnode::runtime::{self, glucose::GlucoseNode, Executor};
use vitalnode::state::{ConnectionState, DeviceState, SharedConnection, SharedDeviceState};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("════════════════════════════════════════");
    info!("  VitalNode glucose node v{}", env!("CARGO_PKG_VERSION"));
    info!("════════════════════════════════════════");

    // ── 2. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals().inspect_err(|e| error!("HAL init failed: {}", e))?;

    // ── 3. Config ─────────────────────────────────────────────
    let config = NodeConfig::default();
    info!("Config: {}", serde_json::to_string(&config)?);

    // ── 4. Shared state + adapters ────────────────────────────
    let state = Rc::new(SharedDeviceState::new(DeviceState::boot(config.initial_vital)));
    let connection = Rc::new(SharedConnection::new(ConnectionState::offline(
        RegState::LinkCheck.name(),
    )));
    let leds = StatusLeds::new(
        GpioLed::new(pins::LED_RED_GPIO),
        GpioLed::new(pins::LED_YELLOW_GPIO),
        GpioLed::new(pins::LED_GREEN_GPIO),
    );

    let node = GlucoseNode {
        config,
        probe: NetifProbe::new(),
        registrar: SimCollector::default(),
        rng: HwRandom::default(),
        leds,
    };

    // ── 5. Run ────────────────────────────────────────────────
    let executor: Executor<'_> = Executor::new();
    runtime::glucose::spawn(&executor, node, state, connection, LogEventSink::new());
    info!("System ready. Entering executor.");
    runtime::run_forever(&executor);
    Ok(())
}
