//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                    |
//! |-------------|---------------|--------------------------------|
//! | `collector` | Registrar     | Simulated collector replies    |
//! | `device_id` | (free fns)    | eFuse factory MAC              |
//! | `log_sink`  | EventSink     | Serial log output              |
//! | `mqtt`      | BrokerClient  | ESP-IDF MQTT client (target)   |
//! | `network`   | LinkProbe     | ESP-IDF default netif          |
//! | `random`    | RandomSource  | `esp_random` / host xorshift   |
//! | `time`      | Clock         | ESP32 high-resolution timer    |

pub mod collector;
pub mod device_id;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod network;
pub mod random;
pub mod time;
