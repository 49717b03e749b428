//! Board drivers: indicator LEDs, the user button, and GPIO bring-up.

pub mod button;
pub mod hw_init;
pub mod status_led;
pub mod task_pin;
