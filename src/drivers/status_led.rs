//! Discrete red / yellow / green indicator LEDs.
//!
//! Each LED is any `embedded_hal::digital::OutputPin`, active high.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`GpioLed`] writes the pin through `hw_init::gpio_write`.
//! On host/test: `gpio_write` is a no-op and the driver tracks state
//! in-memory only.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::warn;

use crate::app::ports::{IndicatorPort, Led};
use crate::drivers::hw_init;

/// Output pin backed by a raw GPIO number configured in `hw_init`.
#[derive(Debug, Clone, Copy)]
pub struct GpioLed {
    gpio: i32,
}

impl GpioLed {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioLed {
    type Error = Infallible;
}

impl OutputPin for GpioLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

pub struct StatusLeds<R, Y, G> {
    red: R,
    yellow: Y,
    green: G,
    current: [bool; 3],
}

impl<R: OutputPin, Y: OutputPin, G: OutputPin> StatusLeds<R, Y, G> {
    /// Take the pins and switch every LED off.
    pub fn new(red: R, yellow: Y, green: G) -> Self {
        let mut leds = Self {
            red,
            yellow,
            green,
            current: [true; 3],
        };
        for led in [Led::Red, Led::Yellow, Led::Green] {
            leds.set_led(led, false);
        }
        leds
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool) -> bool {
    let res = if on { pin.set_high() } else { pin.set_low() };
    res.is_ok()
}

impl<R: OutputPin, Y: OutputPin, G: OutputPin> IndicatorPort for StatusLeds<R, Y, G> {
    fn set_led(&mut self, led: Led, on: bool) {
        let ok = match led {
            Led::Red => drive(&mut self.red, on),
            Led::Yellow => drive(&mut self.yellow, on),
            Led::Green => drive(&mut self.green, on),
        };
        if ok {
            self.current[led as usize] = on;
        } else {
            warn!("LED: {:?} pin write failed", led);
        }
    }

    fn is_on(&self, led: Led) -> bool {
        self.current[led as usize]
    }
}
