//! Cardiovascular sample generator.
//!
//! Each publish cycle draws an independent heart rate and blood pressure
//! and attaches the current button flag.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RandomSource};

/// Inclusive heart-rate range (bpm).
pub const HEART_RATE_RANGE: (i32, i32) = (40, 124);
/// Inclusive blood-pressure range (mmHg).
pub const BLOOD_PRESSURE_RANGE: (i32, i32) = (85, 134);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardioSample {
    pub heart_rate: i32,
    pub blood_pressure: i32,
    pub button: bool,
}

pub fn sample(rng: &mut impl RandomSource, button: bool, sink: &mut impl EventSink) -> CardioSample {
    let s = CardioSample {
        heart_rate: rng.uniform(HEART_RATE_RANGE.0, HEART_RATE_RANGE.1),
        blood_pressure: rng.uniform(BLOOD_PRESSURE_RANGE.0, BLOOD_PRESSURE_RANGE.1),
        button,
    };
    sink.emit(&AppEvent::CardioSampled {
        heart_rate: s.heart_rate,
        blood_pressure: s.blood_pressure,
        button: s.button,
    });
    s
}
