//! Glucose simulator.
//!
//! Every simulation period the level moves according to the active
//! treatment:
//!
//! | Insulin | Glucagon | Next level                 |
//! |---------|----------|----------------------------|
//! | on      | any      | level − 10                 |
//! | off     | on       | level + 10                 |
//! | off     | off      | uniform sample in 50..=250 |
//!
//! Insulin wins when both are active.  The level is never clamped, so a
//! long insulin run can drive it negative.  Arithmetic wraps at the `i32`
//! bounds rather than panicking.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, RandomSource};
use crate::state::{DeviceState, SharedDeviceState};

/// Change per period while a treatment actuator is active (mg/dL).
pub const TREATMENT_STEP: i32 = 10;
/// Inclusive range of untreated samples (mg/dL).
pub const SAMPLE_RANGE: (i32, i32) = (50, 250);

/// Next glucose level for `state`.
pub fn next_level(state: &DeviceState, rng: &mut impl RandomSource) -> i32 {
    if state.insulin {
        state.vital.wrapping_sub(TREATMENT_STEP)
    } else if state.glucagon {
        state.vital.wrapping_add(TREATMENT_STEP)
    } else {
        rng.uniform(SAMPLE_RANGE.0, SAMPLE_RANGE.1)
    }
}

/// Advance the shared glucose level by one period and return it.
///
/// Flags are read and the level written under one lock, so a command
/// landing mid-step is applied either wholly before or wholly after it.
pub fn step(
    shared: &SharedDeviceState,
    rng: &mut impl RandomSource,
    sink: &mut impl EventSink,
) -> i32 {
    let level = shared.update(|s| {
        s.vital = next_level(s, rng);
        s.vital
    });
    sink.emit(&AppEvent::GlucoseUpdated { level });
    level
}
