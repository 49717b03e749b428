//! GPIO pin assignments for the VitalNode board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Both node variants use the same board.

// ---------------------------------------------------------------------------
// Indicator LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 11;
pub const LED_YELLOW_GPIO: i32 = 12;
pub const LED_GREEN_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button, sampled by the CVD node.
pub const BUTTON_GPIO: i32 = 16;
