//! Indicator LED logic with priority-based pattern selection.
//!
//! ## Phases
//!
//! 1. **Connecting**: until the node is registered (glucose) or
//!    subscribed (CVD) the yellow LED toggles on every refresh.
//! 2. **Online**: the blink stops for good and the LEDs follow device
//!    state.  The switch is one-way; later connectivity loss does not
//!    bring the blink back.
//!
//! ## Priority hierarchy once online (glucose node, highest first)
//!
//! | Pattern   | Condition             | LEDs        |
//! |-----------|-----------------------|-------------|
//! | Alert     | alert flag set        | red only    |
//! | Treatment | insulin or glucagon   | yellow only |
//! | Stable    | otherwise             | green only  |
//!
//! The CVD node drives only the red LED once online, through
//! [`AlertHold`]: a remote alert lights it for at least the hold time.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, IndicatorPort, Led};
use crate::state::DeviceState;

/// What the LEDs are currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Connecting,
    Alert,
    Treatment,
    Stable,
    /// Online on a node whose LEDs are owned by [`AlertHold`].
    Idle,
}

/// Which mapping applies once the node is online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Full alert > treatment > stable mapping.
    Glucose,
    /// Blink only; the red LED belongs to the alert hold.
    Cardio,
}

/// Pattern for `state` under the alert > treatment > stable priority.
pub fn pattern_for(state: &DeviceState) -> Pattern {
    if state.alert {
        Pattern::Alert
    } else if state.treating() {
        Pattern::Treatment
    } else {
        Pattern::Stable
    }
}

pub struct IndicatorController {
    profile: Profile,
    online: bool,
}

impl IndicatorController {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            online: false,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// One refresh.  `online` is the connectivity task's current verdict.
    pub fn tick(
        &mut self,
        online: bool,
        state: &DeviceState,
        leds: &mut impl IndicatorPort,
    ) -> Pattern {
        if !self.online {
            if !online {
                leds.toggle(Led::Yellow);
                return Pattern::Connecting;
            }
            self.online = true;
            leds.set_led(Led::Yellow, false);
        }

        match self.profile {
            Profile::Cardio => Pattern::Idle,
            Profile::Glucose => {
                let pattern = pattern_for(state);
                leds.show_only(match pattern {
                    Pattern::Alert => Led::Red,
                    Pattern::Treatment => Led::Yellow,
                    _ => Led::Green,
                });
                pattern
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CVD emergency alert hold
// ---------------------------------------------------------------------------

/// Minimum-on-time gate for the CVD emergency LED.
///
/// The alert flag is sampled on a coarse poll.  A set flag lights the red
/// LED and starts a hold; while holding, the flag is ignored in both
/// directions.  The LED goes dark when the hold expires, and can only be
/// re-triggered by a later poll.
#[derive(Debug, Clone, Copy)]
pub struct AlertHold {
    poll_every_ms: u64,
    hold_ms: u64,
    next_poll_ms: u64,
    release_at_ms: Option<u64>,
}

impl AlertHold {
    pub fn new(now_ms: u64, poll_every_ms: u64, hold_ms: u64) -> Self {
        Self {
            poll_every_ms,
            hold_ms,
            next_poll_ms: now_ms + poll_every_ms,
            release_at_ms: None,
        }
    }

    /// Earliest time [`update`](Self::update) has work to do.
    pub fn next_wake_ms(&self) -> u64 {
        match self.release_at_ms {
            Some(at) => at.min(self.next_poll_ms),
            None => self.next_poll_ms,
        }
    }

    /// Advance to `now_ms`.  Returns `Some(lit)` when the LED must change.
    pub fn update(&mut self, now_ms: u64, alert: bool) -> Option<bool> {
        let mut change = None;

        if let Some(at) = self.release_at_ms {
            if now_ms >= at {
                self.release_at_ms = None;
                change = Some(false);
            }
        }

        if now_ms >= self.next_poll_ms {
            self.next_poll_ms = now_ms + self.poll_every_ms;
            if self.release_at_ms.is_none() && alert {
                self.release_at_ms = Some(now_ms + self.hold_ms);
                change = Some(true);
            }
        }

        change
    }

    /// [`update`](Self::update) and apply the result to the red LED.
    pub fn drive(
        &mut self,
        now_ms: u64,
        alert: bool,
        leds: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        if let Some(lit) = self.update(now_ms, alert) {
            if leds.is_on(Led::Red) != lit {
                sink.emit(&AppEvent::AlertIndicator { lit });
            }
            leds.set_led(Led::Red, lit);
        }
    }
}
