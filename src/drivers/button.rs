//! ISR-latched button with a timed auto-reset flag (CVD node).
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The GPIO fires on the
//! falling edge and the ISR bumps an atomic edge counter.  The input is
//! debounced in hardware, so every edge is a press.  The button task calls
//! [`ButtonDebouncer::tick`] every [`POLL_MS`], which turns new edges into
//! presses and expires the pressed flag.
//!
//! ## Pressed flag
//!
//! A press sets `pressed` and arms a reset deadline; the first tick at or
//! after the deadline clears it.  A new press while the flag is set
//! re-arms the deadline.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::state::Shared;

/// Button task poll period.
pub const POLL_MS: u64 = 50;

/// Number of falling edges seen by the ISR (wrapping).
static BUTTON_EDGES: AtomicU32 = AtomicU32::new(0);

/// ISR handler.  Register this on the button GPIO falling edge.
/// Lock-free; safe to call from interrupt context.
pub fn button_isr_handler() {
    BUTTON_EDGES.fetch_add(1, Ordering::Release);
}

fn edge_count() -> u32 {
    BUTTON_EDGES.load(Ordering::Acquire)
}

// ---------------------------------------------------------------------------
// Button state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    /// When `pressed` auto-clears.  `None` while released.
    pub reset_at_ms: Option<u64>,
}

impl ButtonState {
    /// Register a press at `now_ms`.
    pub fn press(&mut self, now_ms: u64, reset_after_ms: u64) {
        self.pressed = true;
        self.reset_at_ms = Some(now_ms + reset_after_ms);
    }

    /// Clear the flag if its deadline has passed.  Returns `true` if it
    /// was cleared by this call.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.reset_at_ms {
            Some(at) if now_ms >= at => {
                self.pressed = false;
                self.reset_at_ms = None;
                true
            }
            _ => false,
        }
    }
}

pub type SharedButton = Shared<ButtonState>;

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

pub struct ButtonDebouncer {
    reset_after_ms: u64,
    seen_edges: u32,
}

impl ButtonDebouncer {
    pub fn new(reset_after_ms: u64) -> Self {
        Self {
            reset_after_ms,
            seen_edges: edge_count(),
        }
    }

    /// Apply a press edge observed at `now_ms`.  Every press re-arms the
    /// reset deadline.
    pub fn on_edge(
        &mut self,
        now_ms: u64,
        state: &SharedButton,
        sink: &mut impl EventSink,
    ) {
        let was_pressed = state.update(|s| {
            let was = s.pressed;
            s.press(now_ms, self.reset_after_ms);
            was
        });
        if !was_pressed {
            sink.emit(&AppEvent::ButtonChanged { pressed: true });
        }
    }

    /// Expire the pressed flag if its deadline has passed.
    pub fn poll(&mut self, now_ms: u64, state: &SharedButton, sink: &mut impl EventSink) {
        if state.update(|s| s.expire(now_ms)) {
            sink.emit(&AppEvent::ButtonChanged { pressed: false });
        }
    }

    /// Consume ISR edges, then expire.  Call from the button task.
    pub fn tick(&mut self, now_ms: u64, state: &SharedButton, sink: &mut impl EventSink) {
        let edges = edge_count();
        if edges != self.seen_edges {
            self.seen_edges = edges;
            self.on_edge(now_ms, state, sink);
        }
        self.poll(now_ms, state, sink);
    }
}
