//! Shared device state.
//!
//! Both node variants keep one process-wide [`DeviceState`] that several
//! tasks touch: command handlers write actuator flags, the simulator
//! rewrites the vital, the indicator task reads everything.  The record is
//! wrapped in [`Shared`], an `embassy-sync` blocking mutex over a
//! `RefCell`, so every read is a whole-record snapshot and every update is
//! applied under one critical section.  Tasks on the executor share
//! handles as `Rc<Shared<_>>`; nothing here is a global.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Critical-section guarded cell for small `Copy` records.
pub struct Shared<T: Copy> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T: Copy> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Snapshot of the whole record at a single instant.
    pub fn read(&self) -> T {
        self.inner.lock(|cell| *cell.borrow())
    }

    /// Apply `f` to the record atomically and return its result.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Replace the whole record.
    pub fn set(&self, value: T) {
        self.update(|v| *v = value);
    }
}

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

/// Vital reading plus actuator and alert flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Last simulated vital (glucose in mg/dL on the glucose node).
    pub vital: i32,
    pub insulin: bool,
    pub glucagon: bool,
    /// Local emergency output (glucose) or remotely pushed alert (CVD).
    pub alert: bool,
}

impl DeviceState {
    /// Boot state: the given vital, every flag cleared.
    pub const fn boot(vital: i32) -> Self {
        Self {
            vital,
            insulin: false,
            glucagon: false,
            alert: false,
        }
    }

    /// `true` while either treatment actuator is active.
    pub fn treating(&self) -> bool {
        self.insulin || self.glucagon
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::boot(90)
    }
}

pub type SharedDeviceState = Shared<DeviceState>;

// ---------------------------------------------------------------------------
// Connection state (written by the connectivity task only)
// ---------------------------------------------------------------------------

/// What the indicator task needs to know about connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    /// Name of the current connectivity FSM state.
    pub state: &'static str,
    /// `true` once the node is registered (glucose) or subscribed (CVD).
    pub online: bool,
}

impl ConnectionState {
    pub const fn offline(state: &'static str) -> Self {
        Self {
            state,
            online: false,
        }
    }
}

pub type SharedConnection = Shared<ConnectionState>;
