//! Application core: pure domain logic, zero I/O.
//!
//! Command parsing, the glucose resource table and report bodies live
//! here.  All interaction with hardware and the network happens through
//! the **port traits** in [`ports`], so this layer is testable on the host.

pub mod commands;
pub mod events;
pub mod payload;
pub mod ports;
pub mod resources;
