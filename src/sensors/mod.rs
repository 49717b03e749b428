//! Simulated vital-sign sources.
//!
//! Neither board carries real sensors; each node variant synthesises its
//! vitals from a [`RandomSource`](crate::app::ports::RandomSource) and,
//! on the glucose node, from the active treatment actuators.

pub mod cardio;
pub mod glucose;
