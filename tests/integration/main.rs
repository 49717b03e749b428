//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node variant end to
//! end against mock adapters.  All tests run on the host with no real
//! hardware required.

mod cvd_flow_tests;
mod glucose_flow_tests;
mod mocks;
