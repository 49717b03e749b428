//! Random source for the vitals simulator.
//!
//! On target the hardware RNG (`esp_random`) is wrapped as a
//! [`RngCore`](rand::RngCore).  On the host a seeded [`SmallRng`] keeps
//! simulations reproducible.  Either way ranges are drawn with
//! `rand::Rng::random_range`.

use rand::Rng;
#[cfg(not(target_os = "espidf"))]
use rand::{rngs::SmallRng, SeedableRng};

use crate::app::ports::RandomSource;

/// Hardware RNG as a `rand` core.
#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EspRng;

#[cfg(target_os = "espidf")]
impl rand::RngCore for EspRng {
    fn next_u32(&mut self) -> u32 {
        // SAFETY: esp_random has no preconditions.
        unsafe { esp_idf_svc::sys::esp_random() }
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        // SAFETY: the pointer and length describe `dst` exactly.
        unsafe { esp_idf_svc::sys::esp_fill_random(dst.as_mut_ptr().cast(), dst.len()) }
    }
}

#[cfg(target_os = "espidf")]
type Source = EspRng;
#[cfg(not(target_os = "espidf"))]
type Source = SmallRng;

const HOST_SEED: u64 = 0x2545_F491;

#[derive(Debug, Clone)]
pub struct HwRandom {
    rng: Source,
}

impl Default for HwRandom {
    fn default() -> Self {
        Self::seeded(HOST_SEED)
    }
}

impl HwRandom {
    /// Seed the host generator.  On target the seed is ignored.
    #[allow(unused_variables)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            rng: EspRng,
            #[cfg(not(target_os = "espidf"))]
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for HwRandom {
    fn uniform(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}
