//! Random source for skip list level draws.
//!
//! Node levels only need a cheap, well-mixed bit stream, so the default
//! source is a 64-bit xorshift generator. It implements the `rand_core`
//! traits, which means any other `RngCore` can be injected in its place and
//! tests can pin a seed to get the same list shape on every run.

use rand_core::{impls, Error, RngCore, SeedableRng};

/// Seed substituted for zero, which is a fixed point of xorshift.
pub const DEFAULT_SEED: u64 = 0x12345678_9abcdef0;

/// Xorshift64 generator (Marsaglia, 13/7/17 variant).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Create a generator from a 64-bit seed.
    pub fn new(seed: u64) -> XorShift64 {
        let state = if seed == 0 { DEFAULT_SEED } else { seed };
        return XorShift64 { state };
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        return XorShift64::new(DEFAULT_SEED);
    }
}

impl RngCore for XorShift64 {
    fn next_u32(&mut self) -> u32 {
        // High bits are better mixed than low bits.
        return (self.next_u64() >> 32) as u32;
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        return self.state;
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        return Ok(());
    }
}

impl SeedableRng for XorShift64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        return XorShift64::new(u64::from_le_bytes(seed));
    }

    fn seed_from_u64(state: u64) -> Self {
        return XorShift64::new(state);
    }
}
