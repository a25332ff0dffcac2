// Deterministic, portable pseudo-random number generator for the horde sim.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. The
// session owns one `GameRng` for spawning and combat rolls; every agent's
// decision engine owns a stream forked from it at spawn time, so an agent's
// wandering never perturbs another agent's rolls.
//
// See also: `sim.rs` (session stream), `decision.rs` (per-agent streams),
// `nodes.rs` (`Wander` samples points with `inside_unit_disc`).
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state on every platform. The generator core
// uses integer arithmetic only; float helpers derive from it bit-exactly.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the sim's only source of randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a new PRNG seeded from a `u64` (expanded via SplitMix64).
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent child stream. Advances `self` by one draw.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f32` in [0, 1), from the upper 24 bits of a `u64`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform value in `[low, high)`. Returns `low` when the range is empty,
    /// so zero-width variation settings are harmless.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        low + self.next_f32() * (high - low)
    }

    /// Uniform integer in `[low, high)` with rejection sampling.
    ///
    /// Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        assert!(low < high, "range_u32: low must be less than high");
        let range = (high - low) as u64;
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range) as u32;
            }
        }
    }

    /// True with probability `p` (clamped to [0, 1]).
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// A point uniformly distributed inside the unit disc, as `(x, z)`.
    ///
    /// Rejection sampling from the enclosing square; expected 1.27 tries.
    pub fn inside_unit_disc(&mut self) -> (f32, f32) {
        loop {
            let x = self.range_f32(-1.0, 1.0);
            let z = self.range_f32(-1.0, 1.0);
            if x * x + z * z <= 1.0 {
                return (x, z);
            }
        }
    }
}

/// SplitMix64, used only to expand a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
