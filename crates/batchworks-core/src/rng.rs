//! Deterministic randomness for quality rolls.
//!
//! Every probabilistic decision in the core is a single Bernoulli trial made
//! through the [`Roll`] trait. [`SimRng`] is the production implementation
//! (SplitMix64: 8 bytes of state, trivially serializable); [`ForcedRoll`]
//! pins outcomes for tests and tooling.

use crate::fixed::Fixed64;

/// A source of Bernoulli trials.
pub trait Roll {
    /// Returns `true` with the given probability.
    ///
    /// - probability <= 0 always returns false
    /// - probability >= 1 always returns true
    fn chance(&mut self, probability: Fixed64) -> bool;
}

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so two plants seeded alike produce the
/// same quality outcomes tick for tick.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Get the internal state (for persistence).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl Roll for SimRng {
    fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        // For p in (0,1) the Q32.32 raw bits are the fraction scaled to
        // [0, 2^32); compare against a uniform u32.
        let upper = (self.next_u64() >> 32) as u32;
        u64::from(upper) < probability.to_bits() as u64
    }
}

/// A [`Roll`] whose outcome is fixed in advance.
///
/// Boundary probabilities still behave like a real trial: zero never wins
/// and one always wins, whatever the forced outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedRoll {
    outcome: bool,
    /// Number of trials made through this roll.
    pub trials: u32,
}

impl ForcedRoll {
    /// Every non-degenerate trial succeeds.
    pub fn always() -> Self {
        Self {
            outcome: true,
            trials: 0,
        }
    }

    /// Every non-degenerate trial fails.
    pub fn never() -> Self {
        Self {
            outcome: false,
            trials: 0,
        }
    }
}

impl Roll for ForcedRoll {
    fn chance(&mut self, probability: Fixed64) -> bool {
        self.trials += 1;
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        self.outcome
    }
}
