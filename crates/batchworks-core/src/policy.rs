//! Quality policies: how a completed batch picks its output tier.
//!
//! Batch stations resolve quality with a [`QualityPolicy`] from the staged
//! inputs alone. The thermal reactor resolves it from how long the batch
//! spent in each temperature zone, via [`ThermalQualityRules`].

use crate::fixed::{Fixed64, fraction};
use crate::id::ItemTypeId;
use crate::quality::QualityTier;
use crate::rng::Roll;
use crate::slot::Ingredient;

// ---------------------------------------------------------------------------
// Batch stations
// ---------------------------------------------------------------------------

/// Quality resolution for a batch station. Every variant makes at most one
/// Bernoulli trial per completed batch.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityPolicy<Q> {
    /// Start from a fixed `base` tier and roll once for a one-tier upgrade.
    /// The primary (stage 0) ingredient selects the chance: an entry in
    /// `variant_chances` if present, otherwise `default_chance`.
    BaseRoll {
        base: Q,
        default_chance: Fixed64,
        variant_chances: Vec<(ItemTypeId, Fixed64)>,
    },
    /// Carry the primary input's quality (or `fallback` when it has none)
    /// and roll once for a one-tier upgrade.
    Refine { fallback: Q, upgrade_chance: Fixed64 },
    /// Carry the primary input's quality verbatim.
    Carry { fallback: Q },
}

impl<Q: QualityTier> QualityPolicy<Q> {
    /// Final quality for a batch made from `inputs` (stage order).
    pub fn resolve(&self, inputs: &[Ingredient<Q>], rng: &mut dyn Roll) -> Q {
        let primary = inputs.first();
        match self {
            QualityPolicy::BaseRoll {
                base,
                default_chance,
                variant_chances,
            } => {
                let chance = primary
                    .and_then(|p| {
                        variant_chances
                            .iter()
                            .find(|(item, _)| *item == p.item)
                            .map(|(_, c)| *c)
                    })
                    .unwrap_or(*default_chance);
                if rng.chance(chance) {
                    base.upgrade()
                } else {
                    *base
                }
            }
            QualityPolicy::Refine {
                fallback,
                upgrade_chance,
            } => {
                let carried = primary.and_then(|p| p.quality).unwrap_or(*fallback);
                if rng.chance(*upgrade_chance) {
                    carried.upgrade()
                } else {
                    carried
                }
            }
            QualityPolicy::Carry { fallback } => {
                primary.and_then(|p| p.quality).unwrap_or(*fallback)
            }
        }
    }

    /// Every probability this policy may roll with.
    pub fn chances(&self) -> Vec<Fixed64> {
        match self {
            QualityPolicy::BaseRoll {
                default_chance,
                variant_chances,
                ..
            } => std::iter::once(*default_chance)
                .chain(variant_chances.iter().map(|(_, c)| *c))
                .collect(),
            QualityPolicy::Refine { upgrade_chance, .. } => vec![*upgrade_chance],
            QualityPolicy::Carry { .. } => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Thermal reactor
// ---------------------------------------------------------------------------

/// Zone-time rules for the thermal reactor. All fractions are of the
/// process time (or of elapsed time, for projections).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalQualityRules {
    /// Danger fraction strictly above this downgrades one tier.
    pub danger_limit: Fixed64,
    /// Optimal fraction at or above this may jump straight to the top tier.
    pub top_tier_threshold: Fixed64,
    pub top_tier_chance: Fixed64,
    /// Optimal fraction at or above this may upgrade one tier.
    pub upgrade_threshold: Fixed64,
    pub upgrade_chance: Fixed64,
    /// Optimal fraction at or above this projects a one-tier upgrade.
    pub projection_fraction: Fixed64,
}

impl Default for ThermalQualityRules {
    fn default() -> Self {
        Self {
            danger_limit: Fixed64::from_num(0.30),
            top_tier_threshold: Fixed64::from_num(0.90),
            top_tier_chance: Fixed64::from_num(0.30),
            upgrade_threshold: Fixed64::from_num(0.70),
            upgrade_chance: Fixed64::from_num(0.50),
            projection_fraction: Fixed64::from_num(0.80),
        }
    }
}

impl ThermalQualityRules {
    /// Final quality of a completed run. First matching rule wins.
    pub fn settle<Q: QualityTier>(
        &self,
        input: Q,
        optimal_ticks: u32,
        danger_ticks: u32,
        process_time: u32,
        rng: &mut dyn Roll,
    ) -> Q {
        let optimal = fraction(optimal_ticks, process_time);
        let danger = fraction(danger_ticks, process_time);

        if danger > self.danger_limit {
            input.downgrade()
        } else if optimal >= self.top_tier_threshold {
            if rng.chance(self.top_tier_chance) {
                Q::top()
            } else {
                input.upgrade()
            }
        } else if optimal >= self.upgrade_threshold {
            if rng.chance(self.upgrade_chance) {
                input.upgrade()
            } else {
                input
            }
        } else {
            input
        }
    }

    /// Quality the run would settle at if it finished now, without rolling.
    /// Fractions are taken over the ticks elapsed so far.
    pub fn project<Q: QualityTier>(
        &self,
        input: Q,
        optimal_ticks: u32,
        danger_ticks: u32,
        elapsed: u32,
    ) -> Q {
        if elapsed == 0 {
            return input;
        }
        let optimal = fraction(optimal_ticks, elapsed);
        let danger = fraction(danger_ticks, elapsed);

        if danger > self.danger_limit {
            input.downgrade()
        } else if optimal >= self.projection_fraction {
            input.upgrade()
        } else {
            input
        }
    }

    /// Every probability these rules may roll with, or treat as a fraction.
    pub fn fractions(&self) -> [Fixed64; 6] {
        [
            self.danger_limit,
            self.top_tier_threshold,
            self.top_tier_chance,
            self.upgrade_threshold,
            self.upgrade_chance,
            self.projection_fraction,
        ]
    }
}
