//! Station configuration and its validation.
//!
//! Every tunable constant lives here rather than in the tick code. See
//! [`presets`](crate::presets) for the standard production line.

use crate::fixed::{Fixed64, fixed64_to_f64, is_probability};
use crate::id::ItemTypeId;
use crate::policy::{QualityPolicy, ThermalQualityRules};
use crate::quality::QualityTier;
use crate::slot::MAX_STAGES;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration that cannot be simulated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("station `{station}`: capacity must be at least 1")]
    ZeroCapacity { station: String },
    #[error("station `{station}`: process time must be at least 1 tick")]
    ZeroProcessTime { station: String },
    #[error("station `{station}`: output quantity must be at least 1")]
    ZeroOutputQuantity { station: String },
    #[error("station `{station}`: needs 1 to 3 ingredient stages, got {count}")]
    StageCount { station: String, count: usize },
    #[error("station `{station}`: stage `{stage}` accepts no items")]
    EmptyStage { station: String, stage: String },
    #[error("station `{station}`: item {item:?} is accepted by more than one stage")]
    AmbiguousItem { station: String, item: ItemTypeId },
    #[error("station `{station}`: {field} must be in [0, 1], got {value}")]
    Probability {
        station: String,
        field: &'static str,
        value: f64,
    },
    #[error(
        "station `{station}`: temperatures must satisfy \
         ambient < optimal min <= optimal max <= danger max < explosion"
    )]
    ThresholdOrder { station: String },
    #[error("station `{station}`: {field} must be positive")]
    NonPositiveRate {
        station: String,
        field: &'static str,
    },
}

fn check_probability(station: &str, field: &'static str, p: Fixed64) -> Result<(), ConfigError> {
    if is_probability(p) {
        Ok(())
    } else {
        Err(ConfigError::Probability {
            station: station.to_string(),
            field,
            value: fixed64_to_f64(p),
        })
    }
}

// ---------------------------------------------------------------------------
// Batch stations
// ---------------------------------------------------------------------------

/// One position in a station's fixed ingredient order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientStage {
    pub name: String,
    /// Item types this stage accepts (alternative variants of one reagent).
    pub accepts: Vec<ItemTypeId>,
}

impl IngredientStage {
    pub fn new(name: impl Into<String>, accepts: Vec<ItemTypeId>) -> Self {
        Self {
            name: name.into(),
            accepts,
        }
    }
}

/// Static configuration of a [`BatchStation`](crate::station::BatchStation).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig<Q> {
    pub name: String,
    /// Number of slots. Fixed for the life of the station.
    pub capacity: usize,
    /// Ticks one batch needs to complete.
    pub process_time: u32,
    /// Ingredient order. Stage 0 is the primary ingredient.
    pub stages: Vec<IngredientStage>,
    pub output_item: ItemTypeId,
    /// Units produced by one completed batch.
    pub output_quantity: u32,
    pub policy: QualityPolicy<Q>,
}

impl<Q: QualityTier> BatchConfig<Q> {
    /// Stage index that accepts `item`, if any.
    pub fn stage_of(&self, item: ItemTypeId) -> Option<usize> {
        self.stages.iter().position(|s| s.accepts.contains(&item))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let station = || self.name.clone();
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity { station: station() });
        }
        if self.process_time == 0 {
            return Err(ConfigError::ZeroProcessTime { station: station() });
        }
        if self.output_quantity == 0 {
            return Err(ConfigError::ZeroOutputQuantity { station: station() });
        }
        if self.stages.is_empty() || self.stages.len() > MAX_STAGES {
            return Err(ConfigError::StageCount {
                station: station(),
                count: self.stages.len(),
            });
        }
        let mut seen = Vec::new();
        for stage in &self.stages {
            if stage.accepts.is_empty() {
                return Err(ConfigError::EmptyStage {
                    station: station(),
                    stage: stage.name.clone(),
                });
            }
            for &item in &stage.accepts {
                if seen.contains(&item) {
                    return Err(ConfigError::AmbiguousItem {
                        station: station(),
                        item,
                    });
                }
                seen.push(item);
            }
        }
        for p in self.policy.chances() {
            check_probability(&self.name, "upgrade chance", p)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Thermal reactor
// ---------------------------------------------------------------------------

/// Static configuration of a [`ThermalProcess`](crate::thermal::ThermalProcess).
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalConfig<Q> {
    pub name: String,
    /// Temperature floor; also the starting and post-extract temperature.
    pub ambient: Fixed64,
    pub optimal_min: Fixed64,
    pub optimal_max: Fixed64,
    /// Top of the danger zone. Above this the reactor is critical.
    pub danger_max: Fixed64,
    /// Reaching this destroys the reactor.
    pub explosion_at: Fixed64,
    /// Per-tick rise while heating.
    pub rise_rate: Fixed64,
    /// Per-tick fall while not heating.
    pub fall_rate: Fixed64,
    /// Extra per-tick rise while heating and processing.
    pub process_heat: Fixed64,
    /// Temperature drop when a batch completes.
    pub completion_cooldown: Fixed64,
    pub process_time: u32,
    pub accepts: Vec<ItemTypeId>,
    /// Input quality assumed for ingredients that carry none.
    pub fallback_quality: Q,
    pub output_item: ItemTypeId,
    pub output_quantity: u32,
    pub blast_radius: Fixed64,
    pub blast_magnitude: Fixed64,
    pub rules: ThermalQualityRules,
}

impl<Q: QualityTier> ThermalConfig<Q> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let station = || self.name.clone();
        if self.process_time == 0 {
            return Err(ConfigError::ZeroProcessTime { station: station() });
        }
        if self.output_quantity == 0 {
            return Err(ConfigError::ZeroOutputQuantity { station: station() });
        }
        if self.accepts.is_empty() {
            return Err(ConfigError::EmptyStage {
                station: station(),
                stage: "input".to_string(),
            });
        }
        let ordered = self.ambient < self.optimal_min
            && self.optimal_min <= self.optimal_max
            && self.optimal_max <= self.danger_max
            && self.danger_max < self.explosion_at;
        if !ordered {
            return Err(ConfigError::ThresholdOrder { station: station() });
        }
        for (field, rate) in [("rise rate", self.rise_rate), ("fall rate", self.fall_rate)] {
            if rate <= Fixed64::ZERO {
                return Err(ConfigError::NonPositiveRate {
                    station: station(),
                    field,
                });
            }
        }
        for (field, rate) in [
            ("process heat", self.process_heat),
            ("completion cooldown", self.completion_cooldown),
            ("blast radius", self.blast_radius),
            ("blast magnitude", self.blast_magnitude),
        ] {
            if rate < Fixed64::ZERO {
                return Err(ConfigError::NonPositiveRate {
                    station: station(),
                    field,
                });
            }
        }
        for p in self.rules.fractions() {
            check_probability(&self.name, "quality rule fraction", p)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Station configurations by name. Persisted stations refer to their
/// configuration by name and are rebuilt from a catalog on load.
#[derive(Debug, Clone)]
pub struct StationCatalog<Q> {
    batch: BTreeMap<String, BatchConfig<Q>>,
    thermal: BTreeMap<String, ThermalConfig<Q>>,
}

impl<Q> Default for StationCatalog<Q> {
    fn default() -> Self {
        Self {
            batch: BTreeMap::new(),
            thermal: BTreeMap::new(),
        }
    }
}

impl<Q: QualityTier> StationCatalog<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch configuration, replacing any with the same name.
    pub fn insert_batch(&mut self, config: BatchConfig<Q>) {
        self.batch.insert(config.name.clone(), config);
    }

    /// Add a thermal configuration, replacing any with the same name.
    pub fn insert_thermal(&mut self, config: ThermalConfig<Q>) {
        self.thermal.insert(config.name.clone(), config);
    }

    pub fn batch(&self, name: &str) -> Option<&BatchConfig<Q>> {
        self.batch.get(name)
    }

    pub fn thermal(&self, name: &str) -> Option<&ThermalConfig<Q>> {
        self.thermal.get(name)
    }

    pub fn batch_configs(&self) -> impl Iterator<Item = &BatchConfig<Q>> {
        self.batch.values()
    }

    pub fn thermal_configs(&self) -> impl Iterator<Item = &ThermalConfig<Q>> {
        self.thermal.values()
    }

    pub fn len(&self) -> usize {
        self.batch.len() + self.thermal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for config in self.batch.values() {
            config.validate()?;
        }
        for config in self.thermal.values() {
            config.validate()?;
        }
        Ok(())
    }
}
