//! Serde data file structs for production line definitions.
//!
//! These structs define the on-disk format for items and stations. They are
//! deserialized from RON, JSON, or TOML data files and then resolved into
//! core configuration types by the loader. Items and qualities are referred
//! to by name; numbers are plain floats and become fixed-point on resolve.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Stations
// ===========================================================================

/// A station definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub enum StationData {
    Batch(BatchStationData),
    Thermal(ThermalStationData),
}

impl StationData {
    pub fn name(&self) -> &str {
        match self {
            StationData::Batch(b) => &b.name,
            StationData::Thermal(t) => &t.name,
        }
    }
}

/// A slotted batch station.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchStationData {
    pub name: String,
    pub capacity: usize,
    pub process_time: u32,
    /// Ingredient stages in loading order.
    pub stages: Vec<StageData>,
    pub output: String,
    #[serde(default = "default_quantity")]
    pub output_quantity: u32,
    pub quality: PolicyData,
}

/// One ingredient stage: a display name and the item names it accepts.
#[derive(Debug, Clone, Deserialize)]
pub struct StageData {
    pub name: String,
    pub accepts: Vec<String>,
}

/// Quality policy of a batch station.
#[derive(Debug, Clone, Deserialize)]
pub enum PolicyData {
    /// Fixed base tier, upgrade chance chosen by the primary ingredient.
    BaseRoll {
        base: String,
        chance: f64,
        #[serde(default)]
        variants: Vec<(String, f64)>,
    },
    Refine {
        fallback: String,
        chance: f64,
    },
    Carry {
        fallback: String,
    },
}

/// A thermal reactor.
#[derive(Debug, Clone, Deserialize)]
pub struct ThermalStationData {
    pub name: String,
    pub ambient: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub danger_max: f64,
    pub explosion_at: f64,
    pub rise_rate: f64,
    pub fall_rate: f64,
    #[serde(default)]
    pub process_heat: f64,
    #[serde(default)]
    pub completion_cooldown: f64,
    pub process_time: u32,
    pub accepts: Vec<String>,
    pub fallback_quality: String,
    pub output: String,
    #[serde(default = "default_quantity")]
    pub output_quantity: u32,
    pub blast_radius: f64,
    pub blast_magnitude: f64,
    #[serde(default)]
    pub rules: RulesData,
}

/// Zone-time quality rules. Missing fields take the standard values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesData {
    pub danger_limit: f64,
    pub top_tier_threshold: f64,
    pub top_tier_chance: f64,
    pub upgrade_threshold: f64,
    pub upgrade_chance: f64,
    pub projection_fraction: f64,
}

impl Default for RulesData {
    fn default() -> Self {
        Self {
            danger_limit: 0.30,
            top_tier_threshold: 0.90,
            top_tier_chance: 0.30,
            upgrade_threshold: 0.70,
            upgrade_chance: 0.50,
            projection_fraction: 0.80,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

/// TOML files cannot hold a bare top-level array.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlStations {
    pub stations: Vec<StationData>,
}
