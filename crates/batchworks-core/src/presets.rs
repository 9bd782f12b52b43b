//! The standard four-stage production line.
//!
//! ```text
//! base/refined reagent + catalyst A + catalyst B
//!   -> mixing station       -> reaction mixture
//!   -> reduction reactor    -> raw product
//!   -> crystallizer         -> crystals
//!   -> vacuum dryer         -> finished product
//! ```
//!
//! Every constant is a plain config field and may be tuned after
//! construction.

use crate::config::{BatchConfig, IngredientStage, StationCatalog, ThermalConfig};
use crate::fixed::Fixed64;
use crate::id::ItemTypeId;
use crate::policy::{QualityPolicy, ThermalQualityRules};
use crate::quality::Grade;
use crate::registry::{ItemRegistry, ItemRegistryBuilder, RegistryError};

/// Item names used by the line, in registration order.
pub const LINE_ITEM_NAMES: [&str; 8] = [
    "base_reagent",
    "refined_reagent",
    "catalyst_a",
    "catalyst_b",
    "reaction_mixture",
    "raw_product",
    "crystals",
    "finished_product",
];

/// Item type ids of the production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItems {
    pub base_reagent: ItemTypeId,
    /// Alternative primary reagent with a better upgrade chance.
    pub refined_reagent: ItemTypeId,
    pub catalyst_a: ItemTypeId,
    pub catalyst_b: ItemTypeId,
    pub reaction_mixture: ItemTypeId,
    pub raw_product: ItemTypeId,
    pub crystals: ItemTypeId,
    pub finished_product: ItemTypeId,
}

impl LineItems {
    /// Register every line item in `builder`.
    pub fn register(builder: &mut ItemRegistryBuilder) -> Result<Self, RegistryError> {
        let mut ids = [ItemTypeId(0); LINE_ITEM_NAMES.len()];
        for (id, name) in ids.iter_mut().zip(LINE_ITEM_NAMES) {
            *id = builder.register(name)?;
        }
        Ok(Self::from_ids(ids))
    }

    /// Look the line items up in an existing registry.
    pub fn from_registry(registry: &ItemRegistry) -> Result<Self, RegistryError> {
        let mut ids = [ItemTypeId(0); LINE_ITEM_NAMES.len()];
        for (id, name) in ids.iter_mut().zip(LINE_ITEM_NAMES) {
            *id = registry.require(name)?;
        }
        Ok(Self::from_ids(ids))
    }

    fn from_ids(ids: [ItemTypeId; 8]) -> Self {
        let [
            base_reagent,
            refined_reagent,
            catalyst_a,
            catalyst_b,
            reaction_mixture,
            raw_product,
            crystals,
            finished_product,
        ] = ids;
        Self {
            base_reagent,
            refined_reagent,
            catalyst_a,
            catalyst_b,
            reaction_mixture,
            raw_product,
            crystals,
            finished_product,
        }
    }
}

/// A registry holding exactly the line items.
pub fn line_registry() -> Result<(ItemRegistry, LineItems), RegistryError> {
    let mut builder = ItemRegistryBuilder::new();
    let items = LineItems::register(&mut builder)?;
    Ok((builder.build(), items))
}

fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Stage 1: capacity 4, 600 ticks, base -> catalyst A -> catalyst B.
/// Output starts at Poor with a 25% upgrade chance (35% with the refined
/// reagent).
pub fn mixing_station(items: &LineItems) -> BatchConfig<Grade> {
    BatchConfig {
        name: "mixing_station".to_string(),
        capacity: 4,
        process_time: 600,
        stages: vec![
            IngredientStage::new("base", vec![items.base_reagent, items.refined_reagent]),
            IngredientStage::new("catalyst_a", vec![items.catalyst_a]),
            IngredientStage::new("catalyst_b", vec![items.catalyst_b]),
        ],
        output_item: items.reaction_mixture,
        output_quantity: 1,
        policy: QualityPolicy::BaseRoll {
            base: Grade::Poor,
            default_chance: fixed(0.25),
            variant_chances: vec![(items.refined_reagent, fixed(0.35))],
        },
    }
}

/// Stage 2: the thermal reactor. Optimal 80..=120, explodes at 151.
pub fn reduction_reactor(items: &LineItems) -> ThermalConfig<Grade> {
    ThermalConfig {
        name: "reduction_reactor".to_string(),
        ambient: fixed(20.0),
        optimal_min: fixed(80.0),
        optimal_max: fixed(120.0),
        danger_max: fixed(150.0),
        explosion_at: fixed(151.0),
        rise_rate: fixed(1.5),
        fall_rate: fixed(0.8),
        process_heat: fixed(0.3),
        completion_cooldown: fixed(30.0),
        process_time: 400,
        accepts: vec![items.reaction_mixture],
        fallback_quality: Grade::Standard,
        output_item: items.raw_product,
        output_quantity: 1,
        blast_radius: fixed(8.0),
        blast_magnitude: fixed(10.0),
        rules: ThermalQualityRules::default(),
    }
}

/// Stage 3: capacity 4, 800 ticks, 15% upgrade chance on the carried quality.
pub fn crystallizer(items: &LineItems) -> BatchConfig<Grade> {
    BatchConfig {
        name: "crystallizer".to_string(),
        capacity: 4,
        process_time: 800,
        stages: vec![IngredientStage::new("raw_product", vec![items.raw_product])],
        output_item: items.crystals,
        output_quantity: 1,
        policy: QualityPolicy::Refine {
            fallback: Grade::Standard,
            upgrade_chance: fixed(0.15),
        },
    }
}

/// Stage 4: capacity 6, 600 ticks, quality carried verbatim.
pub fn vacuum_dryer(items: &LineItems) -> BatchConfig<Grade> {
    BatchConfig {
        name: "vacuum_dryer".to_string(),
        capacity: 6,
        process_time: 600,
        stages: vec![IngredientStage::new("crystals", vec![items.crystals])],
        output_item: items.finished_product,
        output_quantity: 1,
        policy: QualityPolicy::Carry {
            fallback: Grade::Standard,
        },
    }
}

/// All four stages, by name.
pub fn line_catalog(items: &LineItems) -> StationCatalog<Grade> {
    let mut catalog = StationCatalog::new();
    catalog.insert_batch(mixing_station(items));
    catalog.insert_thermal(reduction_reactor(items));
    catalog.insert_batch(crystallizer(items));
    catalog.insert_batch(vacuum_dryer(items));
    catalog
}
