//! Save and restore of station state.
//!
//! Documents refer to item types and quality tiers by their stable NAMES,
//! never by id or ordinal, so registries can be renumbered and tier sets
//! extended without breaking saves. Loading is forgiving: an unknown name
//! resets only the slot (or reactor batch) it appears in, with a warning.
//!
//! Two encodings are provided: JSON for tooling and inspection, and a
//! `bitcode` binary form behind a versioned [`SnapshotHeader`].

use crate::config::{BatchConfig, StationCatalog, ThermalConfig};
use crate::effect::Position;
use crate::fixed::{Fixed64, Ticks};
use crate::id::ItemTypeId;
use crate::plant::{Plant, Station};
use crate::quality::QualityTier;
use crate::registry::ItemRegistry;
use crate::rng::SimRng;
use crate::slot::{BatchOutput, BatchSlot, Ingredient};
use crate::station::BatchStation;
use crate::thermal::{ThermalProcess, ThermalRun};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a binary plant snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xBA7C_0001;

/// Current format version. Increment when breaking the document layout.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort a save or load. Per-slot corruption is not an error;
/// it is recovered and logged.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("item type {0:?} is not in the registry")]
    UnregisteredItem(ItemTypeId),
    #[error("no station configuration named `{0}`")]
    UnknownStation(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDocument {
    pub item: String,
    pub quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub item: String,
    pub quantity: u32,
    pub quality: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDocument {
    pub inputs: Vec<IngredientDocument>,
    pub elapsed: u32,
    pub output: Option<OutputDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDocument {
    /// Name of the station's configuration.
    pub station: String,
    pub slots: Vec<SlotDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalDocument {
    /// Name of the station's configuration.
    pub station: String,
    pub position: Position,
    pub temperature: f64,
    pub heating: bool,
    pub processing: bool,
    pub progress: u32,
    pub optimal_ticks: u32,
    pub danger_ticks: u32,
    pub input: Option<IngredientDocument>,
    pub output: Option<OutputDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StationDocument {
    Batch(BatchDocument),
    Thermal(ThermalDocument),
}

/// A whole plant. Stations are listed in tick order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDocument {
    pub tick: Ticks,
    pub rng_state: u64,
    pub stations: Vec<StationDocument>,
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

fn item_name(registry: &ItemRegistry, item: ItemTypeId) -> Result<String, PersistError> {
    registry
        .name(item)
        .map(str::to_string)
        .ok_or(PersistError::UnregisteredItem(item))
}

fn save_ingredient<Q: QualityTier>(
    registry: &ItemRegistry,
    ingredient: &Ingredient<Q>,
) -> Result<IngredientDocument, PersistError> {
    Ok(IngredientDocument {
        item: item_name(registry, ingredient.item)?,
        quality: ingredient.quality.map(|q| q.name().to_string()),
    })
}

fn save_output<Q: QualityTier>(
    registry: &ItemRegistry,
    output: &BatchOutput<Q>,
) -> Result<OutputDocument, PersistError> {
    Ok(OutputDocument {
        item: item_name(registry, output.item)?,
        quantity: output.quantity,
        quality: output.quality.name().to_string(),
    })
}

/// Why a persisted value could not be restored.
#[derive(Debug)]
enum Corrupt<'a> {
    Item(&'a str),
    Quality(&'a str),
    Stage { item: &'a str, stage: usize },
}

impl std::fmt::Display for Corrupt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Corrupt::Item(name) => write!(f, "unknown item `{name}`"),
            Corrupt::Quality(name) => write!(f, "unknown quality `{name}`"),
            Corrupt::Stage { item, stage } => {
                write!(f, "item `{item}` does not belong to stage {stage}")
            }
        }
    }
}

fn load_item<'a>(registry: &ItemRegistry, name: &'a str) -> Result<ItemTypeId, Corrupt<'a>> {
    registry.id(name).ok_or(Corrupt::Item(name))
}

fn load_quality<Q: QualityTier>(name: &str) -> Result<Q, Corrupt<'_>> {
    Q::from_name(name).ok_or(Corrupt::Quality(name))
}

fn load_ingredient<'a, Q: QualityTier>(
    registry: &ItemRegistry,
    doc: &'a IngredientDocument,
) -> Result<Ingredient<Q>, Corrupt<'a>> {
    let item = load_item(registry, &doc.item)?;
    let quality = doc.quality.as_deref().map(load_quality).transpose()?;
    Ok(Ingredient { item, quality })
}

fn load_output<'a, Q: QualityTier>(
    registry: &ItemRegistry,
    doc: &'a OutputDocument,
) -> Result<BatchOutput<Q>, Corrupt<'a>> {
    Ok(BatchOutput {
        item: load_item(registry, &doc.item)?,
        quantity: doc.quantity,
        quality: load_quality(&doc.quality)?,
    })
}

// ---------------------------------------------------------------------------
// Batch stations
// ---------------------------------------------------------------------------

pub fn save_batch<Q: QualityTier>(
    station: &BatchStation<Q>,
    registry: &ItemRegistry,
) -> Result<BatchDocument, PersistError> {
    let slots = station
        .slots()
        .iter()
        .map(|slot| {
            Ok(SlotDocument {
                inputs: slot
                    .inputs()
                    .iter()
                    .map(|i| save_ingredient(registry, i))
                    .collect::<Result<_, PersistError>>()?,
                elapsed: slot.elapsed(),
                output: slot.output().map(|o| save_output(registry, o)).transpose()?,
            })
        })
        .collect::<Result<_, PersistError>>()?;
    Ok(BatchDocument {
        station: station.name().to_string(),
        slots,
    })
}

fn load_slot<'a, Q: QualityTier>(
    config: &BatchConfig<Q>,
    registry: &ItemRegistry,
    doc: &'a SlotDocument,
) -> Result<BatchSlot<Q>, Corrupt<'a>> {
    let output = doc.output.as_ref().map(|o| load_output(registry, o)).transpose()?;
    let mut inputs = Vec::with_capacity(doc.inputs.len());
    for (stage, input) in doc.inputs.iter().enumerate() {
        let ingredient = load_ingredient(registry, input)?;
        if config.stage_of(ingredient.item) != Some(stage) {
            return Err(Corrupt::Stage {
                item: &input.item,
                stage,
            });
        }
        inputs.push(ingredient);
    }
    Ok(BatchSlot::restore(
        config.stages.len(),
        inputs,
        doc.elapsed,
        output,
    ))
}

/// Rebuild a batch station from `doc`. Slots that fail to decode are reset
/// to empty; slots beyond the configured capacity are dropped.
pub fn load_batch<Q: QualityTier>(
    doc: &BatchDocument,
    config: BatchConfig<Q>,
    registry: &ItemRegistry,
) -> BatchStation<Q> {
    if doc.slots.len() > config.capacity {
        warn!(
            station = %doc.station,
            saved = doc.slots.len(),
            capacity = config.capacity,
            "dropping saved slots beyond capacity"
        );
    }
    let slots = doc
        .slots
        .iter()
        .take(config.capacity)
        .enumerate()
        .map(|(index, slot)| {
            load_slot(&config, registry, slot).unwrap_or_else(|err| {
                warn!(station = %doc.station, slot = index, %err, "resetting corrupt slot");
                BatchSlot::new(config.stages.len())
            })
        })
        .collect();
    BatchStation::restore(config, slots)
}

// ---------------------------------------------------------------------------
// Thermal reactors
// ---------------------------------------------------------------------------

pub fn save_thermal<Q: QualityTier>(
    reactor: &ThermalProcess<Q>,
    registry: &ItemRegistry,
) -> Result<ThermalDocument, PersistError> {
    let input = reactor
        .run()
        .map(|run| {
            Ok::<_, PersistError>(IngredientDocument {
                item: item_name(registry, run.item)?,
                quality: Some(run.input.name().to_string()),
            })
        })
        .transpose()?;
    Ok(ThermalDocument {
        station: reactor.name().to_string(),
        position: reactor.position(),
        temperature: reactor.temperature_f64(),
        heating: reactor.is_heating(),
        processing: reactor.is_processing(),
        progress: reactor.progress(),
        optimal_ticks: reactor.optimal_ticks(),
        danger_ticks: reactor.danger_ticks(),
        input,
        output: reactor.output().map(|o| save_output(registry, o)).transpose()?,
    })
}

/// Rebuild a reactor from `doc`.
///
/// An unknown or unaccepted input item drops the batch. An unknown input
/// quality name falls back to the lowest tier. A corrupt output is dropped.
/// A temperature outside the fixed-point range (or NaN) resets to ambient.
pub fn load_thermal<Q: QualityTier>(
    doc: &ThermalDocument,
    config: ThermalConfig<Q>,
    registry: &ItemRegistry,
) -> ThermalProcess<Q> {
    let run = doc.input.as_ref().and_then(|input| {
        let item = match load_item(registry, &input.item) {
            Ok(item) if config.accepts.contains(&item) => item,
            Ok(_) => {
                let err = Corrupt::Stage {
                    item: &input.item,
                    stage: 0,
                };
                warn!(station = %doc.station, %err, "resetting corrupt reactor batch");
                return None;
            }
            Err(err) => {
                warn!(station = %doc.station, %err, "resetting corrupt reactor batch");
                return None;
            }
        };
        let quality = match input.quality.as_deref() {
            None => config.fallback_quality,
            Some(name) => load_quality(name).unwrap_or_else(|err| {
                warn!(station = %doc.station, %err, "input quality reset to lowest tier");
                Q::bottom()
            }),
        };
        Some(ThermalRun {
            item,
            input: quality,
            elapsed: doc.progress,
            optimal_ticks: doc.optimal_ticks,
            danger_ticks: doc.danger_ticks,
        })
    });
    let output = doc.output.as_ref().and_then(|o| {
        load_output(registry, o)
            .map_err(|err| warn!(station = %doc.station, %err, "dropping corrupt reactor output"))
            .ok()
    });
    let temperature = Fixed64::checked_from_num(doc.temperature).unwrap_or_else(|| {
        warn!(
            station = %doc.station,
            temperature = doc.temperature,
            "temperature out of range, reset to ambient"
        );
        config.ambient
    });
    ThermalProcess::restore(
        config,
        doc.position,
        temperature,
        doc.heating,
        doc.processing,
        run,
        output,
    )
}

// ---------------------------------------------------------------------------
// Plant
// ---------------------------------------------------------------------------

impl<Q: QualityTier> Plant<Q> {
    /// Capture every station, the tick counter and the RNG state.
    pub fn save(&self, registry: &ItemRegistry) -> Result<PlantDocument, PersistError> {
        let stations = self
            .iter()
            .map(|(_, station)| match station {
                Station::Batch(s) => save_batch(s, registry).map(StationDocument::Batch),
                Station::Thermal(s) => save_thermal(s, registry).map(StationDocument::Thermal),
            })
            .collect::<Result<_, _>>()?;
        Ok(PlantDocument {
            tick: self.tick(),
            rng_state: self.rng().state(),
            stations,
        })
    }

    /// Rebuild a plant, looking each station's configuration up by name.
    ///
    /// Station ids are freshly assigned; [`ids`](Plant::ids) yields them in
    /// document order.
    pub fn load(
        doc: &PlantDocument,
        registry: &ItemRegistry,
        catalog: &StationCatalog<Q>,
    ) -> Result<Self, PersistError> {
        let stations = doc
            .stations
            .iter()
            .map(|station| match station {
                StationDocument::Batch(d) => catalog
                    .batch(&d.station)
                    .map(|c| Station::Batch(load_batch(d, c.clone(), registry)))
                    .ok_or_else(|| PersistError::UnknownStation(d.station.clone())),
                StationDocument::Thermal(d) => catalog
                    .thermal(&d.station)
                    .map(|c| Station::Thermal(load_thermal(d, c.clone(), registry)))
                    .ok_or_else(|| PersistError::UnknownStation(d.station.clone())),
            })
            .collect::<Result<_, _>>()?;
        Ok(Plant::from_parts(SimRng::new(doc.rng_state), doc.tick, stations))
    }
}

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

pub fn to_json(doc: &PlantDocument) -> Result<String, PersistError> {
    serde_json::to_string_pretty(doc).map_err(|e| PersistError::Encode(e.to_string()))
}

pub fn from_json(json: &str) -> Result<PlantDocument, PersistError> {
    serde_json::from_str(json).map_err(|e| PersistError::Decode(e.to_string()))
}

/// Header prepended to every binary snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Plant tick at the time the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(PersistError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(PersistError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PlantSnapshot {
    header: SnapshotHeader,
    plant: PlantDocument,
}

pub fn to_bytes(doc: &PlantDocument) -> Result<Vec<u8>, PersistError> {
    let snapshot = PlantSnapshot {
        header: SnapshotHeader::new(doc.tick),
        plant: doc.clone(),
    };
    bitcode::serialize(&snapshot).map_err(|e| PersistError::Encode(e.to_string()))
}

/// Decode a binary snapshot, validating the header first.
pub fn from_bytes(data: &[u8]) -> Result<PlantDocument, PersistError> {
    let snapshot: PlantSnapshot =
        bitcode::deserialize(data).map_err(|e| PersistError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    Ok(snapshot.plant)
}
