//! Resolution pipeline: reads data files, resolves names, builds the registry
//! and station catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_line`] which ties them together.

use crate::schema::{
    BatchStationData, ItemData, PolicyData, RulesData, StationData, ThermalStationData,
};
use batchworks_core::config::{
    BatchConfig, ConfigError, IngredientStage, StationCatalog, ThermalConfig,
};
use batchworks_core::fixed::Fixed64;
use batchworks_core::id::ItemTypeId;
use batchworks_core::policy::{QualityPolicy, ThermalQualityRules};
use batchworks_core::quality::QualityTier;
use batchworks_core::registry::{ItemRegistry, ItemRegistryBuilder};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A number that does not fit the fixed-point range (or is NaN).
    #[error("{field} of '{station}' in {file} is out of range: {value}")]
    OutOfRange {
        file: PathBuf,
        station: String,
        field: &'static str,
        value: f64,
    },

    /// The resolved configuration cannot be simulated.
    #[error("invalid station in {file}: {source}")]
    Invalid {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Line loading
// ===========================================================================

/// Items and station configurations resolved from a data directory.
#[derive(Debug, Clone)]
pub struct LineData<Q> {
    pub registry: ItemRegistry,
    pub catalog: StationCatalog<Q>,
}

/// Load `items.*` and `stations.*` from `dir`.
///
/// Items are registered in file order. Every station name, item reference
/// and quality name is resolved, and each resolved configuration is
/// validated before it enters the catalog.
pub fn load_line<Q: QualityTier>(dir: &Path) -> Result<LineData<Q>, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let stations_path = require_data_file(dir, "stations")?;

    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let mut builder = ItemRegistryBuilder::new();
    for item in &items {
        builder
            .register(&item.name)
            .map_err(|_| DataLoadError::DuplicateName {
                file: items_path.clone(),
                name: item.name.clone(),
            })?;
    }
    let registry = builder.build();

    let stations: Vec<StationData> = deserialize_list(&stations_path, "stations")?;
    let resolver = Resolver {
        registry: &registry,
        file: &stations_path,
    };
    let mut catalog = StationCatalog::new();
    for station in &stations {
        let name = station.name();
        if catalog.batch(name).is_some() || catalog.thermal(name).is_some() {
            return Err(DataLoadError::DuplicateName {
                file: stations_path.clone(),
                name: name.to_string(),
            });
        }
        match station {
            StationData::Batch(data) => catalog.insert_batch(resolver.batch(data)?),
            StationData::Thermal(data) => catalog.insert_thermal(resolver.thermal(data)?),
        }
    }

    info!(
        dir = %dir.display(),
        items = registry.len(),
        stations = catalog.len(),
        "production line loaded"
    );
    Ok(LineData { registry, catalog })
}

// ===========================================================================
// Name resolution
// ===========================================================================

struct Resolver<'a> {
    registry: &'a ItemRegistry,
    file: &'a Path,
}

impl Resolver<'_> {
    fn unresolved(&self, name: &str, expected_kind: &'static str) -> DataLoadError {
        DataLoadError::UnresolvedRef {
            file: self.file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        }
    }

    fn item(&self, name: &str) -> Result<ItemTypeId, DataLoadError> {
        self.registry
            .id(name)
            .ok_or_else(|| self.unresolved(name, "item"))
    }

    fn items(&self, names: &[String]) -> Result<Vec<ItemTypeId>, DataLoadError> {
        names.iter().map(|n| self.item(n)).collect()
    }

    fn quality<Q: QualityTier>(&self, name: &str) -> Result<Q, DataLoadError> {
        Q::from_name(name).ok_or_else(|| self.unresolved(name, "quality"))
    }

    fn number(
        &self,
        station: &str,
        field: &'static str,
        value: f64,
    ) -> Result<Fixed64, DataLoadError> {
        Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::OutOfRange {
            file: self.file.to_path_buf(),
            station: station.to_string(),
            field,
            value,
        })
    }

    fn validated(&self, result: Result<(), ConfigError>) -> Result<(), DataLoadError> {
        result.map_err(|source| DataLoadError::Invalid {
            file: self.file.to_path_buf(),
            source,
        })
    }

    fn policy<Q: QualityTier>(
        &self,
        station: &str,
        data: &PolicyData,
    ) -> Result<QualityPolicy<Q>, DataLoadError> {
        Ok(match data {
            PolicyData::BaseRoll {
                base,
                chance,
                variants,
            } => QualityPolicy::BaseRoll {
                base: self.quality(base)?,
                default_chance: self.number(station, "chance", *chance)?,
                variant_chances: variants
                    .iter()
                    .map(|(item, c)| Ok((self.item(item)?, self.number(station, "variant chance", *c)?)))
                    .collect::<Result<_, DataLoadError>>()?,
            },
            PolicyData::Refine { fallback, chance } => QualityPolicy::Refine {
                fallback: self.quality(fallback)?,
                upgrade_chance: self.number(station, "chance", *chance)?,
            },
            PolicyData::Carry { fallback } => QualityPolicy::Carry {
                fallback: self.quality(fallback)?,
            },
        })
    }

    fn batch<Q: QualityTier>(&self, data: &BatchStationData) -> Result<BatchConfig<Q>, DataLoadError> {
        let stages = data
            .stages
            .iter()
            .map(|s| Ok(IngredientStage::new(s.name.clone(), self.items(&s.accepts)?)))
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        let config = BatchConfig {
            name: data.name.clone(),
            capacity: data.capacity,
            process_time: data.process_time,
            stages,
            output_item: self.item(&data.output)?,
            output_quantity: data.output_quantity,
            policy: self.policy(&data.name, &data.quality)?,
        };
        self.validated(config.validate())?;
        Ok(config)
    }

    fn rules(&self, station: &str, data: &RulesData) -> Result<ThermalQualityRules, DataLoadError> {
        Ok(ThermalQualityRules {
            danger_limit: self.number(station, "danger_limit", data.danger_limit)?,
            top_tier_threshold: self.number(station, "top_tier_threshold", data.top_tier_threshold)?,
            top_tier_chance: self.number(station, "top_tier_chance", data.top_tier_chance)?,
            upgrade_threshold: self.number(station, "upgrade_threshold", data.upgrade_threshold)?,
            upgrade_chance: self.number(station, "upgrade_chance", data.upgrade_chance)?,
            projection_fraction: self.number(
                station,
                "projection_fraction",
                data.projection_fraction,
            )?,
        })
    }

    fn thermal<Q: QualityTier>(
        &self,
        data: &ThermalStationData,
    ) -> Result<ThermalConfig<Q>, DataLoadError> {
        let name = data.name.as_str();
        let config = ThermalConfig {
            name: data.name.clone(),
            ambient: self.number(name, "ambient", data.ambient)?,
            optimal_min: self.number(name, "optimal_min", data.optimal_min)?,
            optimal_max: self.number(name, "optimal_max", data.optimal_max)?,
            danger_max: self.number(name, "danger_max", data.danger_max)?,
            explosion_at: self.number(name, "explosion_at", data.explosion_at)?,
            rise_rate: self.number(name, "rise_rate", data.rise_rate)?,
            fall_rate: self.number(name, "fall_rate", data.fall_rate)?,
            process_heat: self.number(name, "process_heat", data.process_heat)?,
            completion_cooldown: self.number(name, "completion_cooldown", data.completion_cooldown)?,
            process_time: data.process_time,
            accepts: self.items(&data.accepts)?,
            fallback_quality: self.quality(&data.fallback_quality)?,
            output_item: self.item(&data.output)?,
            output_quantity: data.output_quantity,
            blast_radius: self.number(name, "blast_radius", data.blast_radius)?,
            blast_magnitude: self.number(name, "blast_magnitude", data.blast_magnitude)?,
            rules: self.rules(name, &data.rules)?,
        };
        self.validated(config.validate())?;
        Ok(config)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use batchworks_core::quality::{Finish, Grade};
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "batchworks_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const ITEMS_RON: &str = r#"[
        (name: "ore"),
        (name: "flux"),
        (name: "slurry"),
        (name: "ingot"),
    ]"#;

    const STATIONS_RON: &str = r#"[
        Batch((
            name: "mixer",
            capacity: 2,
            process_time: 10,
            stages: [
                (name: "base", accepts: ["ore"]),
                (name: "flux", accepts: ["flux"]),
            ],
            output: "slurry",
            quality: BaseRoll(base: "poor", chance: 0.25, variants: []),
        )),
        Thermal((
            name: "smelter",
            ambient: 20.0,
            optimal_min: 80.0,
            optimal_max: 120.0,
            danger_max: 150.0,
            explosion_at: 151.0,
            rise_rate: 1.5,
            fall_rate: 0.8,
            process_heat: 0.3,
            completion_cooldown: 30.0,
            process_time: 40,
            accepts: ["slurry"],
            fallback_quality: "standard",
            output: "ingot",
            blast_radius: 8.0,
            blast_magnitude: 10.0,
        )),
    ]"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("items.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("items.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["items.yaml", "items"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        fs::write(dir.join("items.json"), "[]").unwrap();

        assert_eq!(
            find_data_file(&dir, "items").unwrap(),
            Some(dir.join("items.json"))
        );
        assert_eq!(find_data_file(&dir, "stations").unwrap(), None);

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("items.ron"), "[]").unwrap();
        fs::write(dir.join("items.json"), "[]").unwrap();

        let result = find_data_file(&dir, "items");
        assert!(matches!(
            result,
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");

        let result = require_data_file(&dir, "items");
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "items"
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_toml() {
        let dir = make_test_dir("list_toml");
        let path = dir.join("items.toml");
        fs::write(
            &path,
            r#"
[[items]]
name = "ore"

[[items]]
name = "flux"
"#,
        )
        .unwrap();

        let items: Vec<ItemData> = deserialize_list(&path, "items").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "flux");

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("list_toml_missing");
        let path = dir.join("items.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();

        let result: Result<Vec<ItemData>, _> = deserialize_list(&path, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_parse_error() {
        let dir = make_test_dir("list_parse_err");
        let path = dir.join("items.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<ItemData>, _> = deserialize_list(&path, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_line
    // -----------------------------------------------------------------------

    #[test]
    fn load_line_resolves_names() {
        let dir = make_test_dir("load_ok");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(dir.join("stations.ron"), STATIONS_RON).unwrap();

        let line: LineData<Grade> = load_line(&dir).unwrap();
        assert_eq!(line.registry.len(), 4);
        assert_eq!(line.catalog.len(), 2);

        let mixer = line.catalog.batch("mixer").unwrap();
        assert_eq!(mixer.stages.len(), 2);
        assert_eq!(mixer.output_item, line.registry.id("slurry").unwrap());
        assert_eq!(
            mixer.policy,
            QualityPolicy::BaseRoll {
                base: Grade::Poor,
                default_chance: Fixed64::from_num(0.25),
                variant_chances: vec![],
            }
        );

        let smelter = line.catalog.thermal("smelter").unwrap();
        assert_eq!(smelter.accepts, vec![line.registry.id("slurry").unwrap()]);
        assert_eq!(smelter.fallback_quality, Grade::Standard);
        assert_eq!(smelter.rules, ThermalQualityRules::default());
        assert_eq!(smelter.output_quantity, 1);

        cleanup(&dir);
    }

    #[test]
    fn load_line_mixed_formats() {
        let dir = make_test_dir("load_mixed");
        fs::write(dir.join("items.json"), r#"[{"name": "wet"}, {"name": "dry"}]"#).unwrap();
        fs::write(
            dir.join("stations.json"),
            r#"[{"Batch": {
                "name": "dryer",
                "capacity": 3,
                "process_time": 5,
                "stages": [{"name": "wet", "accepts": ["wet"]}],
                "output": "dry",
                "quality": {"Carry": {"fallback": "fine"}}
            }}]"#,
        )
        .unwrap();

        let line: LineData<Finish> = load_line(&dir).unwrap();
        let dryer = line.catalog.batch("dryer").unwrap();
        assert_eq!(dryer.policy, QualityPolicy::Carry { fallback: Finish::Fine });

        cleanup(&dir);
    }

    #[test]
    fn load_line_unknown_item() {
        let dir = make_test_dir("load_unknown_item");
        fs::write(dir.join("items.ron"), r#"[(name: "ore"), (name: "flux"), (name: "slurry")]"#)
            .unwrap();
        fs::write(dir.join("stations.ron"), STATIONS_RON).unwrap();

        let result: Result<LineData<Grade>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "item", .. }) if name == "ingot"
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_line_unknown_quality_for_family() {
        let dir = make_test_dir("load_unknown_quality");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(dir.join("stations.ron"), STATIONS_RON).unwrap();

        // "poor" is not a Finish tier.
        let result: Result<LineData<Finish>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { expected_kind: "quality", .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_line_duplicate_item() {
        let dir = make_test_dir("load_dup_item");
        fs::write(dir.join("items.ron"), r#"[(name: "ore"), (name: "ore")]"#).unwrap();
        fs::write(dir.join("stations.ron"), "[]").unwrap();

        let result: Result<LineData<Grade>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "ore"
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_line_rejects_invalid_config() {
        let dir = make_test_dir("load_invalid");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(
            dir.join("stations.ron"),
            r#"[
                Batch((
                    name: "empty",
                    capacity: 0,
                    process_time: 10,
                    stages: [(name: "base", accepts: ["ore"])],
                    output: "slurry",
                    quality: Carry(fallback: "poor"),
                )),
            ]"#,
        )
        .unwrap();

        let result: Result<LineData<Grade>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::Invalid {
                source: ConfigError::ZeroCapacity { .. },
                ..
            })
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_line_huge_number_is_out_of_range() {
        let dir = make_test_dir("load_huge");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(
            dir.join("stations.ron"),
            r#"[
                Batch((
                    name: "mixer",
                    capacity: 1,
                    process_time: 10,
                    stages: [(name: "base", accepts: ["ore"])],
                    output: "slurry",
                    quality: Refine(fallback: "poor", chance: 1e30),
                )),
            ]"#,
        )
        .unwrap();

        let result: Result<LineData<Grade>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::OutOfRange { field: "chance", .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn load_line_missing_stations_file() {
        let dir = make_test_dir("load_missing");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();

        let result: Result<LineData<Grade>, _> = load_line(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "stations"
        ));

        cleanup(&dir);
    }

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::ConflictingFormats {
            a: PathBuf::from("items.ron"),
            b: PathBuf::from("items.json"),
        };
        let msg = format!("{e}");
        assert!(msg.contains("items.ron"));
        assert!(msg.contains("items.json"));

        let e = DataLoadError::UnresolvedRef {
            file: PathBuf::from("stations.ron"),
            name: "ingot".to_string(),
            expected_kind: "item",
        };
        assert!(format!("{e}").contains("ingot"));

        let e = DataLoadError::Invalid {
            file: PathBuf::from("stations.ron"),
            source: ConfigError::ZeroCapacity {
                station: "mixer".to_string(),
            },
        };
        assert!(format!("{e}").contains("mixer"));
    }
}
