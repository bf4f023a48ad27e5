//! Zipped Shapefile reader
//!
//! Uploaded archives come in many shapes: components at the root, nested in a
//! folder, or declared under layer names GDAL only sees through `/vsizip/`. The
//! reader walks an ordered list of [`ArchiveStrategy`] attempts and returns the
//! first collection any of them produces.

use gdal::Dataset;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PointselError, Result, StrategyFailure};
use crate::formats::gdal_utils::{get_layer_names, has_extension, read_layer, vsizip_path};
use crate::formats::shapefile::ShapefileFormatReader;
use crate::formats::validation::FormatValidator;
use crate::formats::{file_stem, FormatReader, FormatValidation};
use crate::models::FeatureCollection;

const ARCHIVE_FORMAT: &str = "Zipped Shapefile";

const LAYOUT_HINT: &str = "Make sure the archive holds the .shp, .shx and .dbf files (and optionally .prj) \
                           at its root, not inside subfolders";

/// One attempt in the archive fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveStrategy {
    /// Open `/vsizip/<path>` and take the first layer
    VirtualFileSystem,
    /// Hand the archive path to GDAL as-is
    DirectOpen,
    /// Try each layer the archive declares, in order
    DeclaredLayers,
    /// Unpack into a temporary directory and search for a `.shp`
    ExtractAndSearch,
}

impl ArchiveStrategy {
    pub const ORDER: [ArchiveStrategy; 4] = [
        ArchiveStrategy::VirtualFileSystem,
        ArchiveStrategy::DirectOpen,
        ArchiveStrategy::DeclaredLayers,
        ArchiveStrategy::ExtractAndSearch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArchiveStrategy::VirtualFileSystem => "vsizip",
            ArchiveStrategy::DirectOpen => "direct",
            ArchiveStrategy::DeclaredLayers => "declared-layers",
            ArchiveStrategy::ExtractAndSearch => "extract",
        }
    }

    fn fail(&self, reason: impl Into<String>) -> StrategyFailure {
        StrategyFailure {
            strategy: self.label().to_string(),
            reason: reason.into(),
        }
    }
}

/// Reader for `.zip` archives holding a Shapefile
pub struct ZipArchiveReader {
    /// Parent directory for extraction; `None` uses the system temp dir
    temp_root: Option<PathBuf>,
}

impl ZipArchiveReader {
    pub fn new(temp_root: Option<PathBuf>) -> Self {
        Self { temp_root }
    }

    /// Run a single strategy
    pub fn attempt(
        &self,
        strategy: ArchiveStrategy,
        path: &Path,
        layer: Option<&str>,
    ) -> std::result::Result<FeatureCollection, StrategyFailure> {
        match strategy {
            ArchiveStrategy::VirtualFileSystem => read_with_gdal(strategy, &vsizip_path(path), layer),
            ArchiveStrategy::DirectOpen => read_with_gdal(strategy, path, layer),
            ArchiveStrategy::DeclaredLayers => read_declared_layers(path, layer),
            ArchiveStrategy::ExtractAndSearch => self.extract_and_search(path, layer),
        }
    }

    fn extract_and_search(
        &self,
        path: &Path,
        layer: Option<&str>,
    ) -> std::result::Result<FeatureCollection, StrategyFailure> {
        let strategy = ArchiveStrategy::ExtractAndSearch;

        let mut builder = tempfile::Builder::new();
        builder.prefix("pointsel-");
        let temp_dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| strategy.fail(format!("cannot create temporary directory: {}", e)))?;

        let file = File::open(path).map_err(|e| strategy.fail(format!("cannot open archive: {}", e)))?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| strategy.fail(format!("not a valid zip archive: {}", e)))?;
        archive
            .extract(temp_dir.path())
            .map_err(|e| strategy.fail(format!("extraction failed: {}", e)))?;

        let shapefiles = find_shapefiles(temp_dir.path());
        tracing::debug!("Extracted archive contains {} .shp file(s)", shapefiles.len());

        let chosen = match layer {
            Some(requested) => shapefiles.iter().find(|shp| file_stem(shp) == requested),
            None => shapefiles.first(),
        };

        let shp = match chosen {
            Some(shp) => shp,
            None if shapefiles.is_empty() => return Err(strategy.fail("no .shp file found after extraction")),
            None => {
                return Err(strategy.fail(format!(
                    "no .shp file named '{}' (found: {})",
                    layer.unwrap_or_default(),
                    shapefiles.iter().map(|p| file_stem(p)).collect::<Vec<_>>().join(", ")
                )))
            }
        };

        let mut collection = ShapefileFormatReader
            .read(shp, None)
            .map_err(|e| strategy.fail(e.to_string()))?;
        collection.format_metadata.format_name = ARCHIVE_FORMAT.to_string();
        collection.format_metadata.extraction_method = Some(strategy.label().to_string());

        Ok(collection)
    }
}

impl FormatReader for ZipArchiveReader {
    fn read(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let mut attempts = Vec::new();

        for strategy in ArchiveStrategy::ORDER {
            tracing::debug!("Trying archive strategy '{}' on {}", strategy.label(), path.display());

            match self.attempt(strategy, path, layer) {
                Ok(collection) => {
                    tracing::info!(
                        "Read {} features from {} using strategy '{}'",
                        collection.len(),
                        path.display(),
                        strategy.label()
                    );
                    return Ok(collection);
                }
                Err(failure) => {
                    tracing::warn!("Archive strategy '{}' failed: {}", failure.strategy, failure.reason);
                    attempts.push(failure);
                }
            }
        }

        let summary = attempts
            .iter()
            .map(|a| format!("{}: {}", a.strategy, a.reason))
            .collect::<Vec<_>>()
            .join("; ");

        Err(PointselError::UnreadableSource {
            path: path.to_path_buf(),
            reason: format!("every read strategy failed ({}). {}", summary, LAYOUT_HINT),
            attempts,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["zip"]
    }

    fn format_name(&self) -> &str {
        ARCHIVE_FORMAT
    }

    fn layer_names(&self, path: &Path) -> Result<Vec<String>> {
        if let Ok(dataset) = Dataset::open(vsizip_path(path)) {
            let names = get_layer_names(&dataset);
            if !names.is_empty() {
                return Ok(names);
            }
        }

        let inventory = inspect_archive(path)?;
        Ok(inventory.shp.iter().map(|entry| file_stem(Path::new(entry))).collect())
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        match inspect_archive(path) {
            Ok(inventory) => {
                validation.errors.extend(inventory.missing_components());
                if inventory.prj.is_empty() {
                    validation
                        .warnings
                        .push("No .prj file in archive; the layer CRS will be undefined".to_string());
                }
                if inventory.is_nested() {
                    validation.warnings.push(LAYOUT_HINT.to_string());
                }
            }
            Err(e) => validation.errors.push(e.to_string()),
        }

        Ok(validation)
    }
}

/// Read through GDAL, honoring an explicit layer name
fn read_with_gdal(
    strategy: ArchiveStrategy,
    dataset_path: &Path,
    layer: Option<&str>,
) -> std::result::Result<FeatureCollection, StrategyFailure> {
    let dataset = Dataset::open(dataset_path).map_err(|e| strategy.fail(e.to_string()))?;

    let mut gdal_layer = match layer {
        Some(name) => dataset
            .layer_by_name(name)
            .map_err(|e| strategy.fail(format!("layer '{}': {}", name, e)))?,
        None => dataset
            .layers()
            .next()
            .ok_or_else(|| strategy.fail("dataset has no layers"))?,
    };

    read_layer(&mut gdal_layer, ARCHIVE_FORMAT, strategy.label()).map_err(|e| strategy.fail(e.to_string()))
}

fn read_declared_layers(
    path: &Path,
    layer: Option<&str>,
) -> std::result::Result<FeatureCollection, StrategyFailure> {
    let strategy = ArchiveStrategy::DeclaredLayers;
    let dataset = Dataset::open(vsizip_path(path)).map_err(|e| strategy.fail(e.to_string()))?;

    let declared: Vec<String> = get_layer_names(&dataset)
        .into_iter()
        .filter(|name| layer.map_or(true, |requested| requested == name))
        .collect();

    if declared.is_empty() {
        return Err(strategy.fail("archive declares no readable layers"));
    }

    let mut reasons = Vec::new();
    for name in &declared {
        let result = dataset
            .layer_by_name(name)
            .map_err(|e| e.to_string())
            .and_then(|mut gdal_layer| {
                read_layer(&mut gdal_layer, ARCHIVE_FORMAT, strategy.label()).map_err(|e| e.to_string())
            });

        match result {
            Ok(collection) => return Ok(collection),
            Err(reason) => reasons.push(format!("{}: {}", name, reason)),
        }
    }

    Err(strategy.fail(reasons.join(", ")))
}

/// Every `.shp` below `dir`, in sorted path order
fn find_shapefiles(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), "shp"))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

/// Shapefile components found in an archive, by entry name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInventory {
    pub entries: Vec<String>,
    pub shp: Vec<String>,
    pub shx: Vec<String>,
    pub dbf: Vec<String>,
    pub prj: Vec<String>,
    pub other: Vec<String>,
}

impl ArchiveInventory {
    /// Whether at least one of each required component is present
    pub fn has_required_components(&self) -> bool {
        self.missing_components().is_empty()
    }

    pub fn missing_components(&self) -> Vec<String> {
        [("shp", &self.shp), ("shx", &self.shx), ("dbf", &self.dbf)]
            .iter()
            .filter(|(_, found)| found.is_empty())
            .map(|(ext, _)| format!("Missing required .{} file", ext))
            .collect()
    }

    /// Entries that live inside a folder
    pub fn nested_entries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.contains('/'))
            .map(String::as_str)
            .collect()
    }

    pub fn is_nested(&self) -> bool {
        !self.nested_entries().is_empty()
    }
}

/// List an archive's entries and sort them into Shapefile components
pub fn inspect_archive(path: &Path) -> Result<ArchiveInventory> {
    let file = File::open(path)?;
    let archive = zip::ZipArchive::new(file).map_err(|e| PointselError::FormatError {
        format: ARCHIVE_FORMAT.to_string(),
        message: format!("Not a valid zip archive: {}", e),
    })?;

    let mut entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    entries.sort();

    let mut inventory = ArchiveInventory::default();
    for entry in &entries {
        let lower = entry.to_ascii_lowercase();
        let bucket = if lower.ends_with(".shp") {
            &mut inventory.shp
        } else if lower.ends_with(".shx") {
            &mut inventory.shx
        } else if lower.ends_with(".dbf") {
            &mut inventory.dbf
        } else if lower.ends_with(".prj") {
            &mut inventory.prj
        } else {
            &mut inventory.other
        };
        bucket.push(entry.clone());
    }
    inventory.entries = entries;

    Ok(inventory)
}
