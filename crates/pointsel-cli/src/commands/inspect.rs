//! Inspect command implementation

use crate::cli::InspectArgs;
use crate::config_loader::load_config;
use crate::errors::dataset_not_found;
use crate::output::OutputWriter;
use crate::output_types::{ArchiveInfo, InspectOutput, LayerInfo};
use anyhow::Result;
use pointsel_core::formats::archive::{inspect_archive, ArchiveInventory};
use pointsel_core::formats::extension_of;
use pointsel_core::LayerReader;
use std::path::Path;
use tabled::Tabled;

pub fn execute(args: InspectArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let path = args.path.as_path();
    if !path.exists() {
        return Err(dataset_not_found(&path.display().to_string()).into());
    }

    let config = load_config(config_path)?;
    let reader = LayerReader::new(&config.pipeline_config());
    let format = reader.format_name(path)?.to_string();

    // Archive layout comes first so it is shown even when the read below fails
    let archive = match extension_of(path).as_deref() {
        Some("zip") => {
            let inventory = inspect_archive(path)?;
            if !output.is_json() {
                show_archive(&inventory, output);
            }
            Some(inventory)
        }
        _ => None,
    };

    let validation = reader.validate(path)?;
    for warning in &validation.warnings {
        output.warning(warning);
    }
    for error in &validation.errors {
        output.warning(format!("Problem: {}", error));
    }

    let layers = reader.layer_names(path)?;
    let collection = reader.read_path(path, args.layer.as_deref())?;

    let layer = LayerInfo {
        name: collection.name.clone(),
        method: collection.format_metadata.extraction_method.clone(),
        feature_count: collection.len(),
        geometry_types: collection.geometry_types().iter().map(|t| t.to_string()).collect(),
        crs: collection.crs.as_ref().map(|c| c.label()),
        columns: collection.schema.clone(),
    };

    if output.is_json() {
        output.result(InspectOutput {
            path: path.display().to_string(),
            format,
            layers,
            archive: archive.as_ref().map(archive_info),
            layer,
            warnings: validation.warnings.iter().chain(&validation.errors).cloned().collect(),
        })?;
        return Ok(());
    }

    output.section("Dataset");
    output.kv("Path", path.display());
    output.kv("Format", &format);
    output.kv("Layers", layers.join(", "));

    output.section(format!("Layer '{}'", layer.name));
    if let Some(ref method) = layer.method {
        output.kv("Read with", method);
    }
    output.kv("Features", layer.feature_count);
    output.kv(
        "Geometry",
        if layer.geometry_types.is_empty() {
            "(none)".to_string()
        } else {
            layer.geometry_types.join(", ")
        },
    );
    output.kv("CRS", layer.crs.as_deref().unwrap_or("undefined"));
    output.kv("Columns", layer.columns.join(", "));

    if layer.crs.is_none() {
        output.warning("No CRS is defined; selections using this layer will fail");
    }

    Ok(())
}

fn archive_info(inventory: &ArchiveInventory) -> ArchiveInfo {
    ArchiveInfo {
        entries: inventory.entries.clone(),
        shp: inventory.shp.len(),
        shx: inventory.shx.len(),
        dbf: inventory.dbf.len(),
        prj: inventory.prj.len(),
        nested: inventory.is_nested(),
        missing: inventory.missing_components(),
    }
}

fn show_archive(inventory: &ArchiveInventory, output: &OutputWriter) {
    output.section("Archive Contents");

    #[derive(Tabled)]
    struct ComponentRow {
        #[tabled(rename = "Component")]
        component: &'static str,
        #[tabled(rename = "Files")]
        count: usize,
    }

    output.table(vec![
        ComponentRow { component: ".shp", count: inventory.shp.len() },
        ComponentRow { component: ".shx", count: inventory.shx.len() },
        ComponentRow { component: ".dbf", count: inventory.dbf.len() },
        ComponentRow { component: ".prj", count: inventory.prj.len() },
        ComponentRow { component: "other", count: inventory.other.len() },
    ]);

    // Missing components and nesting are reported by validation
    if inventory.is_nested() {
        output.kv("Nested entries", inventory.nested_entries().join(", "));
    }
}
