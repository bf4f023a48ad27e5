//! Extract command implementation

use crate::cli::ExtractArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::ExtractOutput;
use anyhow::{Context, Result};
use pointsel_core::config::{parse_delimiter, CliConfigOverrides};
use pointsel_core::models::{DatasetRef, SelectionQuery, SpatialPredicate};
use pointsel_pipeline::{SelectionPipeline, SelectionRequest};
use std::fs;
use std::path::Path;

pub fn execute(args: ExtractArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let overrides = CliConfigOverrides {
        predicate: args
            .predicate
            .as_deref()
            .map(str::parse::<SpatialPredicate>)
            .transpose()?,
        case_sensitive: args.case_sensitive.then_some(true),
        delimiter: args.delimiter.as_deref().map(parse_delimiter).transpose()?,
        temp_dir: args.temp_dir.clone(),
    };
    let config = load_config_with_overrides(config_path, overrides)?;

    let query = SelectionQuery::parse(
        &args.name_column,
        &args.name_value,
        config.case_sensitive.value,
        config.predicate.value.as_str(),
    )?;

    let request = SelectionRequest::new(
        DatasetRef::new(args.points).with_layer(args.points_layer),
        DatasetRef::new(args.polygons).with_layer(args.polygons_layer),
        query,
    );

    // NoMatch and every other failure return before anything is written
    let pipeline = SelectionPipeline::new(&config.pipeline_config());
    let report = pipeline.run(&request)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &report.csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            if output.is_json() {
                output.result(ExtractOutput::from_report(&report, Some(path.display().to_string())))?;
            } else {
                output.success(format!("Wrote {} rows to {}", report.row_count, path.display()));
                output.kv("Points read", report.points_read);
                output.kv("Polygons matched", report.polygons_matched);
                output.kv("Predicate", report.predicate);
                if report.stages.reprojected {
                    output.kv(
                        "Reprojected",
                        format!("{} -> {}", report.stages.points.crs, report.stages.polygons.crs),
                    );
                }
            }
        }
        None => {
            if output.is_json() {
                output.result(ExtractOutput::from_report(&report, None))?;
            } else {
                output.raw(&report.csv)?;
                tracing::info!("{} rows selected", report.row_count);
            }
        }
    }

    if report.is_empty() {
        output.warning(format!(
            "No point satisfies '{}' in the selected polygon; the table has a header only",
            report.predicate
        ));
    }

    Ok(())
}
