use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pointsel - select point features inside a named polygon
#[derive(Parser, Debug)]
#[command(name = "pointsel")]
#[command(about = "Select point features inside a named polygon and export them to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./pointsel.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select the points inside a named polygon and export their attributes
    Extract(ExtractArgs),

    /// Diagnose a dataset: layers, features, CRS, columns and archive layout
    Inspect(InspectArgs),

    /// Show effective configuration values and where they come from
    Config,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Point dataset (.zip, .gpkg, .geojson, .json or .shp)
    #[arg(long, value_name = "PATH")]
    pub points: PathBuf,

    /// Layer to read from the point dataset (defaults to the first layer)
    #[arg(long, value_name = "LAYER")]
    pub points_layer: Option<String>,

    /// Polygon dataset (.zip, .gpkg, .geojson, .json or .shp)
    #[arg(long, value_name = "PATH")]
    pub polygons: PathBuf,

    /// Layer to read from the polygon dataset (defaults to the first layer)
    #[arg(long, value_name = "LAYER")]
    pub polygons_layer: Option<String>,

    /// Polygon attribute holding the name to match
    #[arg(long, value_name = "COLUMN")]
    pub name_column: String,

    /// Name of the polygon to select points in
    #[arg(long, value_name = "VALUE")]
    pub name_value: String,

    /// Spatial predicate (within or intersects)
    #[arg(long, value_name = "PREDICATE")]
    pub predicate: Option<String>,

    /// Match the name exactly instead of ignoring case
    #[arg(long)]
    pub case_sensitive: bool,

    /// Field delimiter for the exported table (a single character, or "tab")
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Directory for temporary extraction
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Write the table to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Dataset to inspect
    pub path: PathBuf,

    /// Layer to read (defaults to the first layer)
    #[arg(long, value_name = "LAYER")]
    pub layer: Option<String>,
}
