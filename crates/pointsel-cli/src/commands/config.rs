//! Config command implementation

use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

pub fn execute(config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path)?;

    let values: BTreeMap<String, ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| {
            (key, ConfigEntry { value, source: format!("{:?}", source) })
        })
        .collect();

    if output.is_json() {
        output.result(ConfigOutput { values })?;
    } else {
        output.section("Configuration Values");

        #[derive(Tabled)]
        struct ConfigRow {
            #[tabled(rename = "Key")]
            key: String,
            #[tabled(rename = "Value")]
            value: String,
            #[tabled(rename = "Source")]
            source: String,
        }

        let rows: Vec<ConfigRow> = values
            .into_iter()
            .map(|(key, entry)| ConfigRow { key, value: entry.value, source: entry.source })
            .collect();

        output.table(rows);
    }

    Ok(())
}
