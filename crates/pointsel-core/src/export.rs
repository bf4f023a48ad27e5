//! Delimited-text export of attribute tables

use std::io::Write;

use crate::error::{PointselError, Result};
use crate::models::FeatureCollection;

/// Serializes feature attributes, without geometry, as delimited text
#[derive(Debug, Clone, Copy)]
pub struct TabularExporter {
    delimiter: u8,
}

impl TabularExporter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Render the collection into an in-memory UTF-8 buffer
    pub fn export(&self, collection: &FeatureCollection) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(collection, &mut buffer)?;
        Ok(buffer)
    }

    /// Write the header and one row per feature; returns the row count
    pub fn write_to<W: Write>(&self, collection: &FeatureCollection, writer: W) -> Result<usize> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        csv_writer.write_record(&collection.schema).map_err(export_error)?;

        for feature in &collection.features {
            let row = collection
                .schema
                .iter()
                .map(|column| cell_text(feature.property(column)));
            csv_writer.write_record(row).map_err(export_error)?;
        }

        csv_writer.flush()?;
        Ok(collection.len())
    }
}

impl Default for TabularExporter {
    fn default() -> Self {
        Self::new(b',')
    }
}

fn export_error(err: csv::Error) -> PointselError {
    PointselError::Export(err.to_string())
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
