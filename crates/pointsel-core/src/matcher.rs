//! Attribute filter selecting the target polygons by name

use crate::error::{PointselError, Result};
use crate::models::{FeatureCollection, SelectionQuery};

/// Filters a polygon collection on `column == value`
#[derive(Debug, Clone)]
pub struct NameMatcher {
    column: String,
    value: String,
    case_sensitive: bool,
}

impl NameMatcher {
    pub fn new(column: impl Into<String>, value: impl Into<String>, case_sensitive: bool) -> Self {
        let value = value.into();
        Self {
            column: column.into(),
            value: if case_sensitive { value } else { value.to_lowercase() },
            case_sensitive,
        }
    }

    pub fn from_query(query: &SelectionQuery) -> Self {
        Self::new(&query.name_column, &query.name_value, query.case_sensitive)
    }

    /// Keep the polygons whose name column equals the target value
    ///
    /// An empty result is returned as-is; deciding whether that is fatal is up to the caller.
    pub fn filter(&self, polygons: &FeatureCollection) -> Result<FeatureCollection> {
        if !polygons.has_column(&self.column) {
            return Err(PointselError::SchemaMismatch {
                column: self.column.clone(),
                available: polygons.schema.clone(),
            });
        }

        let matched = polygons.retain(|feature| self.matches(feature.property(&self.column)));
        tracing::debug!(
            "{} of {} polygons have {} = '{}'",
            matched.len(),
            polygons.len(),
            self.column,
            self.value
        );

        Ok(matched)
    }

    /// Test a single attribute value
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match value_as_text(value) {
            Some(text) if self.case_sensitive => text == self.value,
            Some(text) => text.to_lowercase() == self.value,
            None => false,
        }
    }
}

/// Filter `polygons` by name, failing with `NoMatch` when nothing matches
pub fn match_by_name(polygons: &FeatureCollection, query: &SelectionQuery) -> Result<FeatureCollection> {
    let matched = NameMatcher::from_query(query).filter(polygons)?;

    if matched.is_empty() {
        return Err(PointselError::NoMatch {
            column: query.name_column.clone(),
            value: query.name_value.clone(),
        });
    }

    Ok(matched)
}

/// Text rendering used for comparison; null has none
pub fn value_as_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
