use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::ingest::{RawSample, RawTrace};

/// JSON activity importer.
///
/// Accepts `{ "id", "name", "samples": [...] }` where each sample field may be
/// a number or a string. `points` is accepted in place of `samples`.
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    fn field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| object.get(*key))
            .find_map(Self::scalar_text)
    }

    fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn sample(value: &Value) -> RawSample {
        let Some(object) = value.as_object() else {
            return RawSample::default();
        };

        RawSample {
            time: Self::field(object, &["time", "timestamp"]),
            latitude: Self::field(object, &["latitude", "lat"]),
            longitude: Self::field(object, &["longitude", "lon", "lng"]),
            altitude: Self::field(object, &["altitude", "elevation", "ele"]),
            distance: Self::field(object, &["distance"]),
            heart_rate: Self::field(object, &["heart_rate", "heartRate", "hr"]),
        }
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn parse(&self, content: &str) -> Result<RawTrace> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| ImportExportError::ParseError {
                format: "JSON".to_string(),
                reason: e.to_string(),
            })?;

        let object = document
            .as_object()
            .ok_or_else(|| ImportExportError::ParseError {
                format: "JSON".to_string(),
                reason: "expected an object at the top level".to_string(),
            })?;

        let samples = object
            .get("samples")
            .or_else(|| object.get("points"))
            .and_then(Value::as_array)
            .ok_or_else(|| ImportExportError::MissingData {
                field: "samples".to_string(),
            })?
            .iter()
            .map(Self::sample)
            .collect();

        Ok(RawTrace {
            id: Self::field(object, &["id"]),
            name: Self::field(object, &["name"]),
            samples,
        })
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}
