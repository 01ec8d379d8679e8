use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::ingest::{RawSample, RawTrace};

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "time",
            &["timestamp", "time", "datetime", "date_time", "recorded_at"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["heart_rate", "hr", "heartrate", "bpm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "altitude",
            &["elevation", "altitude", "alt", "elev", "ele", "height"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance",
            &["distance", "dist", "total_distance", "cumulative_distance"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "latitude",
            &["latitude", "lat", "position_lat"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "longitude",
            &["longitude", "lng", "lon", "position_long"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_error(reason: impl ToString) -> ImportExportError {
        ImportExportError::ParseError {
            format: "CSV".to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn parse(&self, content: &str) -> Result<RawTrace> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers().map_err(Self::parse_error)?.clone();

        // Map headers to standard names
        let header_mapping: HashMap<usize, String> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (i, self.normalize_column_name(header)))
            .collect();

        if !header_mapping.values().any(|name| name == "time") {
            return Err(ImportExportError::MissingData {
                field: "time column".to_string(),
            }
            .into());
        }

        let mut samples = Vec::new();

        for result in reader.records() {
            let record = result.map_err(Self::parse_error)?;
            let mut sample = RawSample::default();

            for (i, value) in record.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }

                let Some(column_name) = header_mapping.get(&i) else {
                    continue;
                };

                let slot = match column_name.as_str() {
                    "time" => &mut sample.time,
                    "latitude" => &mut sample.latitude,
                    "longitude" => &mut sample.longitude,
                    "altitude" => &mut sample.altitude,
                    "distance" => &mut sample.distance,
                    "heart_rate" => &mut sample.heart_rate,
                    _ => continue, // Ignore unknown columns
                };
                *slot = Some(value.to_string());
            }

            samples.push(sample);
        }

        Ok(RawTrace {
            id: None,
            name: None,
            samples,
        })
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
