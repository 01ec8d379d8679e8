use quick_xml::de::from_str;
use serde::Deserialize;
use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::ingest::{RawSample, RawTrace};

/// TCX (Training Center XML) importer
pub struct TcxImporter;

impl TcxImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TcxImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for TcxImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "tcx")
    }

    fn parse(&self, content: &str) -> Result<RawTrace> {
        let tcx: TrainingCenterDatabase =
            from_str(content).map_err(|e| ImportExportError::ParseError {
                format: "TCX".to_string(),
                reason: e.to_string(),
            })?;

        // Only the first activity of a multi-activity file is analyzed
        let activity = tcx
            .activities
            .and_then(|activities| activities.activity.into_iter().next())
            .ok_or_else(|| ImportExportError::MissingData {
                field: "Activity".to_string(),
            })?;

        let samples = activity
            .lap
            .into_iter()
            .flat_map(|lap| lap.track)
            .flat_map(|track| track.trackpoint)
            .map(|point| {
                let (latitude, longitude) = match point.position {
                    Some(position) => (position.latitude_degrees, position.longitude_degrees),
                    None => (None, None),
                };

                RawSample {
                    time: point.time,
                    latitude,
                    longitude,
                    altitude: point.altitude_meters,
                    distance: point.distance_meters,
                    heart_rate: point.heart_rate_bpm.and_then(|hr| hr.value),
                }
            })
            .collect();

        Ok(RawTrace {
            id: activity.id,
            name: activity.notes.filter(|notes| !notes.trim().is_empty()),
            samples,
        })
    }

    fn format_name(&self) -> &'static str {
        "TCX"
    }
}

// TCX XML structures. Values stay textual; ingestion parses them.

#[derive(Debug, Deserialize)]
#[serde(rename = "TrainingCenterDatabase")]
struct TrainingCenterDatabase {
    #[serde(rename = "Activities")]
    activities: Option<Activities>,
}

#[derive(Debug, Deserialize)]
struct Activities {
    #[serde(rename = "Activity", default)]
    activity: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Notes")]
    notes: Option<String>,
    #[serde(rename = "Lap", default)]
    lap: Vec<Lap>,
}

#[derive(Debug, Deserialize)]
struct Lap {
    #[serde(rename = "Track", default)]
    track: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "Trackpoint", default)]
    trackpoint: Vec<Trackpoint>,
}

#[derive(Debug, Deserialize)]
struct Trackpoint {
    #[serde(rename = "Time")]
    time: Option<String>,
    #[serde(rename = "Position")]
    position: Option<Position>,
    #[serde(rename = "AltitudeMeters")]
    altitude_meters: Option<String>,
    #[serde(rename = "DistanceMeters")]
    distance_meters: Option<String>,
    #[serde(rename = "HeartRateBpm")]
    heart_rate_bpm: Option<HeartRateBpm>,
}

#[derive(Debug, Deserialize)]
struct Position {
    #[serde(rename = "LatitudeDegrees")]
    latitude_degrees: Option<String>,
    #[serde(rename = "LongitudeDegrees")]
    longitude_degrees: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeartRateBpm {
    #[serde(rename = "Value")]
    value: Option<String>,
}
