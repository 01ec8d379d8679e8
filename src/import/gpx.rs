use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::ingest::{RawSample, RawTrace};

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// GPX importer for GPS track data.
///
/// GPX carries no distance channel, so cumulative distance is integrated from
/// consecutive positions. Heart rate extensions are not exposed by the parser.
pub struct GpxImporter;

impl GpxImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GpxImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Great-circle distance between two (lat, lon) positions in degrees
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

impl ImportFormat for GpxImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "gpx")
    }

    fn parse(&self, content: &str) -> Result<RawTrace> {
        let gpx_data: gpx::Gpx =
            gpx::read(content.as_bytes()).map_err(|e| ImportExportError::ParseError {
                format: "GPX".to_string(),
                reason: e.to_string(),
            })?;

        let name = gpx_data
            .tracks
            .first()
            .and_then(|track| track.name.clone())
            .or_else(|| gpx_data.metadata.as_ref().and_then(|m| m.name.clone()));

        let mut samples = Vec::new();
        let mut previous: Option<(f64, f64)> = None;
        let mut cumulative = 0.0_f64;

        for track in &gpx_data.tracks {
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    let position = (point.y(), point.x());

                    if let Some(last) = previous {
                        cumulative += haversine_distance(last, position);
                    }
                    previous = Some(position);

                    samples.push(RawSample {
                        time: waypoint.time.as_ref().and_then(|time| time.format().ok()),
                        latitude: Some(position.0.to_string()),
                        longitude: Some(position.1.to_string()),
                        altitude: waypoint.elevation.map(|ele| ele.to_string()),
                        distance: Some(cumulative.to_string()),
                        heart_rate: None,
                    });
                }
            }
        }

        if samples.is_empty() {
            return Err(ImportExportError::MissingData {
                field: "track points".to_string(),
            }
            .into());
        }

        Ok(RawTrace {
            id: None,
            name,
            samples,
        })
    }

    fn format_name(&self) -> &'static str {
        "GPX"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Hill Repeats</name>
    <trkseg>
      <trkpt lat="47.0" lon="8.0">
        <ele>400.0</ele>
        <time>2024-06-01T06:00:00Z</time>
      </trkpt>
      <trkpt lat="47.001" lon="8.0">
        <ele>405.0</ele>
        <time>2024-06-01T06:00:30Z</time>
      </trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_haversine_distance() {
        assert_eq!(haversine_distance((47.0, 8.0), (47.0, 8.0)), 0.0);

        // 0.001 degrees of latitude is roughly 111 m
        let d = haversine_distance((47.0, 8.0), (47.001, 8.0));
        assert!((d - 111.19).abs() < 0.1, "{}", d);
    }

    #[test]
    fn test_parse_gpx() {
        let raw = GpxImporter::new().parse(SAMPLE_GPX).unwrap();

        assert_eq!(raw.name.as_deref(), Some("Hill Repeats"));
        assert_eq!(raw.samples.len(), 2);
        assert_eq!(raw.samples[0].distance.as_deref(), Some("0"));
        assert_eq!(raw.samples[0].altitude.as_deref(), Some("400"));
        assert!(raw.samples[0].time.is_some());
        assert_eq!(raw.samples[1].heart_rate, None);

        let distance: f64 = raw.samples[1].distance.as_deref().unwrap().parse().unwrap();
        assert!((distance - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_empty_gpx() {
        let content = r#"<?xml version="1.0"?><gpx version="1.1" creator="test"></gpx>"#;
        assert!(GpxImporter::new().parse(content).is_err());
    }
}
