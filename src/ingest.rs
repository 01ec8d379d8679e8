//! Trace ingestion
//!
//! Turns decoded per-sample records into a [`Trace`] and accumulates the base
//! [`Summary`] in a single pass over consecutive sample pairs. Input order is
//! trusted; samples are never re-sorted.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EngineConstants;
use crate::error::IngestError;
use crate::models::{Summary, Trace, TrackSample};

/// One decoded record as supplied by an input adapter.
///
/// Every field is optional text; numeric parsing happens during ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub time: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub distance: Option<String>,
    /// Beats per minute. Fractional readings (some exporters average HR)
    /// are rounded to the nearest whole bpm.
    pub heart_rate: Option<String>,
}

/// A decoded activity payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    pub id: Option<String>,
    pub name: Option<String>,
    pub samples: Vec<RawSample>,
}

impl RawSample {
    /// Convert to a track sample; `None` when the timestamp is unusable.
    /// Other fields that fail to parse are treated as absent.
    pub fn to_sample(&self) -> Option<TrackSample> {
        let timestamp = self.time.as_deref().and_then(parse_timestamp)?;

        Some(TrackSample {
            timestamp,
            latitude: self.latitude.as_deref().and_then(parse_number),
            longitude: self.longitude.as_deref().and_then(parse_number),
            altitude: self.altitude.as_deref().and_then(parse_number),
            distance: self.distance.as_deref().and_then(parse_number),
            heart_rate: self.heart_rate.as_deref().and_then(parse_heart_rate),
        })
    }
}

/// Parse an absolute timestamp: RFC 3339, common naive formats (UTC), or a
/// numeric epoch in seconds or milliseconds
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for format in &formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    parse_epoch(value)
}

/// Epoch magnitudes above this are milliseconds (1e11 s is the year 5138)
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Epoch seconds (optionally fractional) or epoch milliseconds
fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(int) = value.parse::<i64>() {
        return if (int as f64).abs() > EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(int)
        } else {
            DateTime::from_timestamp(int, 0)
        };
    }

    let number = parse_number(value)?;
    let millis = if number.abs() > EPOCH_MILLIS_THRESHOLD {
        number
    } else {
        number * 1000.0
    };
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_heart_rate(value: &str) -> Option<u16> {
    parse_number(value)
        .map(f64::round)
        .filter(|hr| *hr > 0.0 && *hr <= u16::MAX as f64)
        .map(|hr| hr as u16)
}

/// Streaming accumulator for the base summary.
///
/// Samples are pushed in source order; each push looks only at the previous
/// sample and running totals.
#[derive(Debug, Clone)]
pub struct SummaryAccumulator<'a> {
    constants: &'a EngineConstants,
    first: Option<TrackSample>,
    previous: Option<TrackSample>,
    last_altitude: Option<f64>,
    last_distance: Option<f64>,
    total_ascent: f64,
    total_descent: f64,
    moving_time: f64,
    fastest_pace: Option<f64>,
    hr_sum: f64,
    hr_count: u32,
    hr_max: u16,
}

impl<'a> SummaryAccumulator<'a> {
    pub fn new(constants: &'a EngineConstants) -> Self {
        Self {
            constants,
            first: None,
            previous: None,
            last_altitude: None,
            last_distance: None,
            total_ascent: 0.0,
            total_descent: 0.0,
            moving_time: 0.0,
            fastest_pace: None,
            hr_sum: 0.0,
            hr_count: 0,
            hr_max: 0,
        }
    }

    /// Fold the next sample into the running totals
    pub fn push(&mut self, sample: &TrackSample) {
        if self.first.is_none() {
            self.first = Some(*sample);
        }

        // Altitude dropouts keep the last known altitude
        if let Some(altitude) = sample.altitude {
            if let Some(last) = self.last_altitude {
                let delta = altitude - last;
                if delta > 0.0 {
                    self.total_ascent += delta;
                } else {
                    self.total_descent += -delta;
                }
            }
            self.last_altitude = Some(altitude);
        }

        if let Some(distance) = sample.distance {
            self.last_distance = Some(distance);
        }

        if let Some(hr) = sample.heart_rate {
            self.hr_sum += hr as f64;
            self.hr_count += 1;
            self.hr_max = self.hr_max.max(hr);
        }

        if let Some(previous) = self.previous {
            self.accumulate_pair(&previous, sample);
        }
        self.previous = Some(*sample);
    }

    fn accumulate_pair(&mut self, previous: &TrackSample, current: &TrackSample) {
        let dt = current.seconds_since(previous);
        if dt <= 0.0 || dt > self.constants.moving_max_gap {
            return;
        }

        let Some(meters) = current.meters_since(previous) else {
            return;
        };

        if meters / dt > self.constants.moving_min_speed {
            self.moving_time += dt;
        }

        if meters > 0.0 {
            let pace = dt / (meters / 1000.0);
            if pace > self.constants.pace_filter_min && pace < self.constants.pace_filter_max {
                self.fastest_pace = Some(self.fastest_pace.map_or(pace, |best| best.min(pace)));
            }
        }
    }

    /// Derive the summary from the accumulated totals
    pub fn finish(&self) -> Summary {
        let constants = self.constants;

        let total_distance = self.last_distance.unwrap_or(0.0);
        let elapsed_time = match (self.first, self.previous) {
            (Some(first), Some(last)) => last.seconds_since(&first),
            _ => 0.0,
        };
        let moving_time = self.moving_time;

        let avg_heart_rate = if self.hr_count > 0 {
            (self.hr_sum / self.hr_count as f64).round() as u16
        } else {
            0
        };

        let km = total_distance / 1000.0;
        let avg_pace = if total_distance > 0.0 {
            moving_time / km
        } else {
            0.0
        };

        let aerobic_efficiency = if self.hr_sum > 0.0 {
            total_distance / self.hr_sum * 100.0
        } else {
            0.0
        };

        let movement_ratio = if elapsed_time > 0.0 {
            moving_time / elapsed_time * 100.0
        } else {
            0.0
        };

        let vam = if moving_time > 0.0 {
            self.total_ascent / moving_time * 3600.0
        } else {
            0.0
        };

        let intensity_factor = if avg_pace > 0.0 {
            constants.threshold_pace / avg_pace
        } else {
            0.0
        };

        let calories = (km * constants.calories_per_km).round().max(0.0) as u32;
        let fitness_score = (avg_heart_rate as f64 * (moving_time / 3600.0) / 10.0).round() as u32;

        Summary {
            total_distance,
            elapsed_time,
            moving_time,
            avg_heart_rate,
            max_heart_rate: self.hr_max,
            total_ascent: self.total_ascent,
            total_descent: self.total_descent,
            avg_pace,
            max_pace: self.fastest_pace.unwrap_or(0.0),
            calories,
            fitness_score,
            intensity_factor,
            aerobic_efficiency,
            movement_ratio,
            vam,
            variability_index: constants.variability_index,
            laps: Vec::new(),
            ..Summary::default()
        }
    }
}

/// Builds traces from decoded payloads
#[derive(Debug, Clone)]
pub struct TraceIngestor {
    constants: EngineConstants,
    default_name: String,
}

impl TraceIngestor {
    pub fn new(constants: EngineConstants) -> Self {
        Self {
            constants,
            default_name: "Untitled Activity".to_string(),
        }
    }

    /// Name used when the payload carries none
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Parse samples in file order and build the trace with its base summary
    #[instrument(skip(self, raw), fields(samples = raw.samples.len()))]
    pub fn ingest(&self, raw: RawTrace) -> Result<Trace, IngestError> {
        let mut accumulator = SummaryAccumulator::new(&self.constants);
        let mut points = Vec::with_capacity(raw.samples.len());
        let mut skipped = 0usize;

        for record in &raw.samples {
            match record.to_sample() {
                Some(sample) => {
                    accumulator.push(&sample);
                    points.push(sample);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "Skipped records without a usable timestamp");
        }

        let name = raw.name.unwrap_or_else(|| self.default_name.clone());

        let Some(first) = points.first() else {
            return Err(IngestError::NoValidSamples { source_name: name });
        };
        let start_time = first.timestamp;

        let summary = accumulator.finish();
        let id = raw
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        debug!(
            points = points.len(),
            distance = summary.total_distance,
            moving_time = summary.moving_time,
            "Trace ingested"
        );

        Ok(Trace {
            id,
            name,
            start_time,
            points,
            summary,
        })
    }
}

impl Default for TraceIngestor {
    fn default() -> Self {
        Self::new(EngineConstants::default())
    }
}
