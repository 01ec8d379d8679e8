use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One instant of recorded telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    /// Absolute timestamp, non-decreasing within a trace
    pub timestamp: DateTime<Utc>,

    /// Latitude in degrees
    pub latitude: Option<f64>,

    /// Longitude in degrees
    pub longitude: Option<f64>,

    /// Altitude in meters
    pub altitude: Option<f64>,

    /// Cumulative distance in meters
    pub distance: Option<f64>,

    /// Heart rate in beats per minute
    pub heart_rate: Option<u16>,
}

impl TrackSample {
    /// Seconds elapsed from `earlier` to this sample (negative if out of order)
    pub fn seconds_since(&self, earlier: &TrackSample) -> f64 {
        (self.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0
    }

    /// Distance covered since `earlier`, when both samples carry a distance
    pub fn meters_since(&self, earlier: &TrackSample) -> Option<f64> {
        match (earlier.distance, self.distance) {
            (Some(from), Some(to)) => Some(to - from),
            _ => None,
        }
    }
}

/// A lap split. Lap splitting is not performed, so summaries carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub index: u32,
    pub distance: f64,
    pub duration: f64,
}

/// Outcome of evaluating a completed trace against a planned session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Planned session this record was scored against
    pub session_id: Option<String>,

    /// Compliance score, 0-100
    pub score: u8,

    /// Free-text assessment
    pub notes: String,
}

/// Aggregate metrics derived from a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Total distance in meters: the last known cumulative distance, so a
    /// final sample that dropped its distance does not reset it to 0
    pub total_distance: f64,

    /// Seconds between first and last sample
    pub elapsed_time: f64,

    /// Seconds spent moving
    pub moving_time: f64,

    /// Average heart rate, 0 without heart rate data
    pub avg_heart_rate: u16,

    /// Maximum heart rate, 0 without heart rate data
    pub max_heart_rate: u16,

    /// Total ascent in meters
    pub total_ascent: f64,

    /// Total descent in meters
    pub total_descent: f64,

    /// Average moving pace in seconds per kilometer
    pub avg_pace: f64,

    /// Fastest filtered pace in seconds per kilometer
    pub max_pace: f64,

    /// Estimated calories
    pub calories: u32,

    /// Composite fitness score
    pub fitness_score: u32,

    /// Ratio of the reference threshold pace to the average pace
    pub intensity_factor: f64,

    /// Distance per heartbeat proxy
    pub aerobic_efficiency: f64,

    /// Moving time as a percentage of elapsed time
    pub movement_ratio: f64,

    /// Vertical ascent rate in meters per hour
    pub vam: f64,

    /// Placeholder, no variability computation is performed
    pub variability_index: f64,

    pub laps: Vec<Lap>,

    /// Grade-adjusted pace in seconds per kilometer
    pub grade_adjusted_pace: Option<f64>,

    /// Aerobic decoupling percentage
    pub decoupling: Option<f64>,

    /// Training effect score, 1.0-5.0
    pub training_effect: Option<f64>,

    /// Compliance against a planned session
    pub compliance: Option<ComplianceRecord>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            total_distance: 0.0,
            elapsed_time: 0.0,
            moving_time: 0.0,
            avg_heart_rate: 0,
            max_heart_rate: 0,
            total_ascent: 0.0,
            total_descent: 0.0,
            avg_pace: 0.0,
            max_pace: 0.0,
            calories: 0,
            fitness_score: 0,
            intensity_factor: 0.0,
            aerobic_efficiency: 0.0,
            movement_ratio: 0.0,
            vam: 0.0,
            variability_index: 0.0,
            laps: Vec::new(),
            grade_adjusted_pace: None,
            decoupling: None,
            training_effect: None,
            compliance: None,
        }
    }
}

/// A recorded activity: its samples in chronological order and their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Unique identifier for the trace
    pub id: String,

    /// Display name
    pub name: String,

    /// Timestamp of the first sample
    pub start_time: DateTime<Utc>,

    /// Samples in insertion (chronological) order, never empty
    pub points: Vec<TrackSample>,

    pub summary: Summary,
}

impl Trace {
    /// Number of samples carrying heart rate
    pub fn heart_rate_samples(&self) -> usize {
        self.points.iter().filter(|p| p.heart_rate.is_some()).count()
    }

    /// Consecutive sample pairs in source order
    pub fn pairs(&self) -> impl Iterator<Item = (&TrackSample, &TrackSample)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(offset_secs: i64, distance: Option<f64>) -> TrackSample {
        TrackSample {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
                + chrono::Duration::seconds(offset_secs),
            latitude: None,
            longitude: None,
            altitude: None,
            distance,
            heart_rate: None,
        }
    }

    #[test]
    fn test_sample_deltas() {
        let a = sample(0, Some(100.0));
        let b = sample(5, Some(115.0));

        assert_eq!(b.seconds_since(&a), 5.0);
        assert_eq!(b.meters_since(&a), Some(15.0));
        assert_eq!(a.seconds_since(&b), -5.0);

        let c = sample(10, None);
        assert_eq!(c.meters_since(&b), None);
    }

    #[test]
    fn test_summary_default_has_no_enrichment() {
        let summary = Summary::default();

        assert!(summary.laps.is_empty());
        assert_eq!(summary.grade_adjusted_pace, None);
        assert_eq!(summary.decoupling, None);
        assert_eq!(summary.training_effect, None);
        assert_eq!(summary.compliance, None);
    }

    #[test]
    fn test_trace_serialization() {
        let points = vec![sample(0, Some(0.0)), sample(1, Some(3.0))];
        let trace = Trace {
            id: "trace_1".to_string(),
            name: "Morning Run".to_string(),
            start_time: points[0].timestamp,
            points,
            summary: Summary::default(),
        };

        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"name\":\"Morning Run\""));

        let deserialized: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, trace);
        assert_eq!(deserialized.pairs().count(), 1);
    }
}
