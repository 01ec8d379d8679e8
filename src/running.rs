//! Running metrics derived from a trace
//!
//! Grade-adjusted pace between samples and over a whole trace, plus aerobic
//! decoupling between the two halves of an activity. All functions are pure.

use tracing::debug;

use crate::config::EngineConstants;
use crate::error::CalculationError;
use crate::models::{Trace, TrackSample};

/// Grade Adjusted Pace (GAP)
pub struct GradeAdjustedPace;

impl GradeAdjustedPace {
    /// Grade between two samples; missing altitude on either side counts as flat
    fn gradient(p1: &TrackSample, p2: &TrackSample, distance: f64) -> f64 {
        match (p1.altitude, p2.altitude) {
            (Some(a1), Some(a2)) if distance > 0.0 => (a2 - a1) / distance,
            _ => 0.0,
        }
    }

    /// Empirical adjustment curve. The squared term dominates on steep
    /// grades, so steep descents are penalized as well.
    pub fn adjustment_factor(grade: f64) -> f64 {
        1.0 + 3.0 * grade + 10.0 * grade * grade
    }

    /// Grade-adjusted pace in seconds per kilometer between two samples.
    ///
    /// Returns 0 when the distance or time delta is not positive, or when
    /// either sample lacks a distance.
    pub fn between(p1: &TrackSample, p2: &TrackSample) -> f64 {
        let dt = p2.seconds_since(p1);
        let Some(dd) = p2.meters_since(p1) else {
            return 0.0;
        };

        if dd <= 0.0 || dt <= 0.0 {
            return 0.0;
        }

        let factor = Self::adjustment_factor(Self::gradient(p1, p2, dd));
        if factor <= 0.0 {
            return 0.0;
        }

        (dt / (dd / 1000.0)) / factor
    }

    /// Whole-trace GAP: grade-adjusted time over the pairs that count as
    /// moving, divided by their distance in kilometers
    pub fn for_trace(trace: &Trace, constants: &EngineConstants) -> Option<f64> {
        let mut adjusted_time = 0.0;
        let mut distance = 0.0;

        for (prev, curr) in trace.pairs() {
            let dt = curr.seconds_since(prev);
            if dt <= 0.0 || dt > constants.moving_max_gap {
                continue;
            }

            let Some(dd) = curr.meters_since(prev) else {
                continue;
            };
            if dd <= 0.0 || dd / dt <= constants.moving_min_speed {
                continue;
            }

            let factor = Self::adjustment_factor(Self::gradient(prev, curr, dd));
            if factor <= 0.0 {
                continue;
            }

            adjusted_time += dt / factor;
            distance += dd;
        }

        if distance > 0.0 {
            Some(adjusted_time / (distance / 1000.0))
        } else {
            None
        }
    }
}

/// Totals for one half of a decoupling split
#[derive(Debug, Default, Clone, Copy)]
struct HalfTotals {
    hr_sum: f64,
    distance: f64,
    time: f64,
    count: u32,
}

impl HalfTotals {
    fn accumulate(points: &[TrackSample]) -> Self {
        let mut totals = HalfTotals::default();

        for pair in points.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let Some(hr) = curr.heart_rate else {
                continue;
            };
            let Some(dd) = curr.meters_since(prev) else {
                continue;
            };

            totals.hr_sum += hr as f64;
            totals.distance += dd;
            totals.time += curr.seconds_since(prev);
            totals.count += 1;
        }

        totals
    }

    /// Speed per beat: `(1 / pace_min_per_km) / avg_hr`
    fn efficiency(&self) -> Option<f64> {
        if self.count == 0 || self.distance <= 0.0 || self.time <= 0.0 || self.hr_sum <= 0.0 {
            return None;
        }

        let avg_hr = self.hr_sum / self.count as f64;
        let pace_min_per_km = (self.time / 60.0) / (self.distance / 1000.0);

        Some((1.0 / pace_min_per_km) / avg_hr)
    }
}

/// Aerobic decoupling between the first and second half of a trace
pub struct DecouplingAnalyzer;

impl DecouplingAnalyzer {
    /// Decoupling percentage, or the reason it cannot be computed.
    ///
    /// Positive values mean the second half was less efficient.
    pub fn try_calculate(trace: &Trace, min_samples: usize) -> Result<f64, CalculationError> {
        let n = trace.points.len();
        if n < min_samples {
            return Err(not_computable(format!(
                "{} samples, at least {} required",
                n, min_samples
            )));
        }

        let (first, second) = trace.points.split_at(n / 2);

        let eff1 = HalfTotals::accumulate(first)
            .efficiency()
            .ok_or_else(|| not_computable("first half has no usable heart rate and distance"))?;
        let eff2 = HalfTotals::accumulate(second)
            .efficiency()
            .ok_or_else(|| not_computable("second half has no usable heart rate and distance"))?;

        Ok((eff1 - eff2) / eff1 * 100.0)
    }

    /// Decoupling percentage, `None` when not computable
    pub fn calculate(trace: &Trace, min_samples: usize) -> Option<f64> {
        match Self::try_calculate(trace, min_samples) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(trace_id = %trace.id, error = %e, "Decoupling skipped");
                None
            }
        }
    }
}

fn not_computable(reason: impl Into<String>) -> CalculationError {
    CalculationError::NotComputable {
        metric: "decoupling".to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summary;
    use chrono::{Duration, TimeZone, Utc};

    fn point(secs: i64, distance: Option<f64>, altitude: Option<f64>, hr: Option<u16>) -> TrackSample {
        TrackSample {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap() + Duration::seconds(secs),
            latitude: None,
            longitude: None,
            altitude,
            distance,
            heart_rate: hr,
        }
    }

    fn trace(points: Vec<TrackSample>) -> Trace {
        Trace {
            id: "run".to_string(),
            name: "Run".to_string(),
            start_time: points[0].timestamp,
            points,
            summary: Summary::default(),
        }
    }

    /// Steady run, 3 m/s for the first half and `second_speed` after
    fn steady_run(samples: usize, second_speed: f64) -> Trace {
        let mut distance = 0.0;
        let points = (0..samples)
            .map(|i| {
                if i > 0 {
                    distance += if i <= samples / 2 { 3.0 } else { second_speed };
                }
                point(i as i64, Some(distance), None, Some(150))
            })
            .collect();
        trace(points)
    }

    #[test]
    fn test_gap_flat() {
        let p1 = point(0, Some(0.0), Some(100.0), None);
        let p2 = point(300, Some(1000.0), Some(100.0), None);

        assert_eq!(GradeAdjustedPace::between(&p1, &p2), 300.0);
    }

    #[test]
    fn test_gap_uphill_and_steep_downhill() {
        // 10% grade: factor 1 + 0.3 + 0.1 = 1.4
        let p1 = point(0, Some(0.0), Some(100.0), None);
        let p2 = point(70, Some(100.0), Some(110.0), None);
        assert!((GradeAdjustedPace::between(&p1, &p2) - 500.0).abs() < 1e-9);

        // -30% grade: factor 1 - 0.9 + 0.9 = 1.0
        let p3 = point(70, Some(100.0), Some(70.0), None);
        assert!((GradeAdjustedPace::between(&p1, &p3) - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_missing_altitude_is_flat() {
        let p1 = point(0, Some(0.0), None, None);
        let p2 = point(30, Some(100.0), Some(150.0), None);

        assert_eq!(GradeAdjustedPace::between(&p1, &p2), 300.0);
    }

    #[test]
    fn test_gap_guards() {
        let p1 = point(10, Some(50.0), Some(100.0), None);

        assert_eq!(GradeAdjustedPace::between(&p1, &point(20, Some(50.0), None, None)), 0.0);
        assert_eq!(GradeAdjustedPace::between(&p1, &point(20, Some(40.0), None, None)), 0.0);
        assert_eq!(GradeAdjustedPace::between(&p1, &point(10, Some(80.0), None, None)), 0.0);
        assert_eq!(GradeAdjustedPace::between(&p1, &point(5, Some(80.0), None, None)), 0.0);
        assert_eq!(GradeAdjustedPace::between(&p1, &point(20, None, None, None)), 0.0);
    }

    #[test]
    fn test_trace_gap_skips_non_moving_pairs() {
        let constants = EngineConstants::default();
        let run = trace(vec![
            point(0, Some(0.0), Some(100.0), None),
            point(10, Some(30.0), Some(100.0), None),
            point(40, Some(120.0), Some(100.0), None), // 30 s gap
            point(50, Some(121.0), Some(100.0), None), // standing
            point(60, Some(151.0), Some(100.0), None),
        ]);

        let gap = GradeAdjustedPace::for_trace(&run, &constants).unwrap();
        // 20 s over 60 m on the flat
        assert!((gap - 20.0 / 0.06).abs() < 1e-9);

        let idle = trace(vec![point(0, Some(0.0), None, None), point(5, Some(0.0), None, None)]);
        assert_eq!(GradeAdjustedPace::for_trace(&idle, &constants), None);
    }

    #[test]
    fn test_trace_gap_moving_gate_edges() {
        let constants = EngineConstants::default();
        let run = trace(vec![
            point(0, Some(0.0), None, None),
            point(15, Some(60.0), None, None),  // exactly 15 s, 4 m/s
            point(31, Some(124.0), None, None), // 16 s gap
            point(41, Some(129.0), None, None), // exactly 0.5 m/s
        ]);

        // Only the first pair counts: 15 s over 0.06 km
        let gap = GradeAdjustedPace::for_trace(&run, &constants).unwrap();
        assert!((gap - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_decoupling_sample_threshold() {
        let short = steady_run(99, 3.0);
        assert!(matches!(
            DecouplingAnalyzer::try_calculate(&short, 100),
            Err(CalculationError::NotComputable { .. })
        ));
        assert_eq!(DecouplingAnalyzer::calculate(&short, 100), None);

        let exact = steady_run(100, 3.0);
        let value = DecouplingAnalyzer::calculate(&exact, 100).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn test_decoupling_positive_when_second_half_slows() {
        let run = steady_run(200, 2.7);
        let value = DecouplingAnalyzer::calculate(&run, 100).unwrap();

        // Same heart rate, 10% slower
        assert!((value - 10.0).abs() < 1e-9, "{}", value);
    }

    #[test]
    fn test_decoupling_requires_heart_rate_in_both_halves() {
        let mut run = steady_run(120, 3.0);
        for p in run.points.iter_mut().skip(60) {
            p.heart_rate = None;
        }

        let result = DecouplingAnalyzer::try_calculate(&run, 100);
        match result {
            Err(CalculationError::NotComputable { metric, reason }) => {
                assert_eq!(metric, "decoupling");
                assert!(reason.contains("second half"));
            }
            other => panic!("expected NotComputable, got {:?}", other),
        }
    }

    #[test]
    fn test_decoupling_is_idempotent() {
        let run = steady_run(150, 2.9);
        assert_eq!(
            DecouplingAnalyzer::calculate(&run, 100),
            DecouplingAnalyzer::calculate(&run, 100)
        );
    }
}
