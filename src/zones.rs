use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::models::Trace;

/// Breakpoints shared by both zone methods; zone N spans breakpoints N-1..N
const ZONE_BREAKPOINTS: [f64; 6] = [0.50, 0.60, 0.70, 0.80, 0.90, 1.00];

const ZONE_LABELS: [&str; 5] = ["Recovery", "Aerobic", "Tempo", "Threshold", "VO2 Max"];

/// Heart rate zone calculation methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneMethod {
    /// Percentage of maximum heart rate
    MaxHr,
    /// Percentage of heart rate reserve (Karvonen)
    Karvonen,
}

impl std::str::FromStr for ZoneMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "max_hr" | "maxhr" => Ok(ZoneMethod::MaxHr),
            "karvonen" | "hrr" => Ok(ZoneMethod::Karvonen),
            _ => Err(format!("Unknown zone method: {}", s)),
        }
    }
}

/// Athlete physiological parameters consumed by the zone model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteSettings {
    /// Maximum heart rate, bpm
    pub max_hr: u16,

    /// Resting heart rate, bpm
    pub resting_hr: u16,

    /// Zone calculation method
    pub method: ZoneMethod,
}

impl AthleteSettings {
    /// Check `max_hr > 0` and `resting_hr < max_hr`
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_hr == 0 {
            return Err(ConfigurationError::InvalidAthleteSettings {
                reason: "max HR must be positive".to_string(),
            });
        }
        if self.resting_hr >= self.max_hr {
            return Err(ConfigurationError::InvalidAthleteSettings {
                reason: format!(
                    "resting HR {} must be below max HR {}",
                    self.resting_hr, self.max_hr
                ),
            });
        }
        Ok(())
    }
}

/// A single heart rate zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZone {
    /// Zone number, 1-5
    pub zone: u8,
    pub label: String,
    /// Lower bound, bpm
    pub min: f64,
    /// Upper bound, bpm
    pub max: f64,
}

impl HeartRateZone {
    /// `[min, max + 1)`: the upper bound behaves as an inclusive integer bpm
    pub fn contains(&self, heart_rate: f64) -> bool {
        heart_rate >= self.min && heart_rate < self.max + 1.0
    }
}

/// Five contiguous heart rate zones for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZones {
    pub zones: Vec<HeartRateZone>,
    pub max_hr: u16,
}

impl HeartRateZones {
    /// Zone number for a heart rate, first match in zone order.
    /// Anything at or above max HR that no zone contains is zone 5.
    pub fn zone_for(&self, heart_rate: f64) -> Option<u8> {
        self.zones
            .iter()
            .find(|zone| zone.contains(heart_rate))
            .map(|zone| zone.zone)
            .or_else(|| (heart_rate >= self.max_hr as f64).then_some(5))
    }
}

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Calculate the five heart rate zones for an athlete
    ///
    /// - MAX_HR: boundary(p) = maxHR × p
    /// - KARVONEN: boundary(p) = restingHR + (maxHR − restingHR) × p
    ///
    /// with p ∈ {0.50, 0.60, 0.70, 0.80, 0.90, 1.00}.
    pub fn calculate_heart_rate_zones(
        settings: &AthleteSettings,
    ) -> Result<HeartRateZones, ConfigurationError> {
        settings.validate()?;

        let max_hr = settings.max_hr as f64;
        let resting_hr = settings.resting_hr as f64;
        let boundary = |p: f64| match settings.method {
            ZoneMethod::MaxHr => max_hr * p,
            ZoneMethod::Karvonen => resting_hr + (max_hr - resting_hr) * p,
        };

        let zones = (0..5)
            .map(|i| HeartRateZone {
                zone: i as u8 + 1,
                label: ZONE_LABELS[i].to_string(),
                min: boundary(ZONE_BREAKPOINTS[i]),
                max: if i == 4 {
                    max_hr
                } else {
                    boundary(ZONE_BREAKPOINTS[i + 1])
                },
            })
            .collect();

        Ok(HeartRateZones {
            zones,
            max_hr: settings.max_hr,
        })
    }
}

/// Time accumulated in one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTime {
    pub zone: u8,
    pub label: String,
    pub min: f64,
    pub max: f64,
    /// Seconds credited to the zone
    pub seconds: f64,
    /// Share of all classified seconds
    pub percentage: f64,
}

/// Time-in-zone distribution for a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDistribution {
    pub zones: Vec<ZoneTime>,
    pub total_seconds: f64,
}

impl ZoneDistribution {
    /// Seconds credited to a zone (1-5), 0 for unknown zones
    pub fn seconds_in(&self, zone: u8) -> f64 {
        self.zones
            .iter()
            .find(|z| z.zone == zone)
            .map(|z| z.seconds)
            .unwrap_or(0.0)
    }
}

/// Zone distribution analysis
pub struct ZoneAnalyzer;

impl ZoneAnalyzer {
    /// Classify the time between consecutive heart rate samples into zones.
    ///
    /// Only pairs where both samples carry heart rate and the gap is strictly
    /// between 0 and `max_gap` seconds are credited, at the pair's average HR.
    pub fn analyze_trace(trace: &Trace, zones: &HeartRateZones, max_gap: f64) -> ZoneDistribution {
        let mut seconds = [0.0f64; 5];

        for (prev, curr) in trace.pairs() {
            let (Some(hr1), Some(hr2)) = (prev.heart_rate, curr.heart_rate) else {
                continue;
            };

            let dt = curr.seconds_since(prev);
            if dt <= 0.0 || dt >= max_gap {
                continue;
            }

            let avg_hr = (hr1 as f64 + hr2 as f64) / 2.0;
            if let Some(zone) = zones.zone_for(avg_hr) {
                seconds[(zone - 1) as usize] += dt;
            }
        }

        Self::build_distribution(zones, seconds)
    }

    fn build_distribution(zones: &HeartRateZones, seconds: [f64; 5]) -> ZoneDistribution {
        let total_seconds: f64 = seconds.iter().sum();

        let zones = zones
            .zones
            .iter()
            .zip(seconds)
            .map(|(zone, secs)| ZoneTime {
                zone: zone.zone,
                label: zone.label.clone(),
                min: zone.min,
                max: zone.max,
                seconds: secs,
                percentage: if total_seconds > 0.0 {
                    secs / total_seconds * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        ZoneDistribution {
            zones,
            total_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Summary, TrackSample};
    use chrono::{Duration, TimeZone, Utc};

    fn settings(method: ZoneMethod) -> AthleteSettings {
        AthleteSettings {
            max_hr: 190,
            resting_hr: 55,
            method,
        }
    }

    fn hr_trace(samples: &[(i64, Option<u16>)]) -> Trace {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let points: Vec<TrackSample> = samples
            .iter()
            .map(|&(offset, heart_rate)| TrackSample {
                timestamp: start + Duration::seconds(offset),
                latitude: None,
                longitude: None,
                altitude: None,
                distance: None,
                heart_rate,
            })
            .collect();

        Trace {
            id: "zones".to_string(),
            name: "zones".to_string(),
            start_time: start,
            points,
            summary: Summary::default(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_karvonen_zones() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&settings(ZoneMethod::Karvonen)).unwrap();

        // HRR = 135
        assert_eq!(zones.zones.len(), 5);
        assert_close(zones.zones[0].min, 122.5);
        assert_close(zones.zones[1].min, 136.0);
        assert_close(zones.zones[1].max, 149.5);
        assert_close(zones.zones[4].min, 176.5);
        assert_eq!(zones.zones[4].max, 190.0);
    }

    #[test]
    fn test_max_hr_zones() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&settings(ZoneMethod::MaxHr)).unwrap();

        assert_close(zones.zones[0].min, 95.0);
        assert_close(zones.zones[0].max, 114.0);
        assert_close(zones.zones[2].min, 133.0);
        assert_close(zones.zones[3].max, 171.0);
        assert_eq!(zones.zones[4].max, 190.0);
        assert_eq!(zones.zones[2].label, "Tempo");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut invalid = settings(ZoneMethod::Karvonen);
        invalid.resting_hr = 190;
        assert!(ZoneCalculator::calculate_heart_rate_zones(&invalid).is_err());

        invalid.max_hr = 0;
        invalid.resting_hr = 0;
        assert!(ZoneCalculator::calculate_heart_rate_zones(&invalid).is_err());
    }

    #[test]
    fn test_zone_lookup_boundaries() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&settings(ZoneMethod::MaxHr)).unwrap();

        // Zone 1 is [95, 115) so 114.5 stays in zone 1 despite zone 2 starting at 114
        assert_eq!(zones.zone_for(114.5), Some(1));
        assert_eq!(zones.zone_for(115.0), Some(2));
        assert_eq!(zones.zone_for(190.5), Some(5));
        // Above the nominal ceiling overflows into zone 5
        assert_eq!(zones.zone_for(205.0), Some(5));
        // Below zone 1 is unclassified
        assert_eq!(zones.zone_for(80.0), None);
    }

    #[test]
    fn test_distribution_credits_pair_average() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&settings(ZoneMethod::MaxHr)).unwrap();
        let trace = hr_trace(&[
            (0, Some(140)),
            (10, Some(142)), // avg 141 -> zone 3, 10s
            (20, Some(170)), // avg 156 -> zone 4, 10s
            (25, None),
            (30, Some(150)),  // previous sample lacks HR
            (60, Some(150)),  // 30s gap is excluded
            (89, Some(180)),  // avg 165 -> zone 4, 29s
            (89, Some(185)),  // zero gap excluded
        ]);

        let distribution = ZoneAnalyzer::analyze_trace(&trace, &zones, 30.0);

        assert_close(distribution.seconds_in(3), 10.0);
        assert_close(distribution.seconds_in(4), 39.0);
        assert_close(distribution.total_seconds, 49.0);

        let percent_sum: f64 = distribution.zones.iter().map(|z| z.percentage).sum();
        assert!((percent_sum - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_distribution_without_heart_rate() {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&settings(ZoneMethod::Karvonen)).unwrap();
        let trace = hr_trace(&[(0, None), (5, None), (10, Some(150))]);

        let distribution = ZoneAnalyzer::analyze_trace(&trace, &zones, 30.0);

        assert_eq!(distribution.total_seconds, 0.0);
        assert!(distribution.zones.iter().all(|z| z.percentage == 0.0));
        assert_eq!(distribution.zones.len(), 5);
    }

    #[test]
    fn test_zone_method_parsing_and_serialization() {
        assert_eq!("karvonen".parse::<ZoneMethod>().unwrap(), ZoneMethod::Karvonen);
        assert_eq!("MAX_HR".parse::<ZoneMethod>().unwrap(), ZoneMethod::MaxHr);
        assert!("lthr".parse::<ZoneMethod>().is_err());

        let json = serde_json::to_string(&ZoneMethod::Karvonen).unwrap();
        assert_eq!(json, "\"KARVONEN\"");
        let json = serde_json::to_string(&ZoneMethod::MaxHr).unwrap();
        assert_eq!(json, "\"MAX_HR\"");
    }
}
