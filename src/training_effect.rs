//! Training Effect calculation module
//!
//! Scores the physiological impact of a session from its heart rate zone
//! distribution. Time in zones 3-5 is weighted into a load number which is
//! mapped piecewise onto a 1.0-5.0 scale.
//!
//! ## Training Effect Scale
//! - 1.0-2.0: Minor - Minor impact on fitness
//! - 2.0-3.0: Maintaining - Maintains current fitness level
//! - 3.0-4.0: Improving - Improves fitness level
//! - 4.0-5.0: Highly Improving - Significant fitness improvement
//! - 5.0: Overreaching - Risk of overtraining

use serde::{Deserialize, Serialize};

use crate::zones::ZoneDistribution;

/// Load weight per second in zones 3, 4 and 5
const ZONE_LOAD_WEIGHTS: [(u8, f64); 3] = [(3, 0.5), (4, 1.5), (5, 3.0)];

/// Highest reportable training effect
pub const MAX_TRAINING_EFFECT: f64 = 5.0;

/// Training Effect level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingEffectLevel {
    Minor,           // 1.0-2.0
    Maintaining,     // 2.0-3.0
    Improving,       // 3.0-4.0
    HighlyImproving, // 4.0-5.0
    Overreaching,    // 5.0
}

impl TrainingEffectLevel {
    /// Get level from numeric value
    pub fn from_value(value: f64) -> Self {
        match value {
            v if v < 2.0 => TrainingEffectLevel::Minor,
            v if v < 3.0 => TrainingEffectLevel::Maintaining,
            v if v < 4.0 => TrainingEffectLevel::Improving,
            v if v < 5.0 => TrainingEffectLevel::HighlyImproving,
            _ => TrainingEffectLevel::Overreaching,
        }
    }

    /// Get description of training effect level
    pub fn description(&self) -> &str {
        match self {
            TrainingEffectLevel::Minor => "Minor impact on fitness",
            TrainingEffectLevel::Maintaining => "Maintains current fitness level",
            TrainingEffectLevel::Improving => "Improves fitness level",
            TrainingEffectLevel::HighlyImproving => "Significant fitness improvement",
            TrainingEffectLevel::Overreaching => "Risk of overtraining - consider recovery",
        }
    }
}

/// Training Effect calculator
pub struct TrainingEffectAnalyzer;

impl TrainingEffectAnalyzer {
    /// Weighted load of the time spent in zones 3-5, in load units
    pub fn load_score(distribution: &ZoneDistribution) -> f64 {
        let weighted: f64 = ZONE_LOAD_WEIGHTS
            .iter()
            .map(|&(zone, weight)| distribution.seconds_in(zone) * weight)
            .sum();

        weighted / 60.0
    }

    /// Map a load score onto the 1.0-5.0 scale
    pub fn scale(score: f64) -> f64 {
        let raw = match score {
            s if s < 10.0 => 1.0 + s / 10.0,
            s if s < 30.0 => 2.0 + (s - 10.0) / 20.0,
            s if s < 60.0 => 3.0 + (s - 30.0) / 30.0,
            s if s < 120.0 => 4.0 + (s - 60.0) / 60.0,
            _ => MAX_TRAINING_EFFECT,
        };

        ((raw * 10.0).round() / 10.0).min(MAX_TRAINING_EFFECT)
    }

    /// Training effect from a zone distribution, rounded to one decimal
    pub fn calculate(distribution: &ZoneDistribution) -> f64 {
        Self::scale(Self::load_score(distribution))
    }
}
