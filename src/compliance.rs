//! Plan compliance scoring
//!
//! Compares a completed trace against the planned session it was meant to
//! fulfil. Only duration is matched for now; the intensity component is a
//! fixed score taken from [`EngineConstants::planned_intensity_score`].

use crate::config::EngineConstants;
use crate::models::{ComplianceRecord, Trace};
use crate::training_plan::PlanSession;

const DURATION_WEIGHT: f64 = 0.7;
const INTENSITY_WEIGHT: f64 = 0.3;

pub const EXCELLENT_NOTE: &str = "Excellent adherence to plan.";
pub const DEVIATION_NOTE: &str = "Session intensity or duration deviated.";
pub const FATIGUE_NOTE: &str = " High fatigue risk.";

pub struct ComplianceScorer;

impl ComplianceScorer {
    /// Duration component, 0-100. A zero target scores 0.
    pub fn duration_score(moving_time_secs: f64, target_minutes: u32) -> f64 {
        if target_minutes == 0 {
            return 0.0;
        }

        let target = target_minutes as f64;
        let diff = (moving_time_secs / 60.0 - target).abs();
        (100.0 - diff / target * 100.0).max(0.0)
    }

    /// Score the trace against a session. The fatigue note uses the trace's
    /// training effect, so enrich the trace first.
    pub fn evaluate(
        session: &PlanSession,
        trace: &Trace,
        constants: &EngineConstants,
    ) -> ComplianceRecord {
        let duration_score =
            Self::duration_score(trace.summary.moving_time, session.target_duration);
        let score = (duration_score * DURATION_WEIGHT
            + constants.planned_intensity_score * INTENSITY_WEIGHT)
            .round()
            .clamp(0.0, 100.0) as u8;

        let mut notes = if score > constants.excellent_threshold {
            EXCELLENT_NOTE.to_string()
        } else {
            DEVIATION_NOTE.to_string()
        };

        if trace
            .summary
            .training_effect
            .is_some_and(|te| te > constants.fatigue_threshold)
        {
            notes.push_str(FATIGUE_NOTE);
        }

        ComplianceRecord {
            session_id: Some(session.id.clone()),
            score,
            notes,
        }
    }
}
