//! Activity analysis pipeline
//!
//! Ingests a decoded trace, classifies heart rate zones and fills the
//! optional summary fields. Enrichment is a pure function of the trace and
//! its zone distribution, so re-running it leaves the summary unchanged.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, span, Level};

use crate::compliance::ComplianceScorer;
use crate::config::{AppConfig, EngineConstants};
use crate::error::Result;
use crate::import::ImportManager;
use crate::ingest::{RawTrace, TraceIngestor};
use crate::models::{ComplianceRecord, Trace};
use crate::running::{DecouplingAnalyzer, GradeAdjustedPace};
use crate::training_effect::{TrainingEffectAnalyzer, TrainingEffectLevel};
use crate::training_plan::PlanSession;
use crate::zones::{AthleteSettings, HeartRateZones, ZoneAnalyzer, ZoneCalculator, ZoneDistribution};

/// Everything derived from one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub trace: Trace,
    pub zones: HeartRateZones,
    pub distribution: ZoneDistribution,
}

impl ActivityReport {
    /// Training effect classification, when the summary carries a score
    pub fn training_effect_level(&self) -> Option<TrainingEffectLevel> {
        self.trace
            .summary
            .training_effect
            .map(TrainingEffectLevel::from_value)
    }
}

/// Runs the analysis stages for one athlete
#[derive(Debug, Clone)]
pub struct ActivityAnalyzer {
    athlete: AthleteSettings,
    constants: EngineConstants,
    ingestor: TraceIngestor,
}

impl ActivityAnalyzer {
    pub fn new(athlete: AthleteSettings, constants: EngineConstants) -> Self {
        let ingestor = TraceIngestor::new(constants.clone());
        Self {
            athlete,
            constants,
            ingestor,
        }
    }

    /// Analyzer configured from the application settings
    pub fn from_config(config: &AppConfig) -> Self {
        let mut analyzer = Self::new(config.athlete.clone(), config.constants.clone());
        analyzer.ingestor = analyzer
            .ingestor
            .with_default_name(config.import.default_trace_name.clone());
        analyzer
    }

    pub fn athlete(&self) -> &AthleteSettings {
        &self.athlete
    }

    pub fn constants(&self) -> &EngineConstants {
        &self.constants
    }

    /// Ingest, classify and enrich a decoded activity.
    ///
    /// Athlete settings are validated before any sample is looked at.
    pub fn analyze(&self, raw: RawTrace) -> Result<ActivityReport> {
        let zones = ZoneCalculator::calculate_heart_rate_zones(&self.athlete)?;

        let mut trace = {
            let span = span!(Level::DEBUG, "ingest", samples = raw.samples.len());
            let _guard = span.enter();
            self.ingestor.ingest(raw)?
        };

        let distribution = {
            let span = span!(Level::DEBUG, "zones", trace_id = %trace.id);
            let _guard = span.enter();
            ZoneAnalyzer::analyze_trace(&trace, &zones, self.constants.zone_max_gap)
        };

        {
            let span = span!(Level::DEBUG, "enrich", trace_id = %trace.id);
            let _guard = span.enter();
            self.enrich(&mut trace, &distribution);
        }

        info!(
            trace_id = %trace.id,
            name = %trace.name,
            points = trace.points.len(),
            distance_m = trace.summary.total_distance,
            moving_s = trace.summary.moving_time,
            training_effect = ?trace.summary.training_effect,
            "Activity analyzed"
        );

        Ok(ActivityReport {
            trace,
            zones,
            distribution,
        })
    }

    /// Import a file through the matching format adapter and analyze it
    pub fn analyze_file(&self, manager: &ImportManager, path: &Path) -> Result<ActivityReport> {
        let raw = manager.import_file(path)?;
        self.analyze(raw)
    }

    /// Fill training effect, grade-adjusted pace and decoupling
    pub fn enrich(&self, trace: &mut Trace, distribution: &ZoneDistribution) {
        let training_effect = TrainingEffectAnalyzer::calculate(distribution);
        let gap = GradeAdjustedPace::for_trace(trace, &self.constants);
        let decoupling =
            DecouplingAnalyzer::calculate(trace, self.constants.decoupling_min_samples);

        debug!(
            trace_id = %trace.id,
            training_effect,
            grade_adjusted_pace = ?gap,
            decoupling = ?decoupling,
            "Summary enriched"
        );

        let summary = &mut trace.summary;
        summary.training_effect = Some(training_effect);
        summary.grade_adjusted_pace = gap;
        summary.decoupling = decoupling;
    }

    /// Score the report's trace against a planned session and attach the record
    pub fn evaluate<'r>(
        &self,
        report: &'r mut ActivityReport,
        session: &PlanSession,
    ) -> &'r ComplianceRecord {
        let record = ComplianceScorer::evaluate(session, &report.trace, &self.constants);
        debug!(
            trace_id = %report.trace.id,
            session_id = %session.id,
            score = record.score,
            "Compliance evaluated"
        );
        report.trace.summary.compliance.insert(record)
    }
}
