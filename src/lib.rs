// Library interface for TrackLab modules
// This allows integration tests and benchmarks to access the core functionality

pub mod analysis;
pub mod batch;
pub mod compliance;
pub mod config;
pub mod error;
pub mod import;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod running;
pub mod training_effect;
pub mod training_plan;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use analysis::{ActivityAnalyzer, ActivityReport};
pub use batch::{BatchAnalyzer, BatchConfig, BatchSummary};
pub use compliance::ComplianceScorer;
pub use config::{AppConfig, EngineConstants};
pub use ingest::{RawSample, RawTrace, TraceIngestor};
pub use running::{DecouplingAnalyzer, GradeAdjustedPace};
pub use training_effect::{TrainingEffectAnalyzer, TrainingEffectLevel};
pub use training_plan::{PlanCatalog, PlanScaler, PlanSession, SkillLevel, TrainingPlan};
pub use zones::{AthleteSettings, HeartRateZones, ZoneAnalyzer, ZoneCalculator, ZoneDistribution, ZoneMethod};
pub use error::{TrackLabError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
