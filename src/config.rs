use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::training_plan::SkillLevel;
use crate::zones::{AthleteSettings, ZoneMethod};

/// Calories credited per kilometer
pub const CALORIES_PER_KM: f64 = 70.0;
/// Reference threshold pace (5:00/km) in seconds per kilometer
pub const THRESHOLD_PACE: f64 = 300.0;
/// Variability index placeholder
pub const VARIABILITY_INDEX: f64 = 1.05;
/// Intensity component used by compliance scoring
pub const PLANNED_INTENSITY_SCORE: f64 = 80.0;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Skill level used to scale plan templates
    pub skill_level: SkillLevel,

    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Athlete heart rate settings for the zone model
    pub athlete: AthleteSettings,

    /// Engine constants
    #[serde(default)]
    pub constants: EngineConstants,

    /// Data import preferences
    #[serde(default)]
    pub import: ImportSettings,

    /// Logging preferences
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Named constants and thresholds used by the analysis engine.
///
/// The defaults are the documented simplifications the metrics are defined
/// against; overriding them changes every derived score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConstants {
    /// Calories credited per kilometer
    pub calories_per_km: f64,

    /// Reference threshold pace in seconds per kilometer
    pub threshold_pace: f64,

    /// Value reported as the variability index
    pub variability_index: f64,

    /// Fixed intensity component of the compliance score
    pub planned_intensity_score: f64,

    /// Largest sample gap (seconds) still counted as moving
    pub moving_max_gap: f64,

    /// Minimum speed (m/s) for an interval to count as moving
    pub moving_min_speed: f64,

    /// Fastest pace (s/km) accepted when tracking max pace, exclusive
    pub pace_filter_min: f64,

    /// Slowest pace (s/km) accepted when tracking max pace, exclusive
    pub pace_filter_max: f64,

    /// Sample gap (seconds) below which time is credited to a zone
    pub zone_max_gap: f64,

    /// Samples required before decoupling is computed
    pub decoupling_min_samples: usize,

    /// Training effect above which compliance notes flag fatigue
    pub fatigue_threshold: f64,

    /// Compliance score above which adherence is excellent
    pub excellent_threshold: u8,
}

impl Default for EngineConstants {
    fn default() -> Self {
        EngineConstants {
            calories_per_km: CALORIES_PER_KM,
            threshold_pace: THRESHOLD_PACE,
            variability_index: VARIABILITY_INDEX,
            planned_intensity_score: PLANNED_INTENSITY_SCORE,
            moving_max_gap: 15.0,
            moving_min_speed: 0.5,
            pace_filter_min: 120.0,
            pace_filter_max: 1200.0,
            zone_max_gap: 30.0,
            decoupling_min_samples: 100,
            fatigue_threshold: 4.5,
            excellent_threshold: 85,
        }
    }
}

/// Data import preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Name given to traces whose source carries none
    pub default_trace_name: String,

    /// File extensions scanned in batch mode
    pub supported_formats: Vec<String>,

    /// Worker threads for batch analysis (None for one per CPU)
    pub threads: Option<usize>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            default_trace_name: "Untitled Activity".to_string(),
            supported_formats: vec![
                "csv".to_string(),
                "tcx".to_string(),
                "gpx".to_string(),
                "json".to_string(),
            ],
            threads: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            skill_level: SkillLevel::Beginner,
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            athlete: AthleteSettings {
                max_hr: 190,
                resting_hr: 60,
                method: ZoneMethod::MaxHr,
            },
            constants: EngineConstants::default(),
            import: ImportSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config
            .athlete
            .validate()
            .with_context(|| format!("Invalid athlete settings in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tracklab")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(path = %config_path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }
}
