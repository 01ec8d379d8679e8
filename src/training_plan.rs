use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ConfigurationError;

/// Athlete skill level used to scale plan templates
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Pro,
}

impl SkillLevel {
    /// Multiplier applied to every session's target duration
    pub fn factor(&self) -> Decimal {
        match self {
            SkillLevel::Beginner => dec!(1.0),
            SkillLevel::Intermediate => dec!(1.3),
            SkillLevel::Pro => dec!(1.7),
        }
    }
}

impl std::str::FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "pro" | "advanced" => Ok(SkillLevel::Pro),
            _ => Err(format!("Unknown skill level: {}", s)),
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SkillLevel::Beginner => "BEGINNER",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Pro => "PRO",
        };
        write!(f, "{}", name)
    }
}

/// A planned workout within a training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSession {
    pub id: String,
    /// Day number within the plan, starting at 1
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Target duration in whole minutes
    pub target_duration: u32,
    /// Target heart rate zone (1-5)
    pub target_zone: u8,
}

/// A named sequence of planned sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: String,
    pub name: String,
    pub sessions: Vec<PlanSession>,
}

impl TrainingPlan {
    /// Look up a session by id
    pub fn session(&self, session_id: &str) -> Option<&PlanSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Total planned minutes
    pub fn total_duration(&self) -> u32 {
        self.sessions.iter().map(|s| s.target_duration).sum()
    }
}

/// Scales plan templates to an athlete's skill level
pub struct PlanScaler;

impl PlanScaler {
    /// Scaled copy of `plan`; durations are rounded half away from zero to
    /// whole minutes. The template itself is never modified.
    pub fn scale(plan: &TrainingPlan, level: SkillLevel) -> TrainingPlan {
        let factor = level.factor();

        let sessions = plan
            .sessions
            .iter()
            .map(|session| PlanSession {
                target_duration: Self::scale_duration(session.target_duration, factor),
                ..session.clone()
            })
            .collect();

        TrainingPlan {
            id: plan.id.clone(),
            name: plan.name.clone(),
            sessions,
        }
    }

    fn scale_duration(minutes: u32, factor: Decimal) -> u32 {
        (Decimal::from(minutes) * factor)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(u32::MAX)
    }
}

/// On-disk layout of a plan catalog
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    plans: Vec<TrainingPlan>,
}

/// Plan templates keyed by id
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: HashMap<String, TrainingPlan>,
}

impl PlanCatalog {
    /// Build a catalog, rejecting malformed templates and duplicate ids
    pub fn from_plans(plans: Vec<TrainingPlan>) -> std::result::Result<Self, ConfigurationError> {
        let mut catalog = HashMap::with_capacity(plans.len());

        for plan in plans {
            Self::validate(&plan)?;
            if catalog.contains_key(&plan.id) {
                return Err(ConfigurationError::InvalidPlan {
                    plan_id: plan.id,
                    reason: "duplicate plan id".to_string(),
                });
            }
            catalog.insert(plan.id.clone(), plan);
        }

        Ok(Self { plans: catalog })
    }

    /// Parse a `{ "plans": [...] }` JSON document
    pub fn from_json(content: &str) -> std::result::Result<Self, ConfigurationError> {
        let document: CatalogDocument =
            serde_json::from_str(content).map_err(|e| ConfigurationError::Parse {
                what: "plan catalog (JSON)".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_plans(document.plans)
    }

    /// Parse a TOML document with `[[plans]]` tables
    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigurationError> {
        let document: CatalogDocument =
            toml::from_str(content).map_err(|e| ConfigurationError::Parse {
                what: "plan catalog (TOML)".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_plans(document.plans)
    }

    /// Load a catalog file; `.toml` files are read as TOML, anything else as JSON
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan catalog: {}", path.display()))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let catalog = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .with_context(|| format!("Invalid plan catalog: {}", path.display()))?;

        debug!(path = %path.display(), plans = catalog.len(), "Plan catalog loaded");
        Ok(catalog)
    }

    /// Check a template's sessions for out-of-range values
    pub fn validate(plan: &TrainingPlan) -> std::result::Result<(), ConfigurationError> {
        for session in &plan.sessions {
            if !(1..=5).contains(&session.target_zone) {
                return Err(ConfigurationError::InvalidPlan {
                    plan_id: plan.id.clone(),
                    reason: format!(
                        "session {} targets zone {}, expected 1-5",
                        session.id, session.target_zone
                    ),
                });
            }
            if session.day == 0 {
                return Err(ConfigurationError::InvalidPlan {
                    plan_id: plan.id.clone(),
                    reason: format!("session {} has day 0, days start at 1", session.id),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, plan_id: &str) -> Option<&TrainingPlan> {
        self.plans.get(plan_id)
    }

    /// Plans sorted by id
    pub fn plans(&self) -> Vec<&TrainingPlan> {
        let mut plans: Vec<_> = self.plans.values().collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Scale the catalog template with the same id as `plan`. A plan the
    /// catalog does not know is returned as given.
    pub fn scaled(&self, plan: &TrainingPlan, level: SkillLevel) -> TrainingPlan {
        match self.plans.get(&plan.id) {
            Some(template) => {
                let scaled = PlanScaler::scale(template, level);
                debug!(
                    plan_id = %scaled.id,
                    level = %level,
                    planned_minutes = template.total_duration(),
                    scaled_minutes = scaled.total_duration(),
                    "Scaled plan"
                );
                scaled
            }
            None => {
                warn!(plan_id = %plan.id, "Unknown plan id, returning plan unscaled");
                plan.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session(id: &str, day: u32, minutes: u32, zone: u8) -> PlanSession {
        PlanSession {
            id: id.to_string(),
            day,
            title: format!("Session {}", id),
            description: String::new(),
            target_duration: minutes,
            target_zone: zone,
        }
    }

    fn c25k() -> TrainingPlan {
        TrainingPlan {
            id: "c25k".to_string(),
            name: "Couch to 5K".to_string(),
            sessions: vec![
                session("w1d1", 1, 20, 2),
                session("w1d2", 3, 25, 2),
                session("w1d3", 5, 45, 3),
            ],
        }
    }

    #[test]
    fn test_skill_level_factors() {
        assert_eq!(SkillLevel::Beginner.factor(), dec!(1.0));
        assert_eq!(SkillLevel::Intermediate.factor(), dec!(1.3));
        assert_eq!(SkillLevel::Pro.factor(), dec!(1.7));
        assert_eq!("PRO".parse::<SkillLevel>().unwrap(), SkillLevel::Pro);
        assert!("elite".parse::<SkillLevel>().is_err());
    }

    #[test]
    fn test_skill_level_serialization() {
        let json = serde_json::to_string(&SkillLevel::Intermediate).unwrap();
        assert_eq!(json, "\"INTERMEDIATE\"");
        assert_eq!(SkillLevel::Intermediate.to_string(), "INTERMEDIATE");
    }

    #[test]
    fn test_scale_rounds_half_away_from_zero() {
        let template = c25k();
        let scaled = PlanScaler::scale(&template, SkillLevel::Intermediate);

        // 26.0, 32.5, 58.5
        let durations: Vec<u32> = scaled.sessions.iter().map(|s| s.target_duration).collect();
        assert_eq!(durations, vec![26, 33, 59]);

        let pro = PlanScaler::scale(&template, SkillLevel::Pro);
        let durations: Vec<u32> = pro.sessions.iter().map(|s| s.target_duration).collect();
        // 34.0, 42.5, 76.5
        assert_eq!(durations, vec![34, 43, 77]);

        assert_eq!(template, c25k());
    }

    #[test]
    fn test_beginner_scaling_is_identity() {
        let template = c25k();
        assert_eq!(PlanScaler::scale(&template, SkillLevel::Beginner), template);
    }

    #[test]
    fn test_catalog_validation() {
        let mut bad_zone = c25k();
        bad_zone.sessions[1].target_zone = 6;
        assert!(matches!(
            PlanCatalog::from_plans(vec![bad_zone]),
            Err(ConfigurationError::InvalidPlan { .. })
        ));

        let mut bad_day = c25k();
        bad_day.sessions[0].day = 0;
        assert!(PlanCatalog::from_plans(vec![bad_day]).is_err());

        assert!(PlanCatalog::from_plans(vec![c25k(), c25k()]).is_err());
    }

    #[test]
    fn test_catalog_scaled_unknown_plan_is_unchanged() {
        let catalog = PlanCatalog::from_plans(vec![c25k()]).unwrap();

        let mut unknown = c25k();
        unknown.id = "half-marathon".to_string();
        assert_eq!(catalog.scaled(&unknown, SkillLevel::Pro), unknown);

        let scaled = catalog.scaled(&c25k(), SkillLevel::Intermediate);
        assert_eq!(scaled.sessions[0].target_duration, 26);
        assert_eq!(catalog.get("c25k").unwrap().sessions[0].target_duration, 20);
        assert!(scaled.total_duration() > catalog.get("c25k").unwrap().total_duration());
    }

    #[test]
    fn test_catalog_formats() {
        let json = serde_json::to_string(&CatalogDocument { plans: vec![c25k()] }).unwrap();
        let from_json = PlanCatalog::from_json(&json).unwrap();
        assert_eq!(from_json.get("c25k"), Some(&c25k()));

        let toml_str = r#"
            [[plans]]
            id = "base"
            name = "Base Building"

            [[plans.sessions]]
            id = "long"
            day = 6
            title = "Long Run"
            target_duration = 90
            target_zone = 2
        "#;
        let from_toml = PlanCatalog::from_toml(toml_str).unwrap();
        let plan = from_toml.get("base").unwrap();
        assert_eq!(plan.total_duration(), 90);
        assert_eq!(plan.session("long").unwrap().description, "");

        assert!(PlanCatalog::from_json("{\"plans\": 3}").is_err());
    }

    #[test]
    fn test_catalog_file_loading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plans.json");
        fs::write(
            &path,
            serde_json::to_string(&CatalogDocument { plans: vec![c25k()] }).unwrap(),
        )
        .unwrap();

        let catalog = PlanCatalog::load_from_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.plans()[0].id, "c25k");

        assert!(PlanCatalog::load_from_file(dir.path().join("missing.json")).is_err());
    }
}
