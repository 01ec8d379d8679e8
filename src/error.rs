//! Unified error hierarchy for TrackLab
//!
//! Ingestion failures are fatal for the trace being ingested, configuration
//! errors are rejected before any computation starts, and "not computable"
//! metrics are expected outcomes that the public API surfaces as `None`.

use thiserror::Error;

/// Top-level error type for all TrackLab operations
#[derive(Debug, Error)]
pub enum TrackLabError {
    /// Trace ingestion errors
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestError),

    /// Athlete settings or plan template errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Derived metric errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Activity file import errors
    #[error("Import error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trace ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload contained no record with a usable timestamp
    #[error("No valid samples in {source_name}")]
    NoValidSamples { source_name: String },
}

/// Athlete configuration and plan template errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Athlete settings violate their invariants
    #[error("Invalid athlete settings: {reason}")]
    InvalidAthleteSettings { reason: String },

    /// Plan template is malformed
    #[error("Invalid plan {plan_id}: {reason}")]
    InvalidPlan { plan_id: String, reason: String },

    /// Configuration document could not be parsed
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },
}

/// Derived metric errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Preconditions of a metric are unmet
    #[error("{metric} not computable: {reason}")]
    NotComputable { metric: String, reason: String },
}

/// Activity file import errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },
}

/// Result type alias for TrackLab operations
pub type Result<T> = std::result::Result<T, TrackLabError>;

impl TrackLabError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrackLabError::Calculation(CalculationError::NotComputable { .. }) => ErrorSeverity::Info,
            TrackLabError::Ingestion(_) => ErrorSeverity::Warning,
            TrackLabError::ImportExport(ImportExportError::ParseError { .. }) => ErrorSeverity::Warning,
            TrackLabError::Configuration(_) => ErrorSeverity::Error,
            TrackLabError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrackLabError::Ingestion(IngestError::NoValidSamples { source_name }) => {
                format!(
                    "No usable track points found in {}. Check that samples carry timestamps.",
                    source_name
                )
            }
            TrackLabError::Configuration(ConfigurationError::InvalidAthleteSettings { reason }) => {
                format!("Athlete heart rate settings are invalid: {}", reason)
            }
            TrackLabError::ImportExport(ImportExportError::UnsupportedFormat { format }) => {
                format!("Files of type '{}' cannot be analyzed", format)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = TrackLabError::Ingestion(IngestError::NoValidSamples {
            source_name: "run.tcx".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = TrackLabError::Calculation(CalculationError::NotComputable {
            metric: "decoupling".to_string(),
            reason: "too few samples".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::INFO);

        let err = TrackLabError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_messages() {
        let err = TrackLabError::Ingestion(IngestError::NoValidSamples {
            source_name: "empty.csv".to_string(),
        });
        assert!(err.user_message().contains("empty.csv"));

        let err: TrackLabError = ConfigurationError::InvalidAthleteSettings {
            reason: "resting HR 190 must be below max HR 180".to_string(),
        }
        .into();
        assert!(err.user_message().contains("invalid"));
    }
}
