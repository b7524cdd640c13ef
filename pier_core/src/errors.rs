//! # Error Types
//!
//! Structured error types for pier_core. Each variant carries enough context
//! to tell which pier, stage, file or field caused the problem, so callers can
//! decide whether to skip a single data point or abort the session.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::errors::{MonitorError, MonitorResult};
//!
//! fn validate_strength(fc_mpa: f64) -> MonitorResult<()> {
//!     if fc_mpa <= 0.0 {
//!         return Err(MonitorError::InvalidInput {
//!             field: "compressive_strength_mpa".to_string(),
//!             value: fc_mpa.to_string(),
//!             reason: "Compressive strength must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pier_core operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Structured error type for monitoring operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum MonitorError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required column is missing from a source table
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A load record exists but one of its force/moment cells is empty or malformed
    #[error("Missing load value '{column}' for part {part} at stage {stage}")]
    MissingLoadValue {
        part: String,
        stage: String,
        column: String,
    },

    /// Stress evaluation could not be carried out (e.g. sample point outside the section)
    #[error("Evaluation failed: {reason}")]
    EvaluationFailed { reason: String },

    /// Section model construction failed
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// Static configuration is inconsistent
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// CSV parsing/writing error
    #[error("CSV error in '{path}': {reason}")]
    CsvError { path: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl MonitorError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MonitorError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        MonitorError::MissingField {
            field: field.into(),
        }
    }

    /// Create a MissingLoadValue error
    pub fn missing_load_value(
        part: impl Into<String>,
        stage: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        MonitorError::MissingLoadValue {
            part: part.into(),
            stage: stage.into(),
            column: column.into(),
        }
    }

    /// Create an EvaluationFailed error
    pub fn evaluation_failed(reason: impl Into<String>) -> Self {
        MonitorError::EvaluationFailed {
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(
        calculation_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MonitorError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a Configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        MonitorError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MonitorError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CsvError
    pub fn csv_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MonitorError::CsvError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline may skip the affected data point and keep going.
    ///
    /// Per-(pier, stage) problems are recoverable; file, configuration and
    /// serialization problems are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MonitorError::MissingLoadValue { .. } | MonitorError::EvaluationFailed { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            MonitorError::InvalidInput { .. } => "INVALID_INPUT",
            MonitorError::MissingField { .. } => "MISSING_FIELD",
            MonitorError::MissingLoadValue { .. } => "MISSING_LOAD_VALUE",
            MonitorError::EvaluationFailed { .. } => "EVALUATION_FAILED",
            MonitorError::CalculationFailed { .. } => "CALCULATION_FAILED",
            MonitorError::Configuration { .. } => "CONFIGURATION",
            MonitorError::FileError { .. } => "FILE_ERROR",
            MonitorError::CsvError { .. } => "CSV_ERROR",
            MonitorError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        MonitorError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = MonitorError::missing_load_value("I[3111]", "S59", "Axial (kN)");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: MonitorError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(MonitorError::missing_field("Part").error_code(), "MISSING_FIELD");
        assert_eq!(
            MonitorError::evaluation_failed("outside").error_code(),
            "EVALUATION_FAILED"
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(MonitorError::evaluation_failed("point outside").is_recoverable());
        assert!(MonitorError::missing_load_value("p", "s", "c").is_recoverable());
        assert!(!MonitorError::file_error("open", "x.csv", "not found").is_recoverable());
        assert!(!MonitorError::configuration("bad map").is_recoverable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = MonitorError::file_error("open", "data/data_gaya.csv", "No such file");
        let msg = err.to_string();
        assert!(msg.contains("data/data_gaya.csv"));
        assert!(msg.contains("open"));
    }
}
