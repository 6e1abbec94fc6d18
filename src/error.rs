//! Crate error type.
//!
//! Only genuinely exceptional conditions become errors. Missing coordinates,
//! unassignable jobs and unresolvable conflicts are reported as data in the
//! respective result structures.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors produced by `u-fieldops`.
#[derive(Debug, Error)]
pub enum FieldOpsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("input failed validation with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("route optimization for team '{team_id}' exceeded its time budget after {elapsed_ms} ms")]
    TimedOut { team_id: String, elapsed_ms: u64 },
    #[error("route optimization for team '{team_id}' failed: {reason}")]
    OptimizationFailed { team_id: String, reason: String },
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, FieldOpsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_error_messages() {
        let e = FieldOpsError::TimedOut {
            team_id: "T1".into(),
            elapsed_ms: 1500,
        };
        assert!(e.to_string().contains("T1"));
        assert!(e.to_string().contains("1500"));

        let e = FieldOpsError::Validation(vec![ValidationError::new(
            ValidationErrorKind::DuplicateId,
            "Duplicate job ID: J1",
        )]);
        assert_eq!(e.to_string(), "input failed validation with 1 error(s)");
    }

    #[test]
    fn test_config_error_from_json() {
        let err: FieldOpsError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, FieldOpsError::Config(_)));
    }
}
