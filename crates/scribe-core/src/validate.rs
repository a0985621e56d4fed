//! Submission validation.
//!
//! Validation is an explicit, exhaustive pass over the submission: every
//! failed check produces one [`FieldError`], and the caller gets the full
//! list at once. Enum membership (action, severity) is enforced by the
//! type system at deserialization and is not re-checked here.

use serde::Serialize;
use thiserror::Error;

use crate::entry::LogSubmission;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_LEN: usize = 32_768;

/// Longest accepted identifier field (tenant, user, resource), in characters.
pub const MAX_IDENT_LEN: usize = 256;

/// One failed validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field that failed.
    pub field: &'static str,

    /// What was wrong with it.
    pub message: String,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A submission that failed validation.
#[derive(Debug, Clone, Error)]
#[error("invalid submission: {}", describe(.errors))]
pub struct ValidationError {
    /// Every failed check, in field order.
    pub errors: Vec<FieldError>,
}

/// Validate a submission, collecting all field errors.
pub fn validate_submission(submission: &LogSubmission) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    check_ident(&mut errors, "tenant_id", &submission.tenant_id);
    check_ident(&mut errors, "user_id", &submission.user_id);
    check_ident(&mut errors, "resource_type", &submission.resource_type);
    check_ident(&mut errors, "resource_id", &submission.resource_id);

    if submission.message.trim().is_empty() {
        errors.push(FieldError {
            field: "message",
            message: "must not be empty".to_string(),
        });
    } else if submission.message.chars().count() > MAX_MESSAGE_LEN {
        errors.push(FieldError {
            field: "message",
            message: format!("must not exceed {} characters", MAX_MESSAGE_LEN),
        });
    }

    check_object(&mut errors, "before_state", submission.before_state.as_ref());
    check_object(&mut errors, "after_state", submission.after_state.as_ref());
    if !submission.metadata.is_null() && !submission.metadata.is_object() {
        errors.push(FieldError {
            field: "metadata",
            message: "must be a JSON object when present".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn check_ident(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field,
            message: "must not be empty".to_string(),
        });
    } else if value.chars().count() > MAX_IDENT_LEN {
        errors.push(FieldError {
            field,
            message: format!("must not exceed {} characters", MAX_IDENT_LEN),
        });
    } else if value.chars().any(char::is_whitespace) {
        errors.push(FieldError {
            field,
            message: "must not contain whitespace".to_string(),
        });
    }
}

fn check_object(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&serde_json::Value>,
) {
    if let Some(v) = value {
        if !v.is_object() {
            errors.push(FieldError {
                field,
                message: "must be a JSON object when present".to_string(),
            });
        }
    }
}
