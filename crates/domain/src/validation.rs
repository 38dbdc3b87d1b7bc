//! Field-level validation of candidate entities.

use serde::Serialize;

use crate::error::{DomainError, ErrorCode, Result};
use crate::model::Money;

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationReason {
    Required,
    TooLong,
    Negative,
    NotPositive,
    MissingReference,
    MissingContact,
    DuplicateCode,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub reason: ViolationReason,
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(reason: ViolationReason, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            reason,
            field,
            message: message.into(),
        }
    }
}

/// Pure validation of a candidate value.
///
/// An empty list means the value is valid. Callers treat any violation as a
/// hard rejection of the whole write.
pub trait Validate {
    fn validate(&self) -> Vec<Violation>;
}

/// Rejects a write when `violations` is non-empty.
///
/// `label` names the rejected entity in the error message.
pub fn ensure_valid(code: ErrorCode, label: &str, violations: Vec<Violation>) -> Result<()> {
    if violations.is_empty() {
        return Ok(());
    }
    metrics::counter!("stock_validation_failures_total", "code" => code.as_str()).increment(1);
    tracing::error!(%code, %label, violations = violations.len(), "validation failed");
    Err(DomainError::validation(
        code,
        format!("{label} is not valid"),
        violations,
    ))
}

/// Accumulates violations for one candidate.
#[derive(Debug, Default)]
pub(crate) struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, reason: ViolationReason, field: &'static str, message: String) {
        self.violations.push(Violation::new(reason, field, message));
    }

    /// Non-blank text, at most `max` characters.
    pub(crate) fn text(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.push(ViolationReason::Required, field, format!("{field} is required"));
        } else if value.chars().count() > max {
            self.push(
                ViolationReason::TooLong,
                field,
                format!("{field} must be at most {max} characters"),
            );
        }
        self
    }

    pub(crate) fn non_negative(&mut self, field: &'static str, value: i64) -> &mut Self {
        if value < 0 {
            self.push(
                ViolationReason::Negative,
                field,
                format!("{field} must not be negative (got {value})"),
            );
        }
        self
    }

    pub(crate) fn non_negative_money(&mut self, field: &'static str, value: Money) -> &mut Self {
        if value.is_negative() {
            self.push(
                ViolationReason::Negative,
                field,
                format!("{field} must not be negative (got {value})"),
            );
        }
        self
    }

    pub(crate) fn positive(&mut self, field: &'static str, value: i64) -> &mut Self {
        if value <= 0 {
            self.push(
                ViolationReason::NotPositive,
                field,
                format!("{field} must be greater than 0 (got {value})"),
            );
        }
        self
    }

    pub(crate) fn present<T>(&mut self, field: &'static str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.push(ViolationReason::Required, field, format!("{field} is required"));
        }
        self
    }

    pub(crate) fn reference<T>(&mut self, field: &'static str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.push(
                ViolationReason::MissingReference,
                field,
                format!("{field} must reference an existing record"),
            );
        }
        self
    }

    /// Absorbs the violations of a nested value, prefixing their messages.
    pub(crate) fn nested(&mut self, prefix: &str, violations: Vec<Violation>) -> &mut Self {
        self.violations
            .extend(violations.into_iter().map(|v| Violation {
                message: format!("{prefix}: {}", v.message),
                ..v
            }));
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.violations)
    }
}
