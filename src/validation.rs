//! Input validation utilities.
//!
//! Store operations validate submitted fields before touching any row and
//! report all violations at once as `(field, message)` pairs. Record-level
//! violations (for example a duplicate patient, where no single field is to
//! blame) carry no field name.

use serde::Serialize;

use crate::constants::MAX_TEXT_LEN;
use crate::error::{StoreError, StoreResult};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the message applies to; `None` for record-level violations.
    pub field: Option<&'static str>,
    pub message: String,
}

/// Accumulates validation failures for one operation.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: Some(field),
            message: message.into(),
        });
    }

    pub fn add_record(&mut self, message: impl Into<String>) {
        self.0.push(FieldError {
            field: None,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks a required text field: must not be blank and must fit the
    /// shared length bound.
    pub fn require_text(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{field} is required"));
        } else if value.chars().count() > MAX_TEXT_LEN {
            self.add(
                field,
                format!("{field} exceeds maximum length of {MAX_TEXT_LEN} characters"),
            );
        }
    }

    /// Converts the collected violations into an operation outcome.
    pub fn into_result(self) -> StoreResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(self.0))
        }
    }
}
