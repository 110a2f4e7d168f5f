use crate::validation::FieldError;

/// Errors produced by store operations.
///
/// Every operation fails in exactly one of three ways: a parent or entity key
/// did not resolve, the submitted fields broke a domain rule, or the
/// underlying database failed. Validation failures carry the full list of
/// field-level violations and guarantee that nothing was persisted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns `true` if this is a missing-key outcome rather than a
    /// validation or storage failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns the field-level violations of a validation failure, if any.
    pub fn violations(&self) -> Option<&[FieldError]> {
        match self {
            StoreError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match e.field {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
