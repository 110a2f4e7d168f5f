//! Shared constants.

/// Upper bound applied to every required text column (names, diagnosis and
/// analysis kinds, phone numbers).
pub const MAX_TEXT_LEN: usize = 200;

/// Database file used when no path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "clinic.db";
