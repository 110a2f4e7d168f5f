//! Store configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! store. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_DATABASE_FILE;

/// Store configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    database_path: PathBuf,
}

impl StoreConfig {
    pub fn new(database_path: PathBuf) -> Self {
        Self { database_path }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

/// Resolve the database path from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, the default database file in the
/// working directory is used.
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_overrides_default() {
        let path = database_path_from_env_value(Some("/tmp/records.db".into()));
        assert_eq!(path, PathBuf::from("/tmp/records.db"));
    }

    #[test]
    fn blank_env_value_falls_back_to_default() {
        assert_eq!(
            database_path_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATABASE_FILE)
        );
        assert_eq!(
            database_path_from_env_value(None),
            PathBuf::from(DEFAULT_DATABASE_FILE)
        );
    }
}
