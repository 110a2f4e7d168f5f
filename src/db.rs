//! Store handle and schema bootstrap.
//!
//! A [`Store`] owns one database connection and is intended to be scoped per
//! request or per transaction boundary — there is no process-wide shared
//! session. Every mutating operation opens a single transaction covering its
//! whole validate-then-mutate sequence, so uniqueness checks and scoped id
//! assignment are atomic with the insert or update they guard.

use rusqlite::{Connection, OptionalExtension, Params};

use crate::config::StoreConfig;
use crate::error::StoreResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS hospital (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hospital_phone (
    hospital_id INTEGER NOT NULL REFERENCES hospital (id) ON DELETE CASCADE,
    phone_id    INTEGER NOT NULL,
    number      TEXT NOT NULL,
    PRIMARY KEY (hospital_id, phone_id)
);

CREATE TABLE IF NOT EXISTS lab (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lab_phone (
    lab_id   INTEGER NOT NULL REFERENCES lab (id) ON DELETE CASCADE,
    phone_id INTEGER NOT NULL,
    number   TEXT NOT NULL,
    PRIMARY KEY (lab_id, phone_id)
);

CREATE TABLE IF NOT EXISTS ward (
    id          INTEGER PRIMARY KEY,
    hospital_id INTEGER NOT NULL REFERENCES hospital (id) ON DELETE CASCADE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ward_staff (
    id       INTEGER NOT NULL,
    ward_id  INTEGER NOT NULL REFERENCES ward (id) ON DELETE CASCADE,
    name     TEXT NOT NULL,
    position TEXT,
    PRIMARY KEY (id, ward_id)
);

CREATE TABLE IF NOT EXISTS doctor (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    specialty TEXT
);

CREATE TABLE IF NOT EXISTS patient (
    id       INTEGER PRIMARY KEY,
    name     TEXT NOT NULL,
    address  TEXT,
    birthday TEXT NOT NULL,
    gender   TEXT
);

-- Ward deletion removes placements in application code, inside the same
-- transaction, so ward_id carries no referential action on purpose.
CREATE TABLE IF NOT EXISTS placement (
    id         INTEGER PRIMARY KEY,
    ward_id    INTEGER REFERENCES ward (id),
    patient_id INTEGER REFERENCES patient (id) ON DELETE SET NULL,
    bed        INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS diagnosis (
    id            INTEGER NOT NULL,
    patient_id    INTEGER NOT NULL REFERENCES patient (id) ON DELETE CASCADE,
    kind          TEXT NOT NULL,
    complications TEXT,
    details       TEXT,
    PRIMARY KEY (id, patient_id)
);

CREATE TABLE IF NOT EXISTS analysis (
    id         INTEGER NOT NULL,
    patient_id INTEGER NOT NULL REFERENCES patient (id) ON DELETE CASCADE,
    lab_id     INTEGER REFERENCES lab (id) ON DELETE SET NULL,
    kind       TEXT NOT NULL,
    date       TEXT NOT NULL,
    status     TEXT,
    PRIMARY KEY (id, patient_id)
);

CREATE TABLE IF NOT EXISTS hospital_doctor (
    hospital_id INTEGER NOT NULL REFERENCES hospital (id) ON DELETE CASCADE,
    doctor_id   INTEGER NOT NULL REFERENCES doctor (id) ON DELETE CASCADE,
    PRIMARY KEY (hospital_id, doctor_id)
);

CREATE TABLE IF NOT EXISTS hospital_lab (
    hospital_id INTEGER NOT NULL REFERENCES hospital (id) ON DELETE CASCADE,
    lab_id      INTEGER NOT NULL REFERENCES lab (id) ON DELETE CASCADE,
    PRIMARY KEY (hospital_id, lab_id)
);

CREATE TABLE IF NOT EXISTS doctor_patient (
    doctor_id  INTEGER NOT NULL REFERENCES doctor (id) ON DELETE CASCADE,
    patient_id INTEGER NOT NULL REFERENCES patient (id) ON DELETE CASCADE,
    PRIMARY KEY (doctor_id, patient_id)
);
";

/// Handle to the clinical records database.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Opens (and if necessary creates) the database at the configured path.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = Connection::open(config.database_path())?;
        Self::initialise(conn)
    }

    /// Opens a fresh in-memory database, used by tests and tooling.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::initialise(Connection::open_in_memory()?)
    }

    fn initialise(conn: Connection) -> StoreResult<Self> {
        // foreign_keys is per-connection in SQLite and off by default.
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("clinical records schema ready");
        Ok(Self { conn })
    }
}

/// Runs an existence probe, mapping "no rows" to `false`.
pub(crate) fn row_exists<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<bool> {
    conn.query_row(sql, params, |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
}

/// Computes the next id within a parent's scope: `max(sibling ids) + 1`, or 1
/// when the parent has no children. Callers must run this inside the same
/// transaction as the insert it feeds.
pub(crate) fn next_scoped_id(
    conn: &Connection,
    max_sql: &str,
    parent_id: i64,
) -> rusqlite::Result<i64> {
    let max: Option<i64> = conn.query_row(max_sql, [parent_id], |row| row.get(0))?;
    Ok(max.unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::new(temp_dir.path().join("records.db"));

        let store = Store::open(&config).expect("open should succeed");
        drop(store);

        assert!(config.database_path().is_file());
    }

    #[test]
    fn open_is_idempotent_across_reopens() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::new(temp_dir.path().join("records.db"));

        let mut store = Store::open(&config).expect("first open should succeed");
        store
            .create_hospital(crate::models::HospitalFields {
                name: "General".into(),
            })
            .expect("create should succeed");
        drop(store);

        let store = Store::open(&config).expect("second open should succeed");
        let hospitals = store.list_hospitals().expect("list should succeed");
        assert_eq!(hospitals.len(), 1, "data should survive a reopen");
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = Store::open_in_memory().expect("open should succeed");
        let err = store
            .conn
            .execute(
                "INSERT INTO ward (hospital_id, name) VALUES (999, 'Orphan')",
                [],
            )
            .expect_err("insert with dangling hospital_id should fail");
        assert!(err.to_string().contains("FOREIGN KEY"));
    }
}
