//! Patient operations.
//!
//! Two patients are considered the same person when name, address, birthday
//! and gender all match; creates and edits reject such duplicates (the edited
//! row itself excluded). Birthdays may not lie in the future.
//!
//! Deleting a patient never deletes placements: their patient reference is
//! cleared at the storage layer and the bed record survives. Diagnoses,
//! analyses and doctor links go with the patient row.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{Patient, PatientFields};
use crate::validation::Violations;

pub(crate) fn patient_from_row(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        birthday: row.get(3)?,
        gender: row.get(4)?,
    })
}

pub(crate) fn fetch_patient(conn: &Connection, id: i64) -> StoreResult<Patient> {
    conn.query_row(
        "SELECT id, name, address, birthday, gender FROM patient WHERE id = ?1",
        [id],
        patient_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("patient", id))
}

/// True when another patient row matches the whole identifying tuple.
/// Nullable columns compare with `IS` so that two missing addresses match.
fn duplicate_exists(
    conn: &Connection,
    fields: &PatientFields,
    exclude_id: Option<i64>,
) -> rusqlite::Result<bool> {
    crate::db::row_exists(
        conn,
        "SELECT 1 FROM patient
         WHERE name = ?1 AND address IS ?2 AND birthday = ?3 AND gender IS ?4
           AND (?5 IS NULL OR id <> ?5)",
        params![
            fields.name,
            fields.address,
            fields.birthday,
            fields.gender,
            exclude_id
        ],
    )
}

fn validate(
    conn: &Connection,
    fields: &PatientFields,
    exclude_id: Option<i64>,
) -> StoreResult<()> {
    let mut violations = Violations::new();
    violations.require_text("name", &fields.name);
    if fields.birthday > Utc::now().date_naive() {
        violations.add("birthday", "birthday cannot be in the future");
    }
    if violations.is_empty() && duplicate_exists(conn, fields, exclude_id)? {
        violations.add_record("a patient with the same name, address, birthday and gender already exists");
    }
    violations.into_result()
}

impl Store {
    pub fn list_patients(&self) -> StoreResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, address, birthday, gender FROM patient ORDER BY id")?;
        let rows = stmt.query_map([], patient_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_patient(&self, id: i64) -> StoreResult<Patient> {
        fetch_patient(&self.conn, id)
    }

    pub fn create_patient(&mut self, fields: PatientFields) -> StoreResult<Patient> {
        let tx = self.conn.transaction()?;
        validate(&tx, &fields, None)?;

        tx.execute(
            "INSERT INTO patient (name, address, birthday, gender) VALUES (?1, ?2, ?3, ?4)",
            params![fields.name, fields.address, fields.birthday, fields.gender],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(patient = id, "patient created");
        Ok(Patient {
            id,
            name: fields.name,
            address: fields.address,
            birthday: fields.birthday,
            gender: fields.gender,
        })
    }

    pub fn update_patient(&mut self, id: i64, fields: PatientFields) -> StoreResult<Patient> {
        let tx = self.conn.transaction()?;
        fetch_patient(&tx, id)?;
        validate(&tx, &fields, Some(id))?;

        tx.execute(
            "UPDATE patient SET name = ?2, address = ?3, birthday = ?4, gender = ?5 WHERE id = ?1",
            params![id, fields.name, fields.address, fields.birthday, fields.gender],
        )?;
        tx.commit()?;

        Ok(Patient {
            id,
            name: fields.name,
            address: fields.address,
            birthday: fields.birthday,
            gender: fields.gender,
        })
    }

    /// Deletes a patient. Placements referencing the patient survive with the
    /// reference cleared; diagnoses, analyses and doctor links are removed by
    /// the storage layer.
    pub fn delete_patient(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_patient(&tx, id)?;
        tx.execute("DELETE FROM patient WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(patient = id, "patient deleted");
        Ok(())
    }
}
