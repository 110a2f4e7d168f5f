//! Diagnosis operations.
//!
//! Diagnosis ids are scoped to their patient, assigned as `max + 1` inside the
//! create's transaction. Deleting the highest-id diagnosis therefore frees
//! that id for the next create.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::patients::fetch_patient;
use crate::db::{next_scoped_id, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{Diagnosis, DiagnosisDetail, DiagnosisFields};
use crate::validation::Violations;

fn diagnosis_from_row(row: &Row) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        kind: row.get(2)?,
        complications: row.get(3)?,
        details: row.get(4)?,
    })
}

fn fetch_diagnosis(conn: &Connection, patient_id: i64, diagnosis_id: i64) -> StoreResult<Diagnosis> {
    conn.query_row(
        "SELECT id, patient_id, kind, complications, details
         FROM diagnosis WHERE patient_id = ?1 AND id = ?2",
        params![patient_id, diagnosis_id],
        diagnosis_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("diagnosis", format!("({patient_id}, {diagnosis_id})")))
}

impl Store {
    pub fn list_diagnoses(&self, patient_id: i64) -> StoreResult<Vec<Diagnosis>> {
        fetch_patient(&self.conn, patient_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, kind, complications, details
             FROM diagnosis WHERE patient_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([patient_id], diagnosis_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Lists every diagnosis together with its patient.
    pub fn list_all_diagnoses(&self) -> StoreResult<Vec<DiagnosisDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.patient_id, d.kind, d.complications, d.details,
                    p.id, p.name, p.address, p.birthday, p.gender
             FROM diagnosis d JOIN patient p ON p.id = d.patient_id
             ORDER BY d.patient_id, d.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DiagnosisDetail {
                diagnosis: diagnosis_from_row(row)?,
                patient: crate::models::Patient {
                    id: row.get(5)?,
                    name: row.get(6)?,
                    address: row.get(7)?,
                    birthday: row.get(8)?,
                    gender: row.get(9)?,
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_diagnosis(&self, patient_id: i64, diagnosis_id: i64) -> StoreResult<DiagnosisDetail> {
        let diagnosis = fetch_diagnosis(&self.conn, patient_id, diagnosis_id)?;
        let patient = fetch_patient(&self.conn, patient_id)?;
        Ok(DiagnosisDetail { diagnosis, patient })
    }

    pub fn create_diagnosis(
        &mut self,
        patient_id: i64,
        fields: DiagnosisFields,
    ) -> StoreResult<Diagnosis> {
        let tx = self.conn.transaction()?;
        fetch_patient(&tx, patient_id)?;

        let mut violations = Violations::new();
        violations.require_text("kind", &fields.kind);
        violations.into_result()?;

        let id = next_scoped_id(
            &tx,
            "SELECT MAX(id) FROM diagnosis WHERE patient_id = ?1",
            patient_id,
        )?;
        tx.execute(
            "INSERT INTO diagnosis (id, patient_id, kind, complications, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, patient_id, fields.kind, fields.complications, fields.details],
        )?;
        tx.commit()?;

        tracing::debug!(patient = patient_id, diagnosis = id, "diagnosis created");
        Ok(Diagnosis {
            id,
            patient_id,
            kind: fields.kind,
            complications: fields.complications,
            details: fields.details,
        })
    }

    pub fn update_diagnosis(
        &mut self,
        patient_id: i64,
        diagnosis_id: i64,
        fields: DiagnosisFields,
    ) -> StoreResult<Diagnosis> {
        let tx = self.conn.transaction()?;
        fetch_diagnosis(&tx, patient_id, diagnosis_id)?;

        let mut violations = Violations::new();
        violations.require_text("kind", &fields.kind);
        violations.into_result()?;

        tx.execute(
            "UPDATE diagnosis SET kind = ?3, complications = ?4, details = ?5
             WHERE patient_id = ?1 AND id = ?2",
            params![
                patient_id,
                diagnosis_id,
                fields.kind,
                fields.complications,
                fields.details
            ],
        )?;
        tx.commit()?;

        Ok(Diagnosis {
            id: diagnosis_id,
            patient_id,
            kind: fields.kind,
            complications: fields.complications,
            details: fields.details,
        })
    }

    pub fn delete_diagnosis(&mut self, patient_id: i64, diagnosis_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM diagnosis WHERE patient_id = ?1 AND id = ?2",
            params![patient_id, diagnosis_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "diagnosis",
                format!("({patient_id}, {diagnosis_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}
