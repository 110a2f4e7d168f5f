//! Doctor operations.
//!
//! Doctors are root entities; their hospital and patient links are association
//! rows removed with the doctor at the storage layer (see the links module).

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{Doctor, DoctorFields};
use crate::validation::Violations;

pub(crate) fn doctor_from_row(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
    })
}

pub(crate) fn fetch_doctor(conn: &Connection, id: i64) -> StoreResult<Doctor> {
    conn.query_row(
        "SELECT id, name, specialty FROM doctor WHERE id = ?1",
        [id],
        doctor_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("doctor", id))
}

impl Store {
    pub fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, specialty FROM doctor ORDER BY id")?;
        let rows = stmt.query_map([], doctor_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_doctor(&self, id: i64) -> StoreResult<Doctor> {
        fetch_doctor(&self.conn, id)
    }

    pub fn create_doctor(&mut self, fields: DoctorFields) -> StoreResult<Doctor> {
        let tx = self.conn.transaction()?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute(
            "INSERT INTO doctor (name, specialty) VALUES (?1, ?2)",
            params![fields.name, fields.specialty],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(doctor = id, "doctor created");
        Ok(Doctor {
            id,
            name: fields.name,
            specialty: fields.specialty,
        })
    }

    pub fn update_doctor(&mut self, id: i64, fields: DoctorFields) -> StoreResult<Doctor> {
        let tx = self.conn.transaction()?;
        fetch_doctor(&tx, id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute(
            "UPDATE doctor SET name = ?2, specialty = ?3 WHERE id = ?1",
            params![id, fields.name, fields.specialty],
        )?;
        tx.commit()?;

        Ok(Doctor {
            id,
            name: fields.name,
            specialty: fields.specialty,
        })
    }

    pub fn delete_doctor(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_doctor(&tx, id)?;
        tx.execute("DELETE FROM doctor WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(doctor = id, "doctor deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::DoctorFields;
    use crate::Store;

    fn store() -> Store {
        Store::open_in_memory().expect("in-memory store should open")
    }

    #[test]
    fn crud_roundtrip() {
        let mut store = store();
        let doctor = store
            .create_doctor(DoctorFields {
                name: "Dr. Grey".into(),
                specialty: Some("Cardiology".into()),
            })
            .expect("create should succeed");

        assert_eq!(store.list_doctors().unwrap().len(), 1);

        let updated = store
            .update_doctor(
                doctor.id,
                DoctorFields {
                    name: "Dr. Grey".into(),
                    specialty: Some("Neurology".into()),
                },
            )
            .expect("update should succeed");
        assert_eq!(updated.specialty.as_deref(), Some("Neurology"));

        store.delete_doctor(doctor.id).expect("delete should succeed");
        assert!(store.get_doctor(doctor.id).expect_err("gone").is_not_found());
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut store = store();
        let err = store
            .create_doctor(DoctorFields {
                name: "".into(),
                specialty: None,
            })
            .expect_err("blank name should fail");
        assert!(err.violations().is_some());
    }

    #[test]
    fn update_of_a_missing_doctor_is_not_found() {
        let mut store = store();
        let err = store
            .update_doctor(
                12,
                DoctorFields {
                    name: "Dr. Grey".into(),
                    specialty: None,
                },
            )
            .expect_err("should not resolve");
        assert!(err.is_not_found());
    }
}
