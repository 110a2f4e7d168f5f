//! Hospital operations.
//!
//! Hospitals are root entities with a scoped-id phone book. Deleting a
//! hospital removes the placements of its wards in application code first;
//! wards, staff, phones and link rows then go with the hospital row through
//! the schema's referential actions.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{next_scoped_id, row_exists, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{Hospital, HospitalFields, HospitalPhone, PhoneFields};
use crate::validation::Violations;

pub(crate) fn hospital_from_row(row: &Row) -> rusqlite::Result<Hospital> {
    Ok(Hospital {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub(crate) fn fetch_hospital(conn: &Connection, id: i64) -> StoreResult<Hospital> {
    conn.query_row(
        "SELECT id, name FROM hospital WHERE id = ?1",
        [id],
        hospital_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("hospital", id))
}

fn phone_from_row(row: &Row) -> rusqlite::Result<HospitalPhone> {
    Ok(HospitalPhone {
        hospital_id: row.get(0)?,
        phone_id: row.get(1)?,
        number: row.get(2)?,
    })
}

impl Store {
    pub fn list_hospitals(&self) -> StoreResult<Vec<Hospital>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM hospital ORDER BY id")?;
        let rows = stmt.query_map([], hospital_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_hospital(&self, id: i64) -> StoreResult<Hospital> {
        fetch_hospital(&self.conn, id)
    }

    pub fn create_hospital(&mut self, fields: HospitalFields) -> StoreResult<Hospital> {
        let tx = self.conn.transaction()?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute("INSERT INTO hospital (name) VALUES (?1)", [&fields.name])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(hospital = id, "hospital created");
        Ok(Hospital {
            id,
            name: fields.name,
        })
    }

    pub fn update_hospital(&mut self, id: i64, fields: HospitalFields) -> StoreResult<Hospital> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute(
            "UPDATE hospital SET name = ?2 WHERE id = ?1",
            params![id, fields.name],
        )?;
        tx.commit()?;

        Ok(Hospital {
            id,
            name: fields.name,
        })
    }

    pub fn delete_hospital(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, id)?;

        let placements = tx.execute(
            "DELETE FROM placement
             WHERE ward_id IN (SELECT id FROM ward WHERE hospital_id = ?1)",
            [id],
        )?;
        tx.execute("DELETE FROM hospital WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(hospital = id, placements, "hospital deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phone book
    // ------------------------------------------------------------------

    pub fn list_hospital_phones(&self, hospital_id: i64) -> StoreResult<Vec<HospitalPhone>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT hospital_id, phone_id, number FROM hospital_phone
             WHERE hospital_id = ?1 ORDER BY phone_id",
        )?;
        let rows = stmt.query_map([hospital_id], phone_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_hospital_phone(
        &mut self,
        hospital_id: i64,
        fields: PhoneFields,
    ) -> StoreResult<HospitalPhone> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, hospital_id)?;

        let mut violations = Violations::new();
        violations.require_text("number", &fields.number);
        violations.into_result()?;

        let phone_id = next_scoped_id(
            &tx,
            "SELECT MAX(phone_id) FROM hospital_phone WHERE hospital_id = ?1",
            hospital_id,
        )?;
        tx.execute(
            "INSERT INTO hospital_phone (hospital_id, phone_id, number) VALUES (?1, ?2, ?3)",
            params![hospital_id, phone_id, fields.number],
        )?;
        tx.commit()?;

        Ok(HospitalPhone {
            hospital_id,
            phone_id,
            number: fields.number,
        })
    }

    pub fn update_hospital_phone(
        &mut self,
        hospital_id: i64,
        phone_id: i64,
        fields: PhoneFields,
    ) -> StoreResult<HospitalPhone> {
        let tx = self.conn.transaction()?;
        if !row_exists(
            &tx,
            "SELECT 1 FROM hospital_phone WHERE hospital_id = ?1 AND phone_id = ?2",
            params![hospital_id, phone_id],
        )? {
            return Err(StoreError::not_found(
                "hospital phone",
                format!("({hospital_id}, {phone_id})"),
            ));
        }

        let mut violations = Violations::new();
        violations.require_text("number", &fields.number);
        violations.into_result()?;

        tx.execute(
            "UPDATE hospital_phone SET number = ?3 WHERE hospital_id = ?1 AND phone_id = ?2",
            params![hospital_id, phone_id, fields.number],
        )?;
        tx.commit()?;

        Ok(HospitalPhone {
            hospital_id,
            phone_id,
            number: fields.number,
        })
    }

    pub fn remove_hospital_phone(&mut self, hospital_id: i64, phone_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM hospital_phone WHERE hospital_id = ?1 AND phone_id = ?2",
            params![hospital_id, phone_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "hospital phone",
                format!("({hospital_id}, {phone_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}
