//! Ward operations.
//!
//! A ward belongs to one hospital and its name must be unique within that
//! hospital. Deleting a ward cascade-deletes its placements explicitly,
//! inside the delete's transaction, before removing the ward row.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::hospitals::fetch_hospital;
use crate::db::{row_exists, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{Ward, WardDetail, WardFields};
use crate::validation::Violations;

pub(crate) fn ward_from_row(row: &Row) -> rusqlite::Result<Ward> {
    Ok(Ward {
        id: row.get(0)?,
        hospital_id: row.get(1)?,
        name: row.get(2)?,
    })
}

pub(crate) fn fetch_ward(conn: &Connection, id: i64) -> StoreResult<Ward> {
    conn.query_row(
        "SELECT id, hospital_id, name FROM ward WHERE id = ?1",
        [id],
        ward_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("ward", id))
}

/// True when another ward of the same hospital already uses `name`.
fn ward_name_taken(
    conn: &Connection,
    hospital_id: i64,
    name: &str,
    exclude_id: Option<i64>,
) -> rusqlite::Result<bool> {
    row_exists(
        conn,
        "SELECT 1 FROM ward
         WHERE hospital_id = ?1 AND name = ?2 AND (?3 IS NULL OR id <> ?3)",
        params![hospital_id, name, exclude_id],
    )
}

impl Store {
    /// Lists the wards of one hospital.
    pub fn list_wards(&self, hospital_id: i64) -> StoreResult<Vec<Ward>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, hospital_id, name FROM ward WHERE hospital_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([hospital_id], ward_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Lists every ward together with its hospital.
    pub fn list_all_wards(&self) -> StoreResult<Vec<WardDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT w.id, w.hospital_id, w.name, h.id, h.name
             FROM ward w JOIN hospital h ON h.id = w.hospital_id
             ORDER BY w.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WardDetail {
                ward: ward_from_row(row)?,
                hospital: crate::models::Hospital {
                    id: row.get(3)?,
                    name: row.get(4)?,
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_ward(&self, id: i64) -> StoreResult<WardDetail> {
        let ward = fetch_ward(&self.conn, id)?;
        let hospital = fetch_hospital(&self.conn, ward.hospital_id)?;
        Ok(WardDetail { ward, hospital })
    }

    pub fn create_ward(&mut self, hospital_id: i64, fields: WardFields) -> StoreResult<Ward> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, hospital_id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        if violations.is_empty() && ward_name_taken(&tx, hospital_id, &fields.name, None)? {
            violations.add("name", "a ward with this name already exists in the hospital");
        }
        violations.into_result()?;

        tx.execute(
            "INSERT INTO ward (hospital_id, name) VALUES (?1, ?2)",
            params![hospital_id, fields.name],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(ward = id, hospital = hospital_id, "ward created");
        Ok(Ward {
            id,
            hospital_id,
            name: fields.name,
        })
    }

    pub fn update_ward(&mut self, id: i64, fields: WardFields) -> StoreResult<Ward> {
        let tx = self.conn.transaction()?;
        let ward = fetch_ward(&tx, id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        if violations.is_empty() && ward_name_taken(&tx, ward.hospital_id, &fields.name, Some(id))? {
            violations.add("name", "a ward with this name already exists in the hospital");
        }
        violations.into_result()?;

        tx.execute(
            "UPDATE ward SET name = ?2 WHERE id = ?1",
            params![id, fields.name],
        )?;
        tx.commit()?;

        Ok(Ward {
            id,
            hospital_id: ward.hospital_id,
            name: fields.name,
        })
    }

    /// Deletes a ward and, explicitly, every placement in it.
    pub fn delete_ward(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_ward(&tx, id)?;

        let placements = tx.execute("DELETE FROM placement WHERE ward_id = ?1", [id])?;
        tx.execute("DELETE FROM ward WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(ward = id, placements, "ward deleted");
        Ok(())
    }
}
