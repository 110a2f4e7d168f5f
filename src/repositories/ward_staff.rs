//! Ward staff operations.
//!
//! Staff ids are scoped to their ward: the first member of every ward gets
//! id 1, assigned as `max + 1` inside the create's transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::wards::fetch_ward;
use crate::db::{next_scoped_id, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{WardStaff, WardStaffDetail, WardStaffFields};
use crate::validation::Violations;

fn staff_from_row(row: &Row) -> rusqlite::Result<WardStaff> {
    Ok(WardStaff {
        id: row.get(0)?,
        ward_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
    })
}

fn fetch_staff(conn: &Connection, ward_id: i64, staff_id: i64) -> StoreResult<WardStaff> {
    conn.query_row(
        "SELECT id, ward_id, name, position FROM ward_staff WHERE ward_id = ?1 AND id = ?2",
        params![ward_id, staff_id],
        staff_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("ward staff", format!("({ward_id}, {staff_id})")))
}

impl Store {
    pub fn list_ward_staff(&self, ward_id: i64) -> StoreResult<Vec<WardStaff>> {
        fetch_ward(&self.conn, ward_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, ward_id, name, position FROM ward_staff WHERE ward_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([ward_id], staff_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Lists every staff member together with their ward.
    pub fn list_all_ward_staff(&self) -> StoreResult<Vec<WardStaffDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.ward_id, s.name, s.position, w.id, w.hospital_id, w.name
             FROM ward_staff s JOIN ward w ON w.id = s.ward_id
             ORDER BY s.ward_id, s.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WardStaffDetail {
                staff: staff_from_row(row)?,
                ward: crate::models::Ward {
                    id: row.get(4)?,
                    hospital_id: row.get(5)?,
                    name: row.get(6)?,
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_ward_staff(&self, ward_id: i64, staff_id: i64) -> StoreResult<WardStaffDetail> {
        let staff = fetch_staff(&self.conn, ward_id, staff_id)?;
        let ward = fetch_ward(&self.conn, ward_id)?;
        Ok(WardStaffDetail { staff, ward })
    }

    pub fn create_ward_staff(
        &mut self,
        ward_id: i64,
        fields: WardStaffFields,
    ) -> StoreResult<WardStaff> {
        let tx = self.conn.transaction()?;
        fetch_ward(&tx, ward_id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        let id = next_scoped_id(
            &tx,
            "SELECT MAX(id) FROM ward_staff WHERE ward_id = ?1",
            ward_id,
        )?;
        tx.execute(
            "INSERT INTO ward_staff (id, ward_id, name, position) VALUES (?1, ?2, ?3, ?4)",
            params![id, ward_id, fields.name, fields.position],
        )?;
        tx.commit()?;

        tracing::debug!(ward = ward_id, staff = id, "ward staff created");
        Ok(WardStaff {
            id,
            ward_id,
            name: fields.name,
            position: fields.position,
        })
    }

    pub fn update_ward_staff(
        &mut self,
        ward_id: i64,
        staff_id: i64,
        fields: WardStaffFields,
    ) -> StoreResult<WardStaff> {
        let tx = self.conn.transaction()?;
        fetch_staff(&tx, ward_id, staff_id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute(
            "UPDATE ward_staff SET name = ?3, position = ?4 WHERE ward_id = ?1 AND id = ?2",
            params![ward_id, staff_id, fields.name, fields.position],
        )?;
        tx.commit()?;

        Ok(WardStaff {
            id: staff_id,
            ward_id,
            name: fields.name,
            position: fields.position,
        })
    }

    pub fn delete_ward_staff(&mut self, ward_id: i64, staff_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM ward_staff WHERE ward_id = ?1 AND id = ?2",
            params![ward_id, staff_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "ward staff",
                format!("({ward_id}, {staff_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}
