//! Lab operations.
//!
//! Labs mirror hospitals structurally: a root entity with a scoped-id phone
//! book. Deleting a lab clears `analysis.lab_id` and removes its hospital
//! links and phones at the storage layer.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{next_scoped_id, row_exists, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{Lab, LabFields, LabPhone, PhoneFields};
use crate::validation::Violations;

pub(crate) fn lab_from_row(row: &Row) -> rusqlite::Result<Lab> {
    Ok(Lab {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub(crate) fn fetch_lab(conn: &Connection, id: i64) -> StoreResult<Lab> {
    conn.query_row("SELECT id, name FROM lab WHERE id = ?1", [id], lab_from_row)
        .optional()?
        .ok_or_else(|| StoreError::not_found("lab", id))
}

fn phone_from_row(row: &Row) -> rusqlite::Result<LabPhone> {
    Ok(LabPhone {
        lab_id: row.get(0)?,
        phone_id: row.get(1)?,
        number: row.get(2)?,
    })
}

impl Store {
    pub fn list_labs(&self) -> StoreResult<Vec<Lab>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM lab ORDER BY id")?;
        let rows = stmt.query_map([], lab_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_lab(&self, id: i64) -> StoreResult<Lab> {
        fetch_lab(&self.conn, id)
    }

    pub fn create_lab(&mut self, fields: LabFields) -> StoreResult<Lab> {
        let tx = self.conn.transaction()?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute("INSERT INTO lab (name) VALUES (?1)", [&fields.name])?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(lab = id, "lab created");
        Ok(Lab {
            id,
            name: fields.name,
        })
    }

    pub fn update_lab(&mut self, id: i64, fields: LabFields) -> StoreResult<Lab> {
        let tx = self.conn.transaction()?;
        fetch_lab(&tx, id)?;

        let mut violations = Violations::new();
        violations.require_text("name", &fields.name);
        violations.into_result()?;

        tx.execute(
            "UPDATE lab SET name = ?2 WHERE id = ?1",
            params![id, fields.name],
        )?;
        tx.commit()?;

        Ok(Lab {
            id,
            name: fields.name,
        })
    }

    pub fn delete_lab(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_lab(&tx, id)?;
        tx.execute("DELETE FROM lab WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::debug!(lab = id, "lab deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phone book
    // ------------------------------------------------------------------

    pub fn list_lab_phones(&self, lab_id: i64) -> StoreResult<Vec<LabPhone>> {
        fetch_lab(&self.conn, lab_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT lab_id, phone_id, number FROM lab_phone WHERE lab_id = ?1 ORDER BY phone_id",
        )?;
        let rows = stmt.query_map([lab_id], phone_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_lab_phone(&mut self, lab_id: i64, fields: PhoneFields) -> StoreResult<LabPhone> {
        let tx = self.conn.transaction()?;
        fetch_lab(&tx, lab_id)?;

        let mut violations = Violations::new();
        violations.require_text("number", &fields.number);
        violations.into_result()?;

        let phone_id = next_scoped_id(
            &tx,
            "SELECT MAX(phone_id) FROM lab_phone WHERE lab_id = ?1",
            lab_id,
        )?;
        tx.execute(
            "INSERT INTO lab_phone (lab_id, phone_id, number) VALUES (?1, ?2, ?3)",
            params![lab_id, phone_id, fields.number],
        )?;
        tx.commit()?;

        Ok(LabPhone {
            lab_id,
            phone_id,
            number: fields.number,
        })
    }

    pub fn update_lab_phone(
        &mut self,
        lab_id: i64,
        phone_id: i64,
        fields: PhoneFields,
    ) -> StoreResult<LabPhone> {
        let tx = self.conn.transaction()?;
        if !row_exists(
            &tx,
            "SELECT 1 FROM lab_phone WHERE lab_id = ?1 AND phone_id = ?2",
            params![lab_id, phone_id],
        )? {
            return Err(StoreError::not_found(
                "lab phone",
                format!("({lab_id}, {phone_id})"),
            ));
        }

        let mut violations = Violations::new();
        violations.require_text("number", &fields.number);
        violations.into_result()?;

        tx.execute(
            "UPDATE lab_phone SET number = ?3 WHERE lab_id = ?1 AND phone_id = ?2",
            params![lab_id, phone_id, fields.number],
        )?;
        tx.commit()?;

        Ok(LabPhone {
            lab_id,
            phone_id,
            number: fields.number,
        })
    }

    pub fn remove_lab_phone(&mut self, lab_id: i64, phone_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM lab_phone WHERE lab_id = ?1 AND phone_id = ?2",
            params![lab_id, phone_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "lab phone",
                format!("({lab_id}, {phone_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{LabFields, PhoneFields};
    use crate::Store;

    fn store() -> Store {
        Store::open_in_memory().expect("in-memory store should open")
    }

    #[test]
    fn crud_roundtrip() {
        let mut store = store();
        let lab = store
            .create_lab(LabFields { name: "BioLab".into() })
            .expect("create should succeed");

        let updated = store
            .update_lab(lab.id, LabFields { name: "BioLab North".into() })
            .expect("update should succeed");
        assert_eq!(updated.name, "BioLab North");

        store.delete_lab(lab.id).expect("delete should succeed");
        assert!(store.get_lab(lab.id).expect_err("gone").is_not_found());
    }

    #[test]
    fn phone_ids_are_scoped_per_lab() {
        let mut store = store();
        let first = store.create_lab(LabFields { name: "BioLab".into() }).unwrap();
        let second = store.create_lab(LabFields { name: "ChemLab".into() }).unwrap();

        assert_eq!(
            store
                .add_lab_phone(first.id, PhoneFields { number: "11".into() })
                .unwrap()
                .phone_id,
            1
        );
        assert_eq!(
            store
                .add_lab_phone(second.id, PhoneFields { number: "21".into() })
                .unwrap()
                .phone_id,
            1
        );
    }

    #[test]
    fn deleting_a_lab_removes_its_phones() {
        let mut store = store();
        let lab = store.create_lab(LabFields { name: "BioLab".into() }).unwrap();
        store
            .add_lab_phone(lab.id, PhoneFields { number: "11".into() })
            .unwrap();

        store.delete_lab(lab.id).expect("delete should succeed");
        assert!(store
            .list_lab_phones(lab.id)
            .expect_err("parent gone")
            .is_not_found());
    }
}
