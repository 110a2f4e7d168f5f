//! Placement (bed) operations.
//!
//! A placement is created unoccupied against a ward; the occupying patient is
//! assigned through an update. Bed numbers are non-negative and unique within
//! their ward. Patient deletion leaves placements behind with the patient
//! reference cleared; ward deletion removes them (see the wards module).

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::patients::patient_from_row;
use super::wards::{fetch_ward, ward_from_row};
use crate::db::{row_exists, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{NewPlacement, Placement, PlacementDetail, PlacementUpdate};
use crate::validation::Violations;

fn placement_from_row(row: &Row) -> rusqlite::Result<Placement> {
    Ok(Placement {
        id: row.get(0)?,
        ward_id: row.get(1)?,
        patient_id: row.get(2)?,
        bed: row.get(3)?,
    })
}

fn fetch_placement(conn: &Connection, id: i64) -> StoreResult<Placement> {
    conn.query_row(
        "SELECT id, ward_id, patient_id, bed FROM placement WHERE id = ?1",
        [id],
        placement_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("placement", id))
}

fn bed_taken(
    conn: &Connection,
    ward_id: i64,
    bed: i64,
    exclude_id: Option<i64>,
) -> rusqlite::Result<bool> {
    row_exists(
        conn,
        "SELECT 1 FROM placement
         WHERE ward_id = ?1 AND bed = ?2 AND (?3 IS NULL OR id <> ?3)",
        params![ward_id, bed, exclude_id],
    )
}

fn detail(conn: &Connection, placement: Placement) -> StoreResult<PlacementDetail> {
    let ward = match placement.ward_id {
        Some(ward_id) => conn
            .query_row(
                "SELECT id, hospital_id, name FROM ward WHERE id = ?1",
                [ward_id],
                ward_from_row,
            )
            .optional()?,
        None => None,
    };
    let patient = match placement.patient_id {
        Some(patient_id) => conn
            .query_row(
                "SELECT id, name, address, birthday, gender FROM patient WHERE id = ?1",
                [patient_id],
                patient_from_row,
            )
            .optional()?,
        None => None,
    };
    Ok(PlacementDetail {
        placement,
        ward,
        patient,
    })
}

impl Store {
    /// Lists the placements of one ward, with their occupants resolved.
    pub fn list_placements(&self, ward_id: i64) -> StoreResult<Vec<PlacementDetail>> {
        fetch_ward(&self.conn, ward_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, ward_id, patient_id, bed FROM placement
             WHERE ward_id = ?1 ORDER BY bed",
        )?;
        let placements = stmt
            .query_map([ward_id], placement_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        placements
            .into_iter()
            .map(|p| detail(&self.conn, p))
            .collect()
    }

    /// Lists every placement across all wards.
    pub fn list_all_placements(&self) -> StoreResult<Vec<PlacementDetail>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, ward_id, patient_id, bed FROM placement ORDER BY id")?;
        let placements = stmt
            .query_map([], placement_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        placements
            .into_iter()
            .map(|p| detail(&self.conn, p))
            .collect()
    }

    pub fn get_placement(&self, id: i64) -> StoreResult<PlacementDetail> {
        let placement = fetch_placement(&self.conn, id)?;
        detail(&self.conn, placement)
    }

    pub fn create_placement(&mut self, ward_id: i64, fields: NewPlacement) -> StoreResult<Placement> {
        let tx = self.conn.transaction()?;
        fetch_ward(&tx, ward_id)?;

        let mut violations = Violations::new();
        if fields.bed < 0 {
            violations.add("bed", "bed number cannot be negative");
        } else if bed_taken(&tx, ward_id, fields.bed, None)? {
            violations.add("bed", "this bed already exists in the ward");
        }
        violations.into_result()?;

        tx.execute(
            "INSERT INTO placement (ward_id, patient_id, bed) VALUES (?1, NULL, ?2)",
            params![ward_id, fields.bed],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(placement = id, ward = ward_id, bed = fields.bed, "placement created");
        Ok(Placement {
            id,
            ward_id: Some(ward_id),
            patient_id: None,
            bed: fields.bed,
        })
    }

    /// Updates a placement's bed number and occupant. The ward is fixed for
    /// the placement's lifetime.
    pub fn update_placement(&mut self, id: i64, fields: PlacementUpdate) -> StoreResult<Placement> {
        let tx = self.conn.transaction()?;
        let placement = fetch_placement(&tx, id)?;

        let mut violations = Violations::new();
        if fields.bed < 0 {
            violations.add("bed", "bed number cannot be negative");
        } else if let Some(ward_id) = placement.ward_id {
            if bed_taken(&tx, ward_id, fields.bed, Some(id))? {
                violations.add("bed", "this bed already exists in the ward");
            }
        }
        if let Some(patient_id) = fields.patient_id {
            if !row_exists(&tx, "SELECT 1 FROM patient WHERE id = ?1", [patient_id])? {
                violations.add("patient_id", "unknown patient");
            }
        }
        violations.into_result()?;

        tx.execute(
            "UPDATE placement SET bed = ?2, patient_id = ?3 WHERE id = ?1",
            params![id, fields.bed, fields.patient_id],
        )?;
        tx.commit()?;

        Ok(Placement {
            id,
            ward_id: placement.ward_id,
            patient_id: fields.patient_id,
            bed: fields.bed,
        })
    }

    pub fn delete_placement(&mut self, id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM placement WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(StoreError::not_found("placement", id));
        }
        tx.commit()?;

        tracing::debug!(placement = id, "placement deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::{
        HospitalFields, NewPlacement, PatientFields, PlacementUpdate, WardFields,
    };
    use crate::Store;

    fn store() -> Store {
        Store::open_in_memory().expect("in-memory store should open")
    }

    fn ward(store: &mut Store) -> i64 {
        let h = store
            .create_hospital(HospitalFields { name: "General".into() })
            .unwrap()
            .id;
        store
            .create_ward(h, WardFields { name: "Cardiology".into() })
            .unwrap()
            .id
    }

    fn patient(store: &mut Store, name: &str) -> i64 {
        store
            .create_patient(PatientFields {
                name: name.into(),
                address: Some("1 Main St".into()),
                birthday: NaiveDate::from_ymd_opt(1990, 5, 4).unwrap(),
                gender: Some("F".into()),
            })
            .expect("create_patient should succeed")
            .id
    }

    #[test]
    fn negative_bed_numbers_are_rejected() {
        let mut store = store();
        let w = ward(&mut store);
        let err = store
            .create_placement(w, NewPlacement { bed: -1 })
            .expect_err("negative bed should fail");
        let fields = err.violations().expect("validation failure");
        assert_eq!(fields[0].field, Some("bed"));
    }

    #[test]
    fn beds_are_unique_within_a_ward() {
        let mut store = store();
        let w = ward(&mut store);
        store.create_placement(w, NewPlacement { bed: 3 }).unwrap();

        let err = store
            .create_placement(w, NewPlacement { bed: 3 })
            .expect_err("duplicate bed should fail");
        assert!(err.violations().is_some());
        assert_eq!(store.list_placements(w).unwrap().len(), 1);
    }

    #[test]
    fn the_same_bed_number_may_exist_in_another_ward() {
        let mut store = store();
        let h = store
            .create_hospital(HospitalFields { name: "General".into() })
            .unwrap()
            .id;
        let first = store
            .create_ward(h, WardFields { name: "Cardiology".into() })
            .unwrap()
            .id;
        let second = store
            .create_ward(h, WardFields { name: "Neurology".into() })
            .unwrap()
            .id;

        store.create_placement(first, NewPlacement { bed: 3 }).unwrap();
        store.create_placement(second, NewPlacement { bed: 3 }).unwrap();
    }

    #[test]
    fn update_assigns_a_patient_and_respects_bed_uniqueness() {
        let mut store = store();
        let w = ward(&mut store);
        let p1 = store.create_placement(w, NewPlacement { bed: 1 }).unwrap();
        let p2 = store.create_placement(w, NewPlacement { bed: 2 }).unwrap();
        let patient_id = patient(&mut store, "Ann");

        let updated = store
            .update_placement(
                p1.id,
                PlacementUpdate {
                    bed: 1,
                    patient_id: Some(patient_id),
                },
            )
            .expect("update should succeed");
        assert_eq!(updated.patient_id, Some(patient_id));

        let err = store
            .update_placement(
                p2.id,
                PlacementUpdate {
                    bed: 1,
                    patient_id: None,
                },
            )
            .expect_err("moving onto an occupied bed number should fail");
        assert!(err.violations().is_some());

        // Keeping its own bed number is not a conflict.
        store
            .update_placement(p2.id, PlacementUpdate { bed: 2, patient_id: None })
            .expect("update keeping its own bed should succeed");
    }

    #[test]
    fn update_rejects_an_unknown_patient() {
        let mut store = store();
        let w = ward(&mut store);
        let p = store.create_placement(w, NewPlacement { bed: 1 }).unwrap();

        let err = store
            .update_placement(
                p.id,
                PlacementUpdate {
                    bed: 1,
                    patient_id: Some(404),
                },
            )
            .expect_err("unknown patient should fail");
        let fields = err.violations().expect("validation failure");
        assert_eq!(fields[0].field, Some("patient_id"));
    }

    #[test]
    fn get_placement_resolves_ward_and_patient() {
        let mut store = store();
        let w = ward(&mut store);
        let p = store.create_placement(w, NewPlacement { bed: 1 }).unwrap();
        let patient_id = patient(&mut store, "Ann");
        store
            .update_placement(
                p.id,
                PlacementUpdate {
                    bed: 1,
                    patient_id: Some(patient_id),
                },
            )
            .unwrap();

        let detail = store.get_placement(p.id).expect("get should succeed");
        assert_eq!(detail.ward.as_ref().map(|w| w.name.as_str()), Some("Cardiology"));
        assert_eq!(detail.patient.as_ref().map(|p| p.name.as_str()), Some("Ann"));
    }

    #[test]
    fn delete_of_a_missing_placement_is_not_found() {
        let mut store = store();
        assert!(store.delete_placement(9).expect_err("gone").is_not_found());
    }
}
