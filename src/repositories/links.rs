//! Many-to-many link operations.
//!
//! Three association families: hospital↔doctor, hospital↔lab and
//! doctor↔patient. A link row is nothing but its two foreign keys. Linking an
//! already-linked pair is silently idempotent; unlinking an absent pair is
//! NotFound. The candidates listings anti-join the link table so a selection
//! input only offers rows not yet linked.

use crate::db::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{Doctor, Lab, Patient};

use super::doctors::{doctor_from_row, fetch_doctor};
use super::hospitals::fetch_hospital;
use super::labs::{fetch_lab, lab_from_row};
use super::patients::{fetch_patient, patient_from_row};

impl Store {
    // ------------------------------------------------------------------
    // hospital ↔ doctor
    // ------------------------------------------------------------------

    /// Doctors currently attached to a hospital.
    pub fn list_hospital_doctors(&self, hospital_id: i64) -> StoreResult<Vec<Doctor>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, d.specialty
             FROM doctor d JOIN hospital_doctor hd ON hd.doctor_id = d.id
             WHERE hd.hospital_id = ?1 ORDER BY d.id",
        )?;
        let rows = stmt.query_map([hospital_id], doctor_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Doctors not yet attached to a hospital, for new-link selection.
    pub fn available_doctors(&self, hospital_id: i64) -> StoreResult<Vec<Doctor>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, d.specialty FROM doctor d
             WHERE NOT EXISTS (
                 SELECT 1 FROM hospital_doctor hd
                 WHERE hd.doctor_id = d.id AND hd.hospital_id = ?1
             )
             ORDER BY d.id",
        )?;
        let rows = stmt.query_map([hospital_id], doctor_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn link_hospital_doctor(&mut self, hospital_id: i64, doctor_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, hospital_id)?;
        fetch_doctor(&tx, doctor_id)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO hospital_doctor (hospital_id, doctor_id) VALUES (?1, ?2)",
            [hospital_id, doctor_id],
        )?;
        tx.commit()?;

        if inserted == 0 {
            tracing::debug!(hospital = hospital_id, doctor = doctor_id, "link already present");
        }
        Ok(())
    }

    pub fn unlink_hospital_doctor(&mut self, hospital_id: i64, doctor_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM hospital_doctor WHERE hospital_id = ?1 AND doctor_id = ?2",
            [hospital_id, doctor_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "hospital-doctor link",
                format!("({hospital_id}, {doctor_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // hospital ↔ lab
    // ------------------------------------------------------------------

    /// Labs currently attached to a hospital.
    pub fn list_hospital_labs(&self, hospital_id: i64) -> StoreResult<Vec<Lab>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.name
             FROM lab l JOIN hospital_lab hl ON hl.lab_id = l.id
             WHERE hl.hospital_id = ?1 ORDER BY l.id",
        )?;
        let rows = stmt.query_map([hospital_id], lab_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Labs not yet attached to a hospital.
    pub fn available_labs(&self, hospital_id: i64) -> StoreResult<Vec<Lab>> {
        fetch_hospital(&self.conn, hospital_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.name FROM lab l
             WHERE NOT EXISTS (
                 SELECT 1 FROM hospital_lab hl
                 WHERE hl.lab_id = l.id AND hl.hospital_id = ?1
             )
             ORDER BY l.id",
        )?;
        let rows = stmt.query_map([hospital_id], lab_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn link_hospital_lab(&mut self, hospital_id: i64, lab_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_hospital(&tx, hospital_id)?;
        fetch_lab(&tx, lab_id)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO hospital_lab (hospital_id, lab_id) VALUES (?1, ?2)",
            [hospital_id, lab_id],
        )?;
        tx.commit()?;

        if inserted == 0 {
            tracing::debug!(hospital = hospital_id, lab = lab_id, "link already present");
        }
        Ok(())
    }

    pub fn unlink_hospital_lab(&mut self, hospital_id: i64, lab_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM hospital_lab WHERE hospital_id = ?1 AND lab_id = ?2",
            [hospital_id, lab_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "hospital-lab link",
                format!("({hospital_id}, {lab_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // doctor ↔ patient
    // ------------------------------------------------------------------

    /// Patients currently seen by a doctor.
    pub fn list_doctor_patients(&self, doctor_id: i64) -> StoreResult<Vec<Patient>> {
        fetch_doctor(&self.conn, doctor_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.address, p.birthday, p.gender
             FROM patient p JOIN doctor_patient dp ON dp.patient_id = p.id
             WHERE dp.doctor_id = ?1 ORDER BY p.id",
        )?;
        let rows = stmt.query_map([doctor_id], patient_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Patients not yet seen by a doctor.
    pub fn available_patients(&self, doctor_id: i64) -> StoreResult<Vec<Patient>> {
        fetch_doctor(&self.conn, doctor_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.address, p.birthday, p.gender FROM patient p
             WHERE NOT EXISTS (
                 SELECT 1 FROM doctor_patient dp
                 WHERE dp.patient_id = p.id AND dp.doctor_id = ?1
             )
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map([doctor_id], patient_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn link_doctor_patient(&mut self, doctor_id: i64, patient_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        fetch_doctor(&tx, doctor_id)?;
        fetch_patient(&tx, patient_id)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO doctor_patient (doctor_id, patient_id) VALUES (?1, ?2)",
            [doctor_id, patient_id],
        )?;
        tx.commit()?;

        if inserted == 0 {
            tracing::debug!(doctor = doctor_id, patient = patient_id, "link already present");
        }
        Ok(())
    }

    pub fn unlink_doctor_patient(&mut self, doctor_id: i64, patient_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM doctor_patient WHERE doctor_id = ?1 AND patient_id = ?2",
            [doctor_id, patient_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "doctor-patient link",
                format!("({doctor_id}, {patient_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::{DoctorFields, HospitalFields, LabFields, PatientFields};
    use crate::Store;

    fn store() -> Store {
        Store::open_in_memory().expect("in-memory store should open")
    }

    fn hospital(store: &mut Store) -> i64 {
        store
            .create_hospital(HospitalFields { name: "General".into() })
            .unwrap()
            .id
    }

    fn doctor(store: &mut Store, name: &str) -> i64 {
        store
            .create_doctor(DoctorFields {
                name: name.into(),
                specialty: None,
            })
            .unwrap()
            .id
    }

    fn patient(store: &mut Store, name: &str) -> i64 {
        store
            .create_patient(PatientFields {
                name: name.into(),
                address: None,
                birthday: NaiveDate::from_ymd_opt(1975, 8, 9).unwrap(),
                gender: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn linking_twice_is_idempotent() {
        let mut store = store();
        let h = hospital(&mut store);
        let d = doctor(&mut store, "Dr. Grey");

        store.link_hospital_doctor(h, d).expect("first link should succeed");
        store.link_hospital_doctor(h, d).expect("re-link should be a no-op");

        assert_eq!(store.list_hospital_doctors(h).unwrap().len(), 1);
    }

    #[test]
    fn candidates_exclude_already_linked_rows() {
        let mut store = store();
        let h = hospital(&mut store);
        let linked = doctor(&mut store, "Dr. Grey");
        let free = doctor(&mut store, "Dr. Shepherd");
        store.link_hospital_doctor(h, linked).unwrap();

        let available = store.available_doctors(h).unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, free);
    }

    #[test]
    fn unlinking_an_absent_pair_is_not_found() {
        let mut store = store();
        let h = hospital(&mut store);
        let d = doctor(&mut store, "Dr. Grey");

        assert!(store
            .unlink_hospital_doctor(h, d)
            .expect_err("nothing to unlink")
            .is_not_found());
    }

    #[test]
    fn linking_against_missing_parents_is_not_found() {
        let mut store = store();
        let h = hospital(&mut store);

        assert!(store.link_hospital_doctor(h, 99).expect_err("no doctor").is_not_found());
        assert!(store.link_hospital_doctor(99, 1).expect_err("no hospital").is_not_found());
    }

    #[test]
    fn hospital_lab_links_roundtrip() {
        let mut store = store();
        let h = hospital(&mut store);
        let lab = store.create_lab(LabFields { name: "BioLab".into() }).unwrap();

        store.link_hospital_lab(h, lab.id).unwrap();
        assert_eq!(store.list_hospital_labs(h).unwrap().len(), 1);
        assert!(store.available_labs(h).unwrap().is_empty());

        store.unlink_hospital_lab(h, lab.id).unwrap();
        assert_eq!(store.available_labs(h).unwrap().len(), 1);
    }

    #[test]
    fn doctor_patient_links_roundtrip() {
        let mut store = store();
        let d = doctor(&mut store, "Dr. Grey");
        let p = patient(&mut store, "Ann");

        store.link_doctor_patient(d, p).unwrap();
        assert_eq!(store.list_doctor_patients(d).unwrap().len(), 1);
        assert!(store.available_patients(d).unwrap().is_empty());

        store.unlink_doctor_patient(d, p).unwrap();
        assert!(store.list_doctor_patients(d).unwrap().is_empty());
    }

    #[test]
    fn deleting_a_doctor_removes_its_links() {
        let mut store = store();
        let h = hospital(&mut store);
        let d = doctor(&mut store, "Dr. Grey");
        let p = patient(&mut store, "Ann");
        store.link_hospital_doctor(h, d).unwrap();
        store.link_doctor_patient(d, p).unwrap();

        store.delete_doctor(d).expect("delete should succeed");

        assert!(store.list_hospital_doctors(h).unwrap().is_empty());
        assert!(store.get_patient(p).is_ok(), "patient itself survives");
    }
}
