//! Analysis operations.
//!
//! Analyses carry the same scoped-id rule as diagnoses and may reference the
//! lab that ran them. A submitted lab id must resolve at validation time;
//! deleting a lab later clears the reference at the storage layer.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::labs::lab_from_row;
use super::patients::fetch_patient;
use crate::db::{next_scoped_id, row_exists, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::{Analysis, AnalysisDetail, AnalysisFields};
use crate::validation::Violations;

fn analysis_from_row(row: &Row) -> rusqlite::Result<Analysis> {
    Ok(Analysis {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        lab_id: row.get(2)?,
        kind: row.get(3)?,
        date: row.get(4)?,
        status: row.get(5)?,
    })
}

fn fetch_analysis(conn: &Connection, patient_id: i64, analysis_id: i64) -> StoreResult<Analysis> {
    conn.query_row(
        "SELECT id, patient_id, lab_id, kind, date, status
         FROM analysis WHERE patient_id = ?1 AND id = ?2",
        params![patient_id, analysis_id],
        analysis_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("analysis", format!("({patient_id}, {analysis_id})")))
}

fn validate(conn: &Connection, fields: &AnalysisFields) -> StoreResult<()> {
    let mut violations = Violations::new();
    violations.require_text("kind", &fields.kind);
    if let Some(lab_id) = fields.lab_id {
        if !row_exists(conn, "SELECT 1 FROM lab WHERE id = ?1", [lab_id])? {
            violations.add("lab_id", "unknown lab");
        }
    }
    violations.into_result()
}

fn detail(conn: &Connection, analysis: Analysis) -> StoreResult<AnalysisDetail> {
    let patient = fetch_patient(conn, analysis.patient_id)?;
    let lab = match analysis.lab_id {
        Some(lab_id) => conn
            .query_row("SELECT id, name FROM lab WHERE id = ?1", [lab_id], lab_from_row)
            .optional()?,
        None => None,
    };
    Ok(AnalysisDetail {
        analysis,
        patient,
        lab,
    })
}

impl Store {
    pub fn list_analyses(&self, patient_id: i64) -> StoreResult<Vec<Analysis>> {
        fetch_patient(&self.conn, patient_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, lab_id, kind, date, status
             FROM analysis WHERE patient_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([patient_id], analysis_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Lists every analysis with its patient and lab resolved.
    pub fn list_all_analyses(&self) -> StoreResult<Vec<AnalysisDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, patient_id, lab_id, kind, date, status
             FROM analysis ORDER BY patient_id, id",
        )?;
        let analyses = stmt
            .query_map([], analysis_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        analyses
            .into_iter()
            .map(|a| detail(&self.conn, a))
            .collect()
    }

    pub fn get_analysis(&self, patient_id: i64, analysis_id: i64) -> StoreResult<AnalysisDetail> {
        let analysis = fetch_analysis(&self.conn, patient_id, analysis_id)?;
        detail(&self.conn, analysis)
    }

    pub fn create_analysis(
        &mut self,
        patient_id: i64,
        fields: AnalysisFields,
    ) -> StoreResult<Analysis> {
        let tx = self.conn.transaction()?;
        fetch_patient(&tx, patient_id)?;
        validate(&tx, &fields)?;

        let id = next_scoped_id(
            &tx,
            "SELECT MAX(id) FROM analysis WHERE patient_id = ?1",
            patient_id,
        )?;
        tx.execute(
            "INSERT INTO analysis (id, patient_id, lab_id, kind, date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                patient_id,
                fields.lab_id,
                fields.kind,
                fields.date,
                fields.status
            ],
        )?;
        tx.commit()?;

        tracing::debug!(patient = patient_id, analysis = id, "analysis created");
        Ok(Analysis {
            id,
            patient_id,
            lab_id: fields.lab_id,
            kind: fields.kind,
            date: fields.date,
            status: fields.status,
        })
    }

    pub fn update_analysis(
        &mut self,
        patient_id: i64,
        analysis_id: i64,
        fields: AnalysisFields,
    ) -> StoreResult<Analysis> {
        let tx = self.conn.transaction()?;
        fetch_analysis(&tx, patient_id, analysis_id)?;
        validate(&tx, &fields)?;

        tx.execute(
            "UPDATE analysis SET lab_id = ?3, kind = ?4, date = ?5, status = ?6
             WHERE patient_id = ?1 AND id = ?2",
            params![
                patient_id,
                analysis_id,
                fields.lab_id,
                fields.kind,
                fields.date,
                fields.status
            ],
        )?;
        tx.commit()?;

        Ok(Analysis {
            id: analysis_id,
            patient_id,
            lab_id: fields.lab_id,
            kind: fields.kind,
            date: fields.date,
            status: fields.status,
        })
    }

    pub fn delete_analysis(&mut self, patient_id: i64, analysis_id: i64) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM analysis WHERE patient_id = ?1 AND id = ?2",
            params![patient_id, analysis_id],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found(
                "analysis",
                format!("({patient_id}, {analysis_id})"),
            ));
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::{AnalysisFields, LabFields, PatientFields};
    use crate::Store;

    fn store() -> Store {
        Store::open_in_memory().expect("in-memory store should open")
    }

    fn patient(store: &mut Store) -> i64 {
        store
            .create_patient(PatientFields {
                name: "Ann".into(),
                address: None,
                birthday: NaiveDate::from_ymd_opt(1980, 3, 2).unwrap(),
                gender: None,
            })
            .unwrap()
            .id
    }

    fn blood_panel(lab_id: Option<i64>) -> AnalysisFields {
        AnalysisFields {
            lab_id,
            kind: "Blood panel".into(),
            date: NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
            status: Some("pending".into()),
        }
    }

    #[test]
    fn ids_are_scoped_per_patient() {
        let mut store = store();
        let p = patient(&mut store);
        assert_eq!(store.create_analysis(p, blood_panel(None)).unwrap().id, 1);
        assert_eq!(store.create_analysis(p, blood_panel(None)).unwrap().id, 2);
    }

    #[test]
    fn an_unknown_lab_is_rejected_at_validation_time() {
        let mut store = store();
        let p = patient(&mut store);
        let err = store
            .create_analysis(p, blood_panel(Some(99)))
            .expect_err("unknown lab should fail");
        let fields = err.violations().expect("validation failure");
        assert_eq!(fields[0].field, Some("lab_id"));
        assert!(store.list_analyses(p).unwrap().is_empty());
    }

    #[test]
    fn deleting_a_lab_clears_the_reference_but_keeps_the_analysis() {
        let mut store = store();
        let p = patient(&mut store);
        let lab = store
            .create_lab(LabFields { name: "BioLab".into() })
            .unwrap();
        store.create_analysis(p, blood_panel(Some(lab.id))).unwrap();

        store.delete_lab(lab.id).expect("delete should succeed");

        let detail = store.get_analysis(p, 1).expect("analysis survives");
        assert_eq!(detail.analysis.lab_id, None);
        assert!(detail.lab.is_none());
    }

    #[test]
    fn get_resolves_patient_and_lab_for_display() {
        let mut store = store();
        let p = patient(&mut store);
        let lab = store
            .create_lab(LabFields { name: "BioLab".into() })
            .unwrap();
        store.create_analysis(p, blood_panel(Some(lab.id))).unwrap();

        let detail = store.get_analysis(p, 1).expect("get should succeed");
        assert_eq!(detail.patient.name, "Ann");
        assert_eq!(detail.lab.as_ref().map(|l| l.name.as_str()), Some("BioLab"));
    }

    #[test]
    fn status_is_persisted_as_submitted() {
        let mut store = store();
        let p = patient(&mut store);
        let created = store.create_analysis(p, blood_panel(None)).unwrap();
        assert_eq!(created.status.as_deref(), Some("pending"));

        let updated = store
            .update_analysis(
                p,
                created.id,
                AnalysisFields {
                    status: Some("done".into()),
                    ..blood_panel(None)
                },
            )
            .expect("update should succeed");
        assert_eq!(updated.status.as_deref(), Some("done"));
    }

    #[test]
    fn delete_of_a_missing_analysis_is_not_found() {
        let mut store = store();
        let p = patient(&mut store);
        assert!(store.delete_analysis(p, 4).expect_err("gone").is_not_found());
    }
}
