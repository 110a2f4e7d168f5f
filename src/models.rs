//! Row, detail and input types for the clinical records schema.
//!
//! Row structs mirror the persisted tables one to one. Detail structs bundle a
//! row with the related rows a display layer needs alongside it. Fields
//! structs carry exactly the columns a create or update operation may set —
//! keys and parent ids are never reassignable through them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
}

/// Phone book entry of a hospital. `phone_id` is scoped to the hospital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalPhone {
    pub hospital_id: i64,
    pub phone_id: i64,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lab {
    pub id: i64,
    pub name: String,
}

/// Phone book entry of a lab. `phone_id` is scoped to the lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabPhone {
    pub lab_id: i64,
    pub phone_id: i64,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub id: i64,
    pub hospital_id: i64,
    pub name: String,
}

/// Staff member of a ward. `id` is scoped to the ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardStaff {
    pub id: i64,
    pub ward_id: i64,
    pub name: String,
    pub position: Option<String>,
}

/// A bed slot within a ward, optionally occupied by a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub ward_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub bed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub birthday: NaiveDate,
    pub gender: Option<String>,
}

/// Diagnosis of a patient. `id` is scoped to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: i64,
    pub patient_id: i64,
    pub kind: String,
    pub complications: Option<String>,
    pub details: Option<String>,
}

/// Lab analysis of a patient. `id` is scoped to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub patient_id: i64,
    pub lab_id: Option<i64>,
    pub kind: String,
    pub date: NaiveDate,
    pub status: Option<String>,
}

// ============================================================================
// DETAIL ROWS (eagerly-joined related rows for display)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardDetail {
    pub ward: Ward,
    pub hospital: Hospital,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardStaffDetail {
    pub staff: WardStaff,
    pub ward: Ward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDetail {
    pub placement: Placement,
    pub ward: Option<Ward>,
    pub patient: Option<Patient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisDetail {
    pub diagnosis: Diagnosis,
    pub patient: Patient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDetail {
    pub analysis: Analysis,
    pub patient: Patient,
    pub lab: Option<Lab>,
}

// ============================================================================
// INPUT FIELDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalFields {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabFields {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardFields {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardStaffFields {
    pub name: String,
    pub position: Option<String>,
}

/// Fields for creating a placement. New placements are always unoccupied; a
/// patient is assigned through [`PlacementUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlacement {
    pub bed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementUpdate {
    pub bed: i64,
    pub patient_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorFields {
    pub name: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFields {
    pub name: String,
    pub address: Option<String>,
    pub birthday: NaiveDate,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisFields {
    pub kind: String,
    pub complications: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFields {
    pub lab_id: Option<i64>,
    pub kind: String,
    pub date: NaiveDate,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneFields {
    pub number: String,
}
