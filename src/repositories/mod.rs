//! Per-entity store operations.
//!
//! Each module adds one entity family's operations to [`crate::Store`] as an
//! `impl` block: listing children of a parent, fetching one row with its
//! display joins, and validated create/update/delete inside one transaction.

mod analyses;
mod diagnoses;
mod doctors;
mod hospitals;
mod labs;
mod links;
mod patients;
mod placements;
mod ward_staff;
mod wards;
