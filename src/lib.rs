//! # Clinic Store
//!
//! Core persistence and validation logic for a hospital administration system.
//!
//! This crate contains pure data operations over an embedded relational store:
//! - CRUD over hospitals, wards, beds/placements, staff, doctors, patients,
//!   diagnoses, analyses and labs
//! - Many-to-many links (hospital↔doctor, hospital↔lab, doctor↔patient) with
//!   anti-join candidate listings
//! - Uniqueness and referential fix-up rules enforced inside one transaction
//!   per operation
//!
//! **No API concerns**: HTTP routing, form binding and view rendering belong to
//! the presentation layer consuming this crate, not here.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod validation;

pub use config::StoreConfig;
pub use db::Store;
pub use error::{StoreError, StoreResult};
pub use validation::FieldError;
