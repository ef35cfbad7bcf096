//! # PMS Core
//!
//! Core business logic for the patient management service.
//!
//! This crate contains pure data operations:
//! - Patient validation and derived health metrics (BMI and verdict)
//! - Partial-update merge with whole-record re-validation
//! - Listing, lookup and sort queries
//! - Whole-snapshot persistence behind the [`RecordStore`] trait
//!
//! **No API concerns**: HTTP routing, status codes and response bodies belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patch;
pub mod patient;
pub mod service;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use constants::DEFAULT_PATIENT_DATA_FILE;
pub use error::{PatientError, PatientResult};
pub use patch::{PatchField, PatientUpdate};
pub use patient::{Patient, PatientView, Verdict};
pub use service::{PatientListing, PatientService, SortField, SortOrder};
pub use store::{JsonFileStore, MemoryStore, Record, RecordStore, Snapshot};
pub use validation::{FieldViolation, ValidationErrors};

pub use pms_types::{Age, EmailAddress, Height, PatientId, TypeError, Weight};
