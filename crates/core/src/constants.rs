//! Constants used throughout the core crate.
//!
//! Field names are shared by validation, the patch merge, the derived-field view and the sort
//! query so the persisted document layout is defined in one place.

/// Default location of the patient data document when none is configured.
pub const DEFAULT_PATIENT_DATA_FILE: &str = "patients.json";

/// Document written by `JsonFileStore::initialise` when no data file exists yet.
pub const EMPTY_DOCUMENT: &str = "{}";

pub const ID_FIELD: &str = "id";
pub const NAME_FIELD: &str = "name";
pub const AGE_FIELD: &str = "age";
pub const EMAIL_FIELD: &str = "email";
pub const GENDER_FIELD: &str = "gender";
pub const CITY_FIELD: &str = "city";
pub const DISEASE_FIELD: &str = "disease";
pub const HEIGHT_FIELD: &str = "height";
pub const WEIGHT_FIELD: &str = "weight";

/// Derived fields. Never persisted; stripped from stored records on read.
pub const BMI_FIELD: &str = "bmi";
pub const VERDICT_FIELD: &str = "verdict";

/// Fields accepted by the sort query, in the order they are reported.
pub const SORTABLE_FIELDS: [&str; 3] = ["height", "weight", "age"];

/// Order tokens accepted by the sort query, in the order they are reported.
pub const SORT_ORDERS: [&str; 2] = ["asc", "dsc"];
