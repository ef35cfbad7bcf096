use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("patient with this ID already exists: {0}")]
    Conflict(String),
    #[error("invalid patient record: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    InvalidArgument(String),

    #[error("patient data unavailable ({location}): {reason}")]
    StorageUnavailable { location: String, reason: String },
    #[error("failed to write patient data: {0}")]
    StorageWrite(std::io::Error),
    #[error("failed to serialise patient data: {0}")]
    Serialization(serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ValidationErrors> for PatientError {
    fn from(errors: ValidationErrors) -> Self {
        PatientError::Validation(errors)
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
