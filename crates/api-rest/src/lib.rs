//! # API REST
//!
//! REST API for the patient management service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (status codes, JSON error bodies, CORS)
//!
//! All record semantics live in `pms-core`; handlers only translate between HTTP and
//! [`PatientService`] calls.

#![warn(rust_2018_idioms)]

mod error;

pub use error::{ApiError, ErrorRes};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use pms_core::{
    FieldViolation, Patient, PatientListing, PatientService, PatientUpdate, PatientView, Record,
    Verdict,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    patient_service: PatientService,
}

/// Plain acknowledgement or informational message
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct MessageRes {
    #[schema(example = "Patient added successfully")]
    pub message: String,
}

impl MessageRes {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Query parameters of the sort endpoint
#[derive(serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortQuery {
    /// Field to sort patients by: height, weight or age
    sort_by: String,
    /// Sort in asc or dsc order
    #[param(default = "asc")]
    order: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        home,
        about,
        health,
        list_patients,
        get_patient,
        sort_patients,
        create_patient,
        update_patient,
        delete_patient,
    ),
    components(schemas(
        MessageRes,
        HealthRes,
        ErrorRes,
        Patient,
        PatientUpdate,
        FieldViolation,
        Verdict,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `patient_service`.
///
/// Includes the Swagger UI at `/swagger-ui` and the OpenAPI document at
/// `/api-docs/openapi.json`.
pub fn router(patient_service: PatientService) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/sort", get(sort_patients))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { patient_service })
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service name", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn home() -> Json<MessageRes> {
    MessageRes::new("Patient Management System")
}

#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "Service description", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn about() -> Json<MessageRes> {
    MessageRes::new(
        "A fully functional patient management system that records patient details",
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancer checks
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "PMS REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients keyed by ID, with bmi and verdict", body = std::collections::HashMap<String, Patient>),
        (status = 500, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// List all patients
///
/// # Errors
/// Returns `500 Internal Server Error` if the patient data cannot be read.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> Result<Json<PatientListing>, ApiError> {
    Ok(Json(state.patient_service.list()?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(
        ("id" = String, Path, description = "The ID of the patient", example = "P001")
    ),
    responses(
        (status = 200, description = "Patient with bmi and verdict", body = Patient),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientView>, ApiError> {
    Ok(Json(state.patient_service.get(&id)?))
}

#[utoipa::path(
    get,
    path = "/sort",
    params(SortQuery),
    responses(
        (status = 200, description = "Patients ordered by the requested field", body = [Patient]),
        (status = 400, description = "Invalid sort field or order", body = ErrorRes)
    )
)]
/// Sort patients by height, weight or age
///
/// Only the literal order `desc` sorts descending; `dsc` is accepted and sorts ascending.
#[axum::debug_handler]
async fn sort_patients(
    State(state): State<AppState>,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> Result<Json<Vec<PatientView>>, ApiError> {
    let Query(query) = query?;
    let order = query.order.as_deref().unwrap_or("asc");
    Ok(Json(state.patient_service.sort(&query.sort_by, order)?))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = Patient,
    responses(
        (status = 201, description = "Patient created", body = MessageRes),
        (status = 400, description = "Patient with this ID already exists", body = ErrorRes),
        (status = 422, description = "Patient record failed validation", body = ErrorRes)
    )
)]
/// Create a new patient record
///
/// # Errors
/// Returns `400 Bad Request` if the ID is taken and `422 Unprocessable Entity` if any field
/// constraint fails.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let Json(candidate) = payload?;
    state.patient_service.create(&candidate)?;
    Ok((
        StatusCode::CREATED,
        MessageRes::new("Patient added successfully"),
    ))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(
        ("id" = String, Path, description = "The ID of the patient", example = "P001")
    ),
    request_body = PatientUpdate,
    responses(
        (status = 201, description = "Patient updated", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 422, description = "Merged record failed validation", body = ErrorRes)
    )
)]
/// Partially update a patient record
///
/// Supplied fields overwrite the stored values; `null` clears a field. The merged record is
/// validated as a whole.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let Json(patch) = payload?;
    state.patient_service.update(&id, &patch)?;
    Ok((
        StatusCode::CREATED,
        MessageRes::new("Patient updated successfully"),
    ))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(
        ("id" = String, Path, description = "The ID of the patient", example = "P001")
    ),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageRes>, ApiError> {
    state.patient_service.delete(&id)?;
    Ok(MessageRes::new("Patient deleted successfully"))
}
