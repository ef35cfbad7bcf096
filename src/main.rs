use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pms_core::{
    config::patient_data_file_from_env_value, CoreConfig, JsonFileStore, PatientService,
};

/// Default REST bind address when `PMS_REST_ADDR` is not set.
const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Main entry point for the patient management service
///
/// Resolves configuration once, then serves the REST API.
///
/// # Environment Variables
/// - `PMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_FILE`: JSON document holding the patient records (default: "patients.json")
///
/// A `.env` file in the working directory is loaded first if present.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the patient data file is misconfigured or does not exist,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pms_run=info".parse()?)
                .add_directive("pms_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PMS_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let data_file = patient_data_file_from_env_value(std::env::var("PATIENT_DATA_FILE").ok());
    let cfg = CoreConfig::new(data_file)?;
    let data_path: &Path = cfg.patient_data_file();
    if !data_path.is_file() {
        anyhow::bail!(
            "Patient data file does not exist: {} (create it with `pms init`)",
            data_path.display()
        );
    }

    tracing::info!("++ Using patient data file {}", data_path.display());
    tracing::info!("++ Starting PMS REST on {}", rest_addr);

    let store = JsonFileStore::new(data_path);
    let app = api_rest::router(PatientService::new(Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
