use anyhow::Context;
use clap::{Parser, Subcommand};
use pms_core::{
    config::patient_data_file_from_env_value, CoreConfig, JsonFileStore, PatientService,
    PatientUpdate, Record,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pms")]
#[command(about = "Patient management system CLI")]
struct Cli {
    /// Patient data file (JSON document keyed by patient ID)
    #[arg(long, global = true, env = "PATIENT_DATA_FILE")]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty patient data file if none exists
    Init,
    /// List all patients
    List,
    /// Show one patient
    Get {
        /// Patient ID
        id: String,
    },
    /// List patients ordered by height, weight or age
    Sort {
        /// Field to sort by
        sort_by: String,
        /// asc or dsc (only `desc` sorts descending)
        #[arg(long, default_value = "asc")]
        order: String,
    },
    /// Create a patient from a JSON record (must include "id")
    Create {
        /// Full patient record as JSON
        record: String,
    },
    /// Apply a partial JSON update to a patient
    Update {
        /// Patient ID
        id: String,
        /// Fields to change as JSON; null clears a field
        patch: String,
    },
    /// Delete a patient
    Delete {
        /// Patient ID
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pms_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli, &mut std::io::stdout().lock())
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let data_file = cli.data_file.unwrap_or_else(|| patient_data_file_from_env_value(None));
    let cfg = CoreConfig::new(data_file)?;
    let store = JsonFileStore::new(cfg.patient_data_file());
    let service = PatientService::new(Arc::new(store.clone()));

    match cli.command {
        Some(Commands::Init) => {
            if store.initialise()? {
                writeln!(out, "Created {}", store.path().display())?;
            } else {
                writeln!(out, "{} already exists", store.path().display())?;
            }
        }
        Some(Commands::List) => {
            let patients = service.list()?;
            if patients.is_empty() {
                writeln!(out, "No patients found.")?;
            } else {
                writeln!(out, "{}", serde_json::to_string_pretty(&patients)?)?;
            }
        }
        Some(Commands::Get { id }) => {
            let patient = service.get(&id)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&patient)?)?;
        }
        Some(Commands::Sort { sort_by, order }) => {
            let patients = service.sort(&sort_by, &order)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&patients)?)?;
        }
        Some(Commands::Create { record }) => {
            let candidate: Record =
                serde_json::from_str(&record).context("record must be a JSON object")?;
            let id = service.create(&candidate)?;
            writeln!(out, "Created patient {}", id)?;
        }
        Some(Commands::Update { id, patch }) => {
            let patch: PatientUpdate =
                serde_json::from_str(&patch).context("patch must be a JSON object")?;
            service.update(&id, &patch)?;
            writeln!(out, "Updated patient {}", id)?;
        }
        Some(Commands::Delete { id }) => {
            service.delete(&id)?;
            writeln!(out, "Deleted patient {}", id)?;
        }
        None => {
            writeln!(out, "Use 'pms --help' for commands")?;
        }
    }

    Ok(())
}
