use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{ActuacionInput, ActuacionPatch};

#[derive(Subcommand)]
pub enum ActuacionCommands {
    #[command(about = "Record a procedural action on a case")]
    Add {
        #[arg(help = "Case ID")]
        caso: i64,
        #[arg(help = "Description")]
        descripcion: String,
        #[arg(long, help = "Date (YYYY-MM-DD), defaults to today")]
        fecha: Option<NaiveDate>,
        #[arg(long, help = "Kind of action, e.g. Escrito, Audiencia")]
        tipo: Option<String>,
    },

    #[command(about = "Update an action")]
    Update {
        #[arg(help = "Actuacion ID")]
        id: i64,
        #[arg(long)]
        descripcion: Option<String>,
        #[arg(long)]
        fecha: Option<NaiveDate>,
        #[arg(long)]
        tipo: Option<String>,
    },

    #[command(about = "Delete an action")]
    Delete {
        #[arg(help = "Actuacion ID")]
        id: i64,
    },
}

pub async fn handle(cmd: ActuacionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client(None)?;

    match cmd {
        ActuacionCommands::Add { caso, descripcion, fecha, tipo } => {
            let input = ActuacionInput {
                caso: None,
                fecha: Some(fecha.unwrap_or_else(|| chrono::Local::now().date_naive())),
                descripcion,
                tipo: tipo.unwrap_or_default(),
            };
            let actuacion = client.create_actuacion(caso, &input).await?;
            output_success(
                &output_format,
                &format!("Added actuacion {} to case {}", actuacion.id, actuacion.caso),
                Some(json!(actuacion)),
            )
        }
        ActuacionCommands::Update { id, descripcion, fecha, tipo } => {
            let patch = ActuacionPatch { caso: None, fecha, descripcion, tipo };
            let actuacion = client.update_actuacion(id, &patch).await?;
            output_success(&output_format, &format!("Updated actuacion {}", id), Some(json!(actuacion)))
        }
        ActuacionCommands::Delete { id } => {
            client.delete_actuacion(id).await?;
            output_success(&output_format, &format!("Deleted actuacion {}", id), None)
        }
    }
}
