use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{AlertaInput, AlertaPatch};
use crate::types::{parse_time, Priority};

fn time_arg(value: &str) -> Result<NaiveTime, String> {
    parse_time(value).map_err(|e| e.to_string())
}

#[derive(Subcommand)]
pub enum AlertaCommands {
    #[command(about = "Add a deadline alert to a case")]
    Add {
        #[arg(help = "Case ID")]
        caso: i64,
        #[arg(help = "Title")]
        titulo: String,
        #[arg(help = "Due date (YYYY-MM-DD)")]
        vencimiento: NaiveDate,
        #[arg(long, value_parser = time_arg, help = "Time of day (HH:MM)")]
        hora: Option<NaiveTime>,
        #[arg(long, help = "Priority (Alta, Media, Baja)")]
        prioridad: Option<Priority>,
        #[arg(long, help = "Summary")]
        resumen: Option<String>,
    },

    #[command(about = "Update an alert")]
    Update {
        #[arg(help = "Alerta ID")]
        id: i64,
        #[arg(long)]
        titulo: Option<String>,
        #[arg(long)]
        vencimiento: Option<NaiveDate>,
        #[arg(long, value_parser = time_arg)]
        hora: Option<NaiveTime>,
        #[arg(long)]
        prioridad: Option<Priority>,
        #[arg(long)]
        resumen: Option<String>,
    },

    #[command(about = "Mark an alert as done, or as pending again")]
    Toggle {
        #[arg(help = "Alerta ID")]
        id: i64,
    },

    #[command(about = "Delete an alert")]
    Delete {
        #[arg(help = "Alerta ID")]
        id: i64,
    },
}

pub async fn handle(cmd: AlertaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client(None)?;

    match cmd {
        AlertaCommands::Add { caso, titulo, vencimiento, hora, prioridad, resumen } => {
            let input = AlertaInput {
                caso: None,
                titulo,
                resumen: resumen.unwrap_or_default(),
                hora,
                fecha_vencimiento: Some(vencimiento),
                cumplida: false,
                prioridad: prioridad.unwrap_or_default(),
            };
            let alerta = client.create_alerta(caso, &input).await?;
            output_success(
                &output_format,
                &format!("Added alerta {} due {} to case {}", alerta.id, alerta.fecha_vencimiento, alerta.caso),
                Some(json!(alerta)),
            )
        }
        AlertaCommands::Update { id, titulo, vencimiento, hora, prioridad, resumen } => {
            let patch = AlertaPatch {
                titulo,
                resumen,
                hora: hora.map(Some),
                fecha_vencimiento: vencimiento,
                prioridad,
                ..Default::default()
            };
            let alerta = client.update_alerta(id, &patch).await?;
            output_success(&output_format, &format!("Updated alerta {}", id), Some(json!(alerta)))
        }
        AlertaCommands::Toggle { id } => {
            let alerta = client.toggle_alerta(id).await?;
            let state = if alerta.cumplida { "done" } else { "pending" };
            output_success(&output_format, &format!("Alerta {} is now {}", id, state), Some(json!(alerta)))
        }
        AlertaCommands::Delete { id } => {
            client.delete_alerta(id).await?;
            output_success(&output_format, &format!("Deleted alerta {}", id), None)
        }
    }
}
