use clap::Subcommand;
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{NotaInput, NotaPatch};

#[derive(Subcommand)]
pub enum NotaCommands {
    #[command(about = "Add a strategic note to a case")]
    Add {
        #[arg(help = "Case ID")]
        caso: i64,
        #[arg(help = "Title")]
        titulo: String,
        #[arg(long, help = "Body text")]
        contenido: Option<String>,
        #[arg(long, help = "Tag")]
        etiqueta: Option<String>,
    },

    #[command(about = "Update a note")]
    Update {
        #[arg(help = "Nota ID")]
        id: i64,
        #[arg(long)]
        titulo: Option<String>,
        #[arg(long)]
        contenido: Option<String>,
        #[arg(long)]
        etiqueta: Option<String>,
    },

    #[command(about = "Delete a note")]
    Delete {
        #[arg(help = "Nota ID")]
        id: i64,
    },
}

pub async fn handle(cmd: NotaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client(None)?;

    match cmd {
        NotaCommands::Add { caso, titulo, contenido, etiqueta } => {
            let input = NotaInput {
                caso: None,
                titulo,
                contenido: contenido.unwrap_or_default(),
                etiqueta: etiqueta.unwrap_or_default(),
            };
            let nota = client.create_nota(caso, &input).await?;
            output_success(
                &output_format,
                &format!("Added nota {} to case {}", nota.id, nota.caso),
                Some(json!(nota)),
            )
        }
        NotaCommands::Update { id, titulo, contenido, etiqueta } => {
            let patch = NotaPatch { caso: None, titulo, contenido, etiqueta };
            let nota = client.update_nota(id, &patch).await?;
            output_success(&output_format, &format!("Updated nota {}", id), Some(json!(nota)))
        }
        NotaCommands::Delete { id } => {
            client.delete_nota(id).await?;
            output_success(&output_format, &format!("Deleted nota {}", id), None)
        }
    }
}
