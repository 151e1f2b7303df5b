pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "caseflow")]
#[command(about = "Caseflow CLI - Command-line interface for the Caseflow case management API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, conflicts_with = "json", help = "Output in human-readable text format (default)")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Show case statistics, recent cases and alerts")]
    Dashboard,

    #[command(about = "Case (expediente) management")]
    Cases {
        #[command(subcommand)]
        cmd: commands::cases::CaseCommands,
    },

    #[command(about = "Procedural actions recorded on a case")]
    Actuacion {
        #[command(subcommand)]
        cmd: commands::actuacion::ActuacionCommands,
    },

    #[command(about = "Deadline alerts on a case")]
    Alerta {
        #[command(subcommand)]
        cmd: commands::alerta::AlertaCommands,
    },

    #[command(about = "Strategic notes on a case")]
    Nota {
        #[command(subcommand)]
        cmd: commands::nota::NotaCommands,
    },

    #[command(about = "User administration (administrators only)")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json && !cli.text {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Dashboard => commands::dashboard::handle(output_format).await,
        Commands::Cases { cmd } => commands::cases::handle(cmd, output_format).await,
        Commands::Actuacion { cmd } => commands::actuacion::handle(cmd, output_format).await,
        Commands::Alerta { cmd } => commands::alerta::handle(cmd, output_format).await,
        Commands::Nota { cmd } => commands::nota::handle(cmd, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, output_format).await,
    }
}
