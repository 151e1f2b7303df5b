use clap::Subcommand;
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::{output_error, output_record, output_success, prompt};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "API base URL, e.g. http://localhost:8000/api")]
        server: Option<String>,
    },

    #[command(about = "Logout and forget stored tokens")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password, server } => {
            let client = build_client(server)?;
            let password = match password {
                Some(password) => password,
                None => prompt("Password")?,
            };

            let response = client.login(&username, &password).await?;
            output_success(
                &output_format,
                &format!("Logged in as '{}' on {}", response.user.username, client.base_url()),
                Some(json!({ "user": response.user })),
            )
        }
        AuthCommands::Logout => {
            build_client(None)?.logout()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => match build_client(None)?.current_user().await? {
            Some(user) => output_record(&output_format, &user, |user| {
                println!("{} (id {})", user.username, user.id);
                if user.is_admin {
                    println!("Role: administrator");
                }
            }),
            None => output_error(&output_format, "Not logged in", Some("NOT_AUTHENTICATED")),
        },
    }
}
