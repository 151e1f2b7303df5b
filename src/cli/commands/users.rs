use clap::Subcommand;
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::{output_empty_collection, output_record, output_success, prompt};
use crate::cli::OutputFormat;
use crate::database::models::CreateUserRequest;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Create a user")]
    Create {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Grant administrator rights")]
        admin: bool,
    },

    #[command(about = "Delete a user")]
    Delete {
        #[arg(help = "User ID")]
        id: i64,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client(None)?;

    match cmd {
        UserCommands::List => {
            let users = client.list_users().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }
            output_record(&output_format, &users, |users| {
                for user in users {
                    let role = if user.is_admin { "admin" } else { "user" };
                    println!("{:>5}  {:<24} {}", user.id, user.username, role);
                }
            })
        }
        UserCommands::Create { username, password, admin } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password")?,
            };
            let request = CreateUserRequest {
                username: Some(username),
                password: Some(password),
                is_admin: admin,
            };
            let user = client.create_user(&request).await?;
            output_success(
                &output_format,
                &format!("Created user '{}' (id {})", user.username, user.id),
                Some(json!(user)),
            )
        }
        UserCommands::Delete { id } => {
            client.delete_user(id).await?;
            output_success(&output_format, &format!("Deleted user {}", id), None)
        }
    }
}
