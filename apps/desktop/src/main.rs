use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dashboard_core::{
    DashboardClient, DashboardQuery, HttpRemoteAuthority, LoadReport, RelocationOutcome,
};
use shared::{
    domain::{FolderId, FormId, StatusFilter},
    protocol::{CreateFolderRequest, CreateFormRequest, UpdateFolderRequest},
};
use tracing::warn;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Form dashboard client")]
struct Args {
    /// Dashboard service URL; overrides dashboard.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load everything and print the organized dashboard.
    Overview {
        #[arg(long, default_value = "")]
        search: String,
        /// all | published | draft | closed
        #[arg(long, default_value = "all")]
        status: String,
        /// Emit the raw projection as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Drag a form into a folder.
    Move { form_id: String, folder_id: String },
    /// Drag a form back to the standalone area.
    Unassign { form_id: String },
    CreateFolder {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "#2563eb")]
        color: String,
    },
    EditFolder {
        folder_id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "#2563eb")]
        color: String,
    },
    DeleteFolder { folder_id: String },
    CreateForm {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// published | draft | closed
        #[arg(long, default_value = "draft")]
        status: String,
        #[arg(long)]
        folder_id: Option<String>,
    },
    DeleteForm { form_id: String },
    /// Print the external share address of a published form.
    ShareLink { form_id: String },
}

fn parse_status_filter(value: &str) -> Result<StatusFilter> {
    Ok(match value {
        "all" => StatusFilter::All,
        "published" => StatusFilter::Published,
        "draft" => StatusFilter::Draft,
        "closed" => StatusFilter::Closed,
        other => bail!("unknown status filter: {other}"),
    })
}

fn parse_status(value: &str) -> Result<shared::domain::FormStatus> {
    use shared::domain::FormStatus;
    Ok(match value {
        "published" => FormStatus::Published,
        "draft" => FormStatus::Draft,
        "closed" => FormStatus::Closed,
        other => bail!("unknown status: {other}"),
    })
}

fn report_load(report: &LoadReport) {
    if let Some(failure) = report.failure() {
        warn!("{failure}");
    }
}

fn print_outcome(outcome: &RelocationOutcome) {
    match outcome {
        RelocationOutcome::Settled { form_id, to, .. } => match to {
            Some(folder_id) => println!("Moved {form_id} into folder {folder_id}"),
            None => println!("Moved {form_id} to the standalone area"),
        },
        RelocationOutcome::RolledBack { form_id, message } => {
            println!("Move of {form_id} was rejected and rolled back: {message}")
        }
        RelocationOutcome::Ignored => println!("Nothing to do"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = settings::load_settings();
    let server_url = args.server_url.unwrap_or(settings.server_url);

    let client = DashboardClient::new(Arc::new(HttpRemoteAuthority::new(server_url)));
    report_load(&client.load().await);

    match args.command {
        Command::Overview {
            search,
            status,
            json,
        } => {
            let query = DashboardQuery {
                search_text: search,
                status_filter: parse_status_filter(&status)?,
                ..DashboardQuery::default()
            };
            let projection = client.project(&query).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&projection)?);
                return Ok(());
            }
            for projected in &projection.folders {
                println!(
                    "[{}] {} ({} forms)",
                    projected.folder.folder_id, projected.folder.name, projected.folder.form_count
                );
                for form in &projected.forms {
                    println!("    {} {} [{:?}]", form.form_id, form.title, form.status);
                }
            }
            if !projection.unassigned_forms.is_empty() {
                println!("Standalone forms:");
                for form in &projection.unassigned_forms {
                    println!("    {} {} [{:?}]", form.form_id, form.title, form.status);
                }
            }
            let summary = projection.summary;
            println!(
                "{} forms, {} responses, {} views, {} published",
                summary.total_forms,
                summary.total_responses,
                summary.total_views,
                summary.published_forms
            );
        }
        Command::Move { form_id, folder_id } => {
            client.begin_drag(&format!("form-{form_id}")).await?;
            let target = format!("folder-{folder_id}");
            let outcome = client.complete_drag(Some(target.as_str())).await;
            print_outcome(&outcome);
        }
        Command::Unassign { form_id } => {
            client.begin_drag(&format!("form-{form_id}")).await?;
            let outcome = client.complete_drag(Some("standalone-forms")).await;
            print_outcome(&outcome);
        }
        Command::CreateFolder {
            name,
            description,
            color,
        } => {
            let folder = client
                .create_folder(CreateFolderRequest {
                    name,
                    description,
                    color,
                })
                .await?;
            println!("Created folder {}", folder.folder_id);
        }
        Command::EditFolder {
            folder_id,
            name,
            description,
            color,
        } => {
            let folder = client
                .update_folder(
                    &FolderId::new(folder_id),
                    UpdateFolderRequest {
                        name,
                        description,
                        color,
                    },
                )
                .await?;
            println!("Updated folder {}", folder.folder_id);
        }
        Command::DeleteFolder { folder_id } => {
            let unassigned = client.delete_folder(&FolderId::new(folder_id)).await?;
            println!("Folder deleted; {unassigned} forms moved to the standalone area");
        }
        Command::CreateForm {
            title,
            description,
            status,
            folder_id,
        } => {
            let form = client
                .create_form(CreateFormRequest {
                    title,
                    description,
                    status: parse_status(&status)?,
                    folder_id: folder_id.map(FolderId::new),
                })
                .await?;
            println!("Created form {}", form.form_id);
        }
        Command::DeleteForm { form_id } => {
            client.delete_form(&FormId::new(form_id)).await?;
            println!("Form deleted");
        }
        Command::ShareLink { form_id } => {
            match client
                .share_address(&FormId::new(form_id), &settings.share_origin)
                .await
            {
                Some(address) => println!("{address}"),
                None => println!("No share link: the form is not published"),
            }
        }
    }

    Ok(())
}
