//! Verifies Google Drive credentials and folder access using the server's environment.

use std::time::Duration;

use clap::Parser;
use quiz_backend::config::drive_from_env;
use quiz_backend::services::drive_service::DriveService;
use reqwest::Client;

#[derive(Parser, Debug)]
#[command(name = "drive-check")]
#[command(about = "Check DRIVE_FOLDER_ID and its credentials")]
struct Cli {
    /// Also look up (or create) a folder with this name
    #[arg(long, value_name = "NAME")]
    ensure_folder: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(drive) = drive_from_env()? else {
        anyhow::bail!("DRIVE_FOLDER_ID is not set");
    };
    match &drive.service_account_file {
        Some(path) => println!("Service account key: {}", path.display()),
        None => println!("Using static DRIVE_ACCESS_TOKEN"),
    }

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let service = DriveService::from_config(&drive, client)?;

    service.access_token().await?;
    println!("Access token obtained");

    let folder = service.verify_folder().await?;
    println!("Folder OK: {} ({})", folder.name, folder.id);
    if let Some(link) = folder.web_view_link {
        println!("  {}", link);
    }

    if let Some(name) = cli.ensure_folder {
        let sub = service.find_or_create_folder(&name).await?;
        println!("Folder '{}' id: {}", sub.name, sub.id);
    }
    Ok(())
}
