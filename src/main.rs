use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use quiz_backend::{
    config::{get_config, init_config, LogFormat},
    middleware::cors::cors_layer,
    routes,
    services::{
        drive_service::{DriveService, RemoteStore},
        question_bank::QuestionBank,
        spreadsheet_service::SpreadsheetService,
    },
    AppState,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let questions = SpreadsheetService::load_from_path(&config.questions_file)?;
    let bank = QuestionBank::new(questions);
    info!("Question bank ready: {} questions", bank.len());
    for (level, count) in bank.distribution() {
        info!("  level {}: {} questions", level, count);
    }

    let remote: Option<Arc<dyn RemoteStore>> = match &config.drive {
        Some(drive) => {
            let http_client = Client::builder().timeout(Duration::from_secs(60)).build()?;
            let service = DriveService::from_config(drive, http_client)?;
            info!("Google Drive uploads enabled for folder {}", service.folder_id());
            Some(Arc::new(service))
        }
        None => {
            info!("Google Drive is not configured; evaluations are archived locally only");
            None
        }
    };

    let (app_state, completions) = AppState::new(config.clone(), bank, remote);

    {
        let worker = app_state.completion_service();
        tokio::spawn(worker.run(completions));
    }

    let app = routes::router(app_state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
