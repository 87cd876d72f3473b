//! Backend for the baptism event site: attendee spreadsheets, lost person alerts and live visitor count.
//!
//!
//!
//! # General Infrastructure
//! - Attendees live in two Google Sheets, one for men (`hombres`) and one for women (`mujeres`)
//! - Volunteers read and edit them through `/api/sheets/*`, grouped by city
//! - Lost attendees are reported through `/api/persona-perdida`, which fans out to Telegram
//! - The static site is served from `STATIC_DIR` and keeps a WebSocket on `/ws` for the online count
//!
//!
//!
//! # Storage
//!
//! There is no database. Two JSON files hold the only local state:
//! - `SUBSCRIBERS_PATH`: Telegram chats that asked for alerts
//! - `VISITOR_LOGS_PATH`: visit entries posted by the site, newest first
//!
//! Writes to each file go through one async lock, so concurrent requests never lose an update.
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! | --- | --- |
//! | `HOST` | `0.0.0.0` |
//! | `RUST_PORT` | `3002` |
//! | `TELEGRAM_BOT_TOKEN` | required, or `/run/secrets/TELEGRAM_BOT_TOKEN` |
//! | `TELEGRAM_API_URL` | `https://api.telegram.org` |
//! | `TELEGRAM_ADMIN_CHAT_IDS` | empty, comma separated |
//! | `TELEGRAM_POLLING` | `false` |
//! | `GOOGLE_CREDENTIALS_PATH` | `config/google-credentials.json` |
//! | `SPREADSHEET_ID_HOMBRES` / `SPREADSHEET_ID_MUJERES` | event spreadsheets |
//! | `SUBSCRIBERS_PATH` | `config/telegram-ids.json` |
//! | `VISITOR_LOGS_PATH` | `data/visitor-logs.json` |
//! | `STATIC_DIR` | `public` |
//!
//! Missing Google credentials only disable the sheet routes, they answer 500 until the file exists
//! and the server restarts.
//!
//!
//!
//! # Setup
//!
//! Run locally.
//! ```sh
//! RUST_LOG=info TELEGRAM_BOT_TOKEN=... cargo run -p bautismos
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::sync::Arc;

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod alerts;
pub mod attendees;
pub mod bot;
pub mod config;
pub mod error;
pub mod presence;
pub mod routes;
pub mod state;
pub mod store;
pub mod subscribers;
pub mod telegram;
pub mod utils;
pub mod visitors;

use config::Config;
use error::AppError;
pub use routes::router;
use state::State;

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await;

    if state.config.telegram_polling {
        tokio::spawn(bot::run_polling(state.clone()));
    }

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("{}:{}", state.config.host, state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal(state: Arc<State>) {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.shutdown();
}
