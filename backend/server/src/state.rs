use std::sync::Arc;

use sheets::SheetsClient;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::AppError,
    presence::Presence,
    subscribers::Subscribers,
    telegram::Telegram,
    visitors::VisitorLogs,
};

pub struct State {
    pub config: Config,
    pub sheets: Option<SheetsClient>,
    pub telegram: Telegram,
    pub subscribers: Subscribers,
    pub visitors: VisitorLogs,
    pub presence: Presence,
    shutdown: watch::Sender<bool>,
}

impl State {
    pub async fn new(config: Config) -> Arc<Self> {
        let sheets = match SheetsClient::from_credentials_file(&config.google_credentials_path).await
        {
            Ok(client) => {
                info!("Google Sheets client initialized");
                Some(client)
            }
            Err(e) => {
                warn!("Google Sheets unavailable, sheet routes will fail: {e}");
                None
            }
        };

        Self::from_parts(config, sheets)
    }

    pub fn from_parts(config: Config, sheets: Option<SheetsClient>) -> Arc<Self> {
        let telegram = Telegram::new(&config.telegram_api_url, &config.telegram_token);
        let subscribers = Subscribers::new(config.subscribers_path.clone());
        let visitors = VisitorLogs::new(config.visitor_logs_path.clone());
        let (shutdown, _) = watch::channel(false);

        Arc::new(Self {
            config,
            sheets,
            telegram,
            subscribers,
            visitors,
            presence: Presence::new(),
            shutdown,
        })
    }

    pub fn sheets(&self) -> Result<&SheetsClient, AppError> {
        self.sheets.as_ref().ok_or(AppError::SheetsUnavailable)
    }

    pub fn on_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
