use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error::AppError, telegram::TELEGRAM_API, utils::split_list};

pub struct Config {
    pub host: String,
    pub port: u16,
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub telegram_polling: bool,
    pub admin_chat_ids: Vec<String>,
    pub google_credentials_path: PathBuf,
    pub spreadsheet_ids: SpreadsheetIds,
    pub subscribers_path: PathBuf,
    pub visitor_logs_path: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Ok(Self {
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("RUST_PORT", "3002")?,
            telegram_token: read_secret("TELEGRAM_BOT_TOKEN")?,
            telegram_api_url: try_load("TELEGRAM_API_URL", TELEGRAM_API)?,
            telegram_polling: try_load("TELEGRAM_POLLING", "false")?,
            admin_chat_ids: split_list(&try_load::<String>("TELEGRAM_ADMIN_CHAT_IDS", "")?),
            google_credentials_path: try_load(
                "GOOGLE_CREDENTIALS_PATH",
                "config/google-credentials.json",
            )?,
            spreadsheet_ids: SpreadsheetIds {
                hombres: try_load(
                    "SPREADSHEET_ID_HOMBRES",
                    "1B2x1HEjjPsQnkZZU1RZptALOs5mRwjD56KS7VHoDpJk",
                )?,
                mujeres: try_load(
                    "SPREADSHEET_ID_MUJERES",
                    "1kV8n07RE61-6fz7MIu5TSiYUjxPPTh5GVca0E1MCC7M",
                )?,
            },
            subscribers_path: try_load("SUBSCRIBERS_PATH", "config/telegram-ids.json")?,
            visitor_logs_path: try_load("VISITOR_LOGS_PATH", "data/visitor-logs.json")?,
            static_dir: try_load("STATIC_DIR", "public")?,
        })
    }
}

/// Which attendee spreadsheet a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Hombres,
    Mujeres,
}

impl SheetKind {
    pub const ALL: [SheetKind; 2] = [SheetKind::Hombres, SheetKind::Mujeres];

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Hombres => "hombres",
            SheetKind::Mujeres => "mujeres",
        }
    }
}

impl FromStr for SheetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SheetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                AppError::InvalidType(format!(
                    "tipo must be one of: {}",
                    SheetKind::ALL.map(|kind| kind.as_str()).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpreadsheetIds {
    pub hombres: String,
    pub mujeres: String,
}

impl SpreadsheetIds {
    pub fn get(&self, kind: SheetKind) -> &str {
        match kind {
            SheetKind::Hombres => &self.hombres,
            SheetKind::Mujeres => &self.mujeres,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("invalid {key}: {e}"))
        })
}

/// Reads a secret from the environment, falling back to a mounted Docker secret.
fn read_secret(secret_name: &str) -> Result<String, AppError> {
    if let Some(value) = var(secret_name) {
        return Ok(value.trim().to_string());
    }

    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            warn!("Failed to read {secret_name} from environment or {path}");
            AppError::Config(format!("{secret_name} is not set"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_kind() {
        assert_eq!("hombres".parse::<SheetKind>().unwrap(), SheetKind::Hombres);
        assert_eq!("mujeres".parse::<SheetKind>().unwrap(), SheetKind::Mujeres);
        assert!(matches!(
            "niños".parse::<SheetKind>(),
            Err(AppError::InvalidType(_))
        ));
    }

    #[test]
    fn test_try_load_default_and_invalid() {
        let port: u16 = try_load("BAUTISMOS_TEST_UNSET_PORT", "3002").unwrap();
        assert_eq!(port, 3002);

        let err = try_load::<u16>("BAUTISMOS_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_secret() {
        assert!(read_secret("BAUTISMOS_TEST_MISSING_SECRET").is_err());
    }
}
