use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Failed to read credentials from {path}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials: {0}")]
    CredentialsFormat(#[source] serde_json::Error),

    #[error("Failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("No data found in the spreadsheet")]
    EmptyRange,

    #[error("Column \"{0}\" not found")]
    UnknownColumn(String),

    #[error("Cannot determine the name column for \"{0}\"")]
    NoNameColumn(String),

    #[error("\"{name}\" not found in \"{group}\", check the exact name")]
    NotFound { group: String, name: String },
}

impl SheetsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::EmptyRange)
    }

    /// Errors caused by what the caller asked for rather than by the remote service.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::UnknownColumn(_) | Self::NoNameColumn(_))
    }
}
