use std::path::Path;

use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    auth::{Auth, ServiceAccountKey},
    error::SheetsError,
    value::CellValue,
};

pub const SHEETS_API: &str = "https://sheets.googleapis.com";

/// Thin client over the Sheets v4 REST API.
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    auth: Auth,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Worksheet>,
}

#[derive(Deserialize)]
struct Worksheet {
    properties: WorksheetProperties,
}

#[derive(Deserialize)]
struct WorksheetProperties {
    title: String,
}

impl SheetsClient {
    pub async fn from_credentials_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_file(path).await?;

        info!("Loaded Google service account {}", key.client_email);

        Self::new(SHEETS_API, Auth::service_account(key))
    }

    /// Client authenticating with a fixed bearer token against `base_url`.
    pub fn with_token(base_url: &str, token: impl Into<String>) -> Result<Self, SheetsError> {
        Self::new(base_url, Auth::Static(token.into()))
    }

    fn new(base_url: &str, auth: Auth) -> Result<Self, SheetsError> {
        let base_url =
            Url::parse(base_url).map_err(|_| SheetsError::InvalidUrl(base_url.to_string()))?;

        Ok(Self {
            http: Client::new(),
            base_url,
            auth,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);

        Ok(url)
    }

    /// Succeeds once an access token can be obtained with the loaded credentials.
    pub async fn check_connection(&self) -> Result<(), SheetsError> {
        self.auth.token(&self.http).await.map(|_| ())
    }

    pub async fn fetch_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.endpoint(&[spreadsheet_id, "values", range])?;
        let token = self.auth.token(&self.http).await?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = ensure_success(response).await?.json().await?;

        debug!("Fetched {} rows from {range}", body.values.len());

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    pub async fn write_cell(
        &self,
        spreadsheet_id: &str,
        range: &str,
        value: &CellValue,
    ) -> Result<(), SheetsError> {
        let url = self.endpoint(&[spreadsheet_id, "values", range])?;
        let token = self.auth.token(&self.http).await?;

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }

    pub async fn worksheet_names(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let url = self.endpoint(&[spreadsheet_id])?;
        let token = self.auth.token(&self.http).await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let body: Spreadsheet = ensure_success(response).await?.json().await?;

        Ok(body
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turns non-2xx responses into [`SheetsError::Api`], keeping Google's error message when present.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or(text);

    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("error_description"))
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
