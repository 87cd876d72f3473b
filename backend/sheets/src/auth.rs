//! # Service Account Auth
//!
//! OAuth2 JWT bearer flow for Google service accounts.
//!
//! - Credentials are the JSON key downloaded from the Google Cloud console
//! - A signed RS256 assertion is exchanged for an access token at `token_uri`
//! - Tokens live an hour, we keep one and refresh it a minute before it expires
use std::{
    path::Path,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::{client::ensure_success, error::SheetsError};

pub const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME: u64 = 3600;
const REFRESH_MARGIN: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| SheetsError::CredentialsIo {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&contents).map_err(SheetsError::CredentialsFormat)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    TOKEN_LIFETIME
}

pub(crate) struct AccessToken {
    token: String,
    expires_at: Instant,
}

pub(crate) enum Auth {
    ServiceAccount {
        key: ServiceAccountKey,
        cached: Mutex<Option<AccessToken>>,
    },
    Static(String),
}

impl Auth {
    pub(crate) fn service_account(key: ServiceAccountKey) -> Self {
        Self::ServiceAccount {
            key,
            cached: Mutex::new(None),
        }
    }

    pub(crate) async fn token(&self, http: &Client) -> Result<String, SheetsError> {
        let (key, cached) = match self {
            Self::Static(token) => return Ok(token.clone()),
            Self::ServiceAccount { key, cached } => (key, cached),
        };

        let mut cached = cached.lock().await;
        if let Some(current) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(current.token.clone());
        }

        let fresh = request_token(http, key).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);

        Ok(token)
    }
}

async fn request_token(http: &Client, key: &ServiceAccountKey) -> Result<AccessToken, SheetsError> {
    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + TOKEN_LIFETIME,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?;

    debug!("Requesting access token for {}", key.client_email);

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
        .send()
        .await?;
    let body: TokenResponse = ensure_success(response).await?.json().await?;

    let lifetime = body.expires_in.saturating_sub(REFRESH_MARGIN);

    Ok(AccessToken {
        token: body.access_token,
        expires_at: Instant::now() + Duration::from_secs(lifetime),
    })
}
