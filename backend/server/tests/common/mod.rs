#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Path, State as MockState},
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use server::{
    config::{Config, SpreadsheetIds},
    router,
    state::State,
};
use sheets::SheetsClient;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const HOMBRES_ID: &str = "hombres-sheet";
pub const MUJERES_ID: &str = "mujeres-sheet";
/// Chat the Telegram mock refuses to deliver to.
pub const UNREACHABLE_CHAT: &str = "999";

pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    format!("http://{address}")
}

/// Bot API calls received by the mock, as `(method, body)`.
pub type Calls = Arc<Mutex<Vec<(String, Value)>>>;

async fn telegram_method(
    MockState(calls): MockState<Calls>,
    Path((_bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    calls.lock().unwrap().push((method.clone(), body.clone()));

    if body["chat_id"] == json!(UNREACHABLE_CHAT) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})),
        )
            .into_response();
    }

    let result = match method.as_str() {
        "getUpdates" => json!([]),
        _ => json!({"message_id": 1}),
    };

    Json(json!({"ok": true, "result": result})).into_response()
}

pub async fn telegram_mock() -> (String, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/{bot}/{method}", post(telegram_method))
        .with_state(calls.clone());

    (serve(app).await, calls)
}

/// Spreadsheet contents keyed by nothing, every id reads the same rows.
pub type Rows = Arc<Mutex<Vec<Vec<String>>>>;

pub fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub fn example_rows() -> Vec<Vec<String>> {
    rows(&[
        &["CREYENTES", "HOMBRES", "MANILLA", "D", "E", "F", "G"],
        &["CARTAGENA"],
        &["Juan", "Pedro", "X", "", "", "", ""],
        &["MURCIA"],
        &["Ana", "Luis", "Y", "", "", "", ""],
    ])
}

async fn values(MockState(rows): MockState<Rows>, Path((id, range)): Path<(String, String)>) -> Response {
    let rows = rows.lock().unwrap().clone();

    Json(json!({"range": range, "majorDimension": "ROWS", "values": rows, "spreadsheetId": id}))
        .into_response()
}

async fn write_value(Path((_id, range)): Path<(String, String)>) -> Response {
    Json(json!({"updatedRange": range, "updatedCells": 1})).into_response()
}

async fn spreadsheet(Path(id): Path<String>) -> Response {
    Json(json!({"spreadsheetId": id, "sheets": [{"properties": {"title": "Hoja1"}}]})).into_response()
}

pub async fn sheets_mock(initial: Vec<Vec<String>>) -> (SheetsClient, Rows) {
    let rows: Rows = Arc::new(Mutex::new(initial));
    let app = Router::new()
        .route("/v4/spreadsheets/{id}", get(spreadsheet))
        .route(
            "/v4/spreadsheets/{id}/values/{range}",
            get(values).put(write_value),
        )
        .with_state(rows.clone());

    let client = SheetsClient::with_token(&serve(app).await, "test-token").unwrap();
    (client, rows)
}

pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<State>,
}

pub fn config(dir: &TempDir, telegram_api_url: &str, admin_chat_ids: &[&str]) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        telegram_token: "test-token".to_string(),
        telegram_api_url: telegram_api_url.to_string(),
        telegram_polling: false,
        admin_chat_ids: admin_chat_ids.iter().map(|id| id.to_string()).collect(),
        google_credentials_path: dir.path().join("missing-credentials.json"),
        spreadsheet_ids: SpreadsheetIds {
            hombres: HOMBRES_ID.to_string(),
            mujeres: MUJERES_ID.to_string(),
        },
        subscribers_path: dir.path().join("config/telegram-ids.json"),
        visitor_logs_path: dir.path().join("data/visitor-logs.json"),
        static_dir: static_dir(dir),
    }
}

fn static_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("public")
}

impl TestApp {
    pub fn new(config: Config, sheets: Option<SheetsClient>, dir: TempDir) -> Self {
        Self {
            state: State::from_parts(config, sheets),
            dir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }
}
