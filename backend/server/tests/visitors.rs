mod common;

use std::fs;

use axum::http::StatusCode;
use common::{TestApp, config};
use serde_json::json;
use tempfile::tempdir;

fn app() -> TestApp {
    let dir = tempdir().unwrap();
    let config = config(&dir, "http://127.0.0.1:9", &[]);

    TestApp::new(config, None, dir)
}

#[tokio::test]
async fn visitor_logs_newest_first() {
    let app = app();

    for page in ["/", "/mapa"] {
        let (status, _) = app.post("/api/log-visitor", json!({"page": page})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get("/api/log-visitor").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["logs"][0]["page"], json!("/mapa"));
    assert!(body["logs"][1]["serverTimestamp"].as_str().unwrap().ends_with('Z'));

    let saved = fs::read_to_string(app.dir.path().join("data/visitor-logs.json")).unwrap();
    assert!(saved.contains("\"/mapa\""));
}

#[tokio::test]
async fn visitor_log_must_be_an_object() {
    let app = app();

    let (status, body) = app.post("/api/log-visitor", json!(["not", "an", "object"])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (_, body) = app.get("/api/log-visitor").await;
    assert_eq!(body["total"], json!(0));
}

#[tokio::test]
async fn online_users_lists_connected_peers() {
    let app = app();
    let id = app.state.presence.join();

    let (status, body) = app.get("/api/online-users").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["users"][0]["id"], json!(id.to_string()));
}

#[tokio::test]
async fn serves_static_files() {
    let app = app();
    let public = app.dir.path().join("public");
    fs::create_dir_all(&public).unwrap();
    fs::write(public.join("index.html"), "<h1>Bautismos</h1>").unwrap();

    let (status, body) = app.get_text("/index.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>Bautismos</h1>");

    let (status, _) = app.get_text("/missing.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
