use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{State as AxumState, rejection::JsonRejection},
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::debug;

use crate::{
    alerts::lost_person_handler,
    attendees::{
        check_connection_handler, data_handler, hombres_handler, mujeres_handler, update_handler,
        worksheets_handler,
    },
    error::AppError,
    presence::socket_handler,
    state::State,
    utils::payload,
};

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let sheets = Router::new()
        .route("/hombres", get(hombres_handler))
        .route("/mujeres", get(mujeres_handler))
        .route("/data", get(data_handler))
        .route("/worksheets", get(worksheets_handler))
        .route("/check-connection", get(check_connection_handler))
        .route("/update", post(update_handler));

    Router::new()
        .nest("/api/sheets", sheets)
        .route("/api/persona-perdida", post(lost_person_handler))
        .route(
            "/api/log-visitor",
            post(log_visitor_handler).get(visitor_logs_handler),
        )
        .route("/api/online-users", get(online_users_handler))
        .route("/ws", get(socket_handler))
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn log_visitor_handler(
    AxumState(state): AxumState<Arc<State>>,
    request: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Value::Object(entry) = payload(request)? else {
        return Err(AppError::MalformedPayload(
            "visitor log entry must be a JSON object".to_string(),
        ));
    };

    state.visitors.add(entry).await?;
    debug!("Visitor logged");

    Ok(Json(json!({
        "success": true,
        "message": "Visit logged",
    })))
}

pub async fn visitor_logs_handler(AxumState(state): AxumState<Arc<State>>) -> Json<Value> {
    let logs = state.visitors.all().await;

    Json(json!({
        "success": true,
        "total": logs.len(),
        "logs": logs,
    }))
}

pub async fn online_users_handler(AxumState(state): AxumState<Arc<State>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "count": state.presence.count(),
        "users": state.presence.peers(),
    }))
}
