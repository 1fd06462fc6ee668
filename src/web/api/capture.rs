use crate::common::events::EventType;
use crate::common::json_guard::check_json_limits;
use crate::runtime::normalizer::{
    RawConsoleError, RawNetworkFailure, RawRejection, RawUncaughtError,
};
use crate::web::state::AppState;
use crate::web::utils::errors::{bad_request_json, payload_too_large_json};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// 未捕获异常
pub async fn error_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match parse_body::<RawUncaughtError>(&state, &body) {
        Ok(raw) => accepted(state.monitor.capture_uncaught(raw)),
        Err(response) => response,
    }
}

/// 未处理 / 已处理的 Promise rejection
pub async fn rejection_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match parse_body::<RawRejection>(&state, &body) {
        Ok(raw) => accepted(state.monitor.capture_rejection(raw)),
        Err(response) => response,
    }
}

/// 显式错误日志（console.error）
pub async fn console_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match parse_body::<RawConsoleError>(&state, &body) {
        Ok(raw) => accepted(state.monitor.capture_console(raw)),
        Err(response) => response,
    }
}

/// 网络请求 error / timeout
pub async fn network_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match parse_body::<RawNetworkFailure>(&state, &body) {
        Ok(raw) => accepted(state.monitor.capture_network(raw)),
        Err(response) => response,
    }
}

/// 替换调用方附带的诊断数据，`null` 表示清除
pub async fn data_handler(State(state): State<Arc<AppState>>, body: String) -> Response {
    match parse_body::<Value>(&state, &body) {
        Ok(Value::Null) => {
            state.monitor.set_data(None);
            Json(serde_json::json!({ "status": "success" })).into_response()
        }
        Ok(value) => {
            state.monitor.set_data(Some(value));
            Json(serde_json::json!({ "status": "success" })).into_response()
        }
        Err(response) => response,
    }
}

fn accepted(event_type: EventType) -> Response {
    tracing::debug!("[Ingress] Captured {} event", event_type.as_str());
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "accepted",
            "type": event_type.as_str()
        })),
    )
        .into_response()
}

fn parse_body<T: DeserializeOwned>(state: &AppState, body: &str) -> Result<T, Response> {
    if let Err(reason) =
        check_json_limits(body, state.limits.max_body_bytes, state.limits.max_depth)
    {
        tracing::warn!("[Ingress] Rejected capture payload: {}", reason);
        let (status, error) = if reason == "payload too large" {
            (StatusCode::PAYLOAD_TOO_LARGE, payload_too_large_json(reason))
        } else {
            (StatusCode::BAD_REQUEST, bad_request_json(reason))
        };
        return Err((status, Json(error)).into_response());
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("[Ingress] Malformed capture payload: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(bad_request_json(&e.to_string())),
        )
            .into_response()
    })
}
