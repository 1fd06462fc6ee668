pub mod api;
pub mod state;
pub mod utils;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::web::{api::capture, state::AppState};

/// 采集入口路由
///
/// 每个采集来源对应一个适配器路由，统一进入规范化与上报管线。
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest(
            "/capture",
            Router::new()
                .route("/error", post(capture::error_handler))
                .route("/rejection", post(capture::rejection_handler))
                .route("/console", post(capture::console_handler))
                .route("/network", post(capture::network_handler)),
        )
        .route("/data", put(capture::data_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}
