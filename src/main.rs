use std::sync::Arc;
use tracing::info;

use sibyl_core::config::Settings;
use sibyl_core::runtime::monitor::Monitor;
use sibyl_core::web::{create_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sibyl_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("[Startup] Sibyl monitoring agent initializing...");

    let settings = Settings::new()?;
    info!(
        "[Config] Binding at {}:{}",
        settings.server.host, settings.server.port
    );

    let monitor = Monitor::from_settings(&settings)?;
    monitor.prefetch_context();

    let state = Arc::new(AppState {
        monitor: monitor.clone(),
        limits: settings.ingress.clone(),
    });
    let app = create_router(state);
    monitor.diagnostics().log("Activated");

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[Startup] Capture ingress ready at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
