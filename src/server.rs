use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState};
use crate::orchestrator::CampaignOrchestrator;

/// Configuration for the campaign server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Permissive CORS, for a frontend served from another origin.
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3141,
            dev_mode: false,
        }
    }
}

pub fn build_router(orchestrator: CampaignOrchestrator, dev_mode: bool) -> Router {
    let state = Arc::new(AppState { orchestrator });
    let app = api::api_router().with_state(state);
    if dev_mode {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Restore snapshots, then serve until Ctrl+C.
pub async fn start_server(config: ServerConfig, orchestrator: CampaignOrchestrator) -> Result<()> {
    let report = orchestrator
        .restore()
        .context("Failed to restore campaign snapshots")?;
    if report.restored > 0 {
        println!(
            "Restored {} campaign(s), {} marked failed after interruption",
            report.restored,
            report.reconciled.len()
        );
    }

    let app = build_router(orchestrator.clone(), config.dev_mode);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("Campaign server running at http://{}", local_addr);
    tracing::info!(%local_addr, dev_mode = config.dev_mode, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    orchestrator.shutdown();
    orchestrator.flush_snapshots().await;
    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::CannedInvoker;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn orchestrator() -> CampaignOrchestrator {
        CampaignOrchestrator::builder(Arc::new(CannedInvoker::new())).build()
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let app = build_router(orchestrator(), false);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dev_mode_adds_cors_headers() {
        let app = build_router(orchestrator(), true);
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(orchestrator(), false);
        let req = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
