use anyhow::{Context as _, Result};
use async_trait::async_trait;
use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::lifecycle::LifecycleComponent;

/// Liveness probe for the hosting platform: `/health` answers `ok`, anything else `running`.
pub fn build_health_router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { "running" })
}

pub struct HealthServer {
    port: u16,
    shutdown: CancellationToken,
}

impl HealthServer {
    pub fn new(port: u16, shutdown: CancellationToken) -> Self {
        Self { port, shutdown }
    }
}

#[async_trait]
impl LifecycleComponent for HealthServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("[health] Health endpoint initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding health endpoint on {}", addr))?;
        info!("[health] Listening on http://{}", addr);

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, build_health_router())
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!("[health] Server crashed: {}", e);
            }
        });
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("[health] Health endpoint shutting down...");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    async fn get_text(path: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let resp = build_health_router().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_path_answers_ok() {
        assert_eq!(get_text("/health").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn other_paths_answer_running() {
        assert_eq!(get_text("/").await, (StatusCode::OK, "running".to_string()));
        assert_eq!(
            get_text("/anything/else").await,
            (StatusCode::OK, "running".to_string())
        );
    }

    #[tokio::test]
    async fn server_stops_when_token_is_cancelled() {
        let token = CancellationToken::new();
        let mut server = HealthServer::new(0, token.clone());
        server.on_start().await.unwrap();
        token.cancel();
        server.on_shutdown().await.unwrap();
    }
}
