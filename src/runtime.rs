use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::context::ServiceContext;
use crate::dispatcher;
use crate::error::Result;
use dockerlab_probe::{SharedProbe, SystemProbe};

/// High-level runtime that wires the dispatcher to a listener.
pub struct DockerlabRuntime {
    config: ServiceConfig,
    probe: SharedProbe,
}

impl DockerlabRuntime {
    /// Creates a runtime with the provided configuration and process probe.
    pub fn new(config: ServiceConfig, probe: SharedProbe) -> Self {
        Self { config, probe }
    }

    /// Returns the application router this runtime would serve.
    pub fn router(&self) -> Router {
        dispatcher::app(ServiceContext::new(
            self.probe.clone(),
            self.config.identity.clone(),
        ))
    }

    /// Consumes the runtime and starts serving.
    pub async fn serve(self) -> Result<()> {
        let router = self.router();
        serve(router, self.config).await
    }
}

/// Serves the router with the provided configuration.
pub async fn serve(router: Router, config: ServiceConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    let port = listener.local_addr()?.port();

    tracing::info!(addr = %config.bind_addr, port, "server running");
    tracing::info!("health check available at http://localhost:{port}/health");
    tracing::info!("runtime info available at http://localhost:{port}/api/info");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Loads [`ServiceConfig`] from the environment and serves the full application.
pub async fn run() -> Result<()> {
    // Uptime counts from here, before config parsing and binding.
    let probe = SystemProbe::shared();
    let config = ServiceConfig::from_env()?;
    tracing::debug!(
        environment = %config.identity.environment,
        container = %config.identity.container,
        "configuration loaded"
    );

    DockerlabRuntime::new(config, probe).serve().await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dockerlab_probe::FixedProbe;
    use tower::ServiceExt;

    #[tokio::test]
    async fn runtime_router_uses_configured_identity() {
        let config = ServiceConfig::builder()
            .environment("staging")
            .container("box-7")
            .build();
        let runtime = DockerlabRuntime::new(config, FixedProbe::default().shared());

        let response = runtime
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["environment"], "staging");
        assert_eq!(body["container"], "box-7");
    }
}
