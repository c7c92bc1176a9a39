//! Console server.

use crate::error::ConsoleError;
use crate::routes;
use crate::state::ConsoleState;
use axum::Router;
use tokio::net::TcpListener;

/// Serves the console router plus any routes merged in by the host.
pub struct ConsoleServer {
    state: ConsoleState,
    extra: Router,
}

impl ConsoleServer {
    pub fn new(state: ConsoleState) -> Self {
        Self {
            state,
            extra: Router::new(),
        }
    }

    /// Merge additional routes (health checks, static assets, custom panels).
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.extra = self.extra.merge(routes);
        self
    }

    /// The full application router.
    pub fn router(&self) -> Router {
        routes::console_router(self.state.clone()).merge(self.extra.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), ConsoleError> {
        let addr = self.state.config().server.bind_address();
        tracing::info!(
            address = %addr,
            base_path = %self.state.base_path(),
            panels = self.state.panels().len(),
            "Starting admin console"
        );

        let app = self.router();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ConsoleError::StartupFailed(e.to_string()))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ConsoleError::StartupFailed(e.to_string()))?;

        tracing::info!("Admin console stopped");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.state.config().server.bind_address()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickstart_core::QuickstartConfig;
    use quickstart_panels::PanelRegistry;
    use std::sync::Arc;

    #[test]
    fn test_server_creation() {
        let state = ConsoleState::new(QuickstartConfig::default(), Arc::new(PanelRegistry::new()));
        let server = ConsoleServer::new(state);
        assert_eq!(server.bind_address(), "127.0.0.1:8080");
    }
}
