//! ListRouterBuilder for fluent API to build list endpoints

use crate::core::validation::ListResource;
use anyhow::Result;
use axum::handler::Handler;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for routers exposing validated list endpoints
///
/// # Example
///
/// ```ignore
/// let app = ListRouterBuilder::new()
///     .list::<Cars, _, _>(list_cars)
///     .list::<Modifications, _, _>(list_modifications)
///     .build();
/// ```
pub struct ListRouterBuilder {
    routes: Vec<Router>,
    resources: Vec<&'static str>,
}

impl ListRouterBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Mount `handler` at `GET /{R::NAME}`
    ///
    /// The handler is expected to take a [`ListQuery<R>`](crate::core::validation::ListQuery)
    /// so the query string is checked against the resource whitelist.
    pub fn list<R, H, T>(mut self, handler: H) -> Self
    where
        R: ListResource,
        H: Handler<T, ()>,
        T: 'static,
    {
        let path = format!("/{}", R::NAME);
        self.routes.push(Router::new().route(&path, get(handler)));
        self.resources.push(R::NAME);
        self
    }

    /// Add routes that are not list endpoints
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.routes.push(routes);
        self
    }

    /// Build the final router with health checks and HTTP tracing
    pub fn build(self) -> Router {
        let resources = self.resources;
        let mut app = Router::new()
            .route("/health", get(health_check))
            .route("/healthz", get(health_check))
            .route("/resources", get(move || list_resources(resources.clone())));

        for router in self.routes {
            app = app.merge(router);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `addr` and stops on SIGTERM or Ctrl+C.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ListRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "list-query"
    }))
}

async fn list_resources(resources: Vec<&'static str>) -> Json<Value> {
    Json(json!({ "resources": resources }))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
