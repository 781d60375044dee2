//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all balancer handler
//! - Wire up middleware (tracing, request ID)
//! - Extract request geo metadata from configured headers
//! - Map balancer errors to client responses
//! - Swap in a fresh balancer on config reload
//! - Graceful shutdown on the lifecycle broadcast

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GeoHeaderConfig, ProxyConfig};
use crate::error::BuildError;
use crate::http::request::{extract_geo, request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::load_balancer::LoadBalancer;

/// Live routing state. Both halves are swapped on reload.
#[derive(Debug)]
pub struct Routing {
    pub balancer: LoadBalancer,
    pub geo_headers: GeoHeaderConfig,
}

impl Routing {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, BuildError> {
        Ok(Self {
            balancer: LoadBalancer::from_config(config)?,
            geo_headers: config.geo_headers.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<ArcSwap<Routing>>,
}

/// HTTP server fronting the load balancer.
pub struct HttpServer {
    router: Router,
    routing: Arc<ArcSwap<Routing>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, BuildError> {
        Ok(Self::with_routing(Routing::from_config(&config)?))
    }

    /// Create a server around an already-built balancer.
    pub fn with_routing(routing: Routing) -> Self {
        tracing::info!(
            steering = routing.balancer.steering().mode(),
            strategy = routing.balancer.strategy_name(),
            "Load balancer ready"
        );

        let routing = Arc::new(ArcSwap::from_pointee(routing));
        let state = AppState {
            routing: routing.clone(),
        };

        Self {
            router: Self::build_router(state),
            routing,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Validated configs arriving on `config_updates` replace the balancer;
    /// requests already in flight finish on the snapshot they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let routing = self.routing.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match Routing::from_config(&config) {
                    Ok(next) => {
                        tracing::info!(
                            steering = next.balancer.steering().mode(),
                            strategy = next.balancer.strategy_name(),
                            "Configuration reloaded"
                        );
                        routing.store(Arc::new(next));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded configuration, keeping current balancer");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with all layers, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Catch-all handler: attach request geo, hand off to the balancer.
async fn proxy_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let routing = state.routing.load_full();

    let geo = extract_geo(request.headers(), &routing.geo_headers);
    let id = request_id(request.headers()).to_string();

    tracing::debug!(
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
        geo = ?geo,
        "Balancing request"
    );

    if !geo.is_empty() {
        request.extensions_mut().insert(geo);
    }

    match routing.balancer.handle_request(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %id, error = %e, "Request failed");
            e.into_response()
        }
    }
}
