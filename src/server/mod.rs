//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::exchange::ExchangeClient;
use crate::graph::GraphClient;
use crate::service::ProvisioningService;
use crate::state::ProvisioningState;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provisioner: Arc<ProvisioningService<GraphClient, ExchangeClient>>,
}

impl ProvisioningState for AppState {
    type Directory = GraphClient;
    type Mail = ExchangeClient;

    fn config(&self) -> &Config {
        &self.config
    }

    fn provisioner(&self) -> &ProvisioningService<Self::Directory, Self::Mail> {
        &self.provisioner
    }
}

/// Run the server
pub async fn run(config: Config) -> Result<()> {
    let graph_client = GraphClient::new(config.graph.clone())?;
    let exchange_client = ExchangeClient::new(config.exchange.clone(), config.graph.clone())?;

    let config = Arc::new(config);
    let provisioner = Arc::new(ProvisioningService::new(
        Arc::new(graph_client),
        Arc::new(exchange_client),
        config.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        provisioner,
    };

    let app = build_router(state);

    let addr = config.http_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server started on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router with generic state type
///
/// This function is generic over the state type, allowing it to work with
/// both the production `AppState` and test implementations.
pub fn build_router<S: ProvisioningState>(state: S) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/api/v1/provision", post(api::provision::provision::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
