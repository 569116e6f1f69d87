//! HTTP API gateway for Steward.
//!
//! Exposes a health check plus the v1 API: chat turns, classification,
//! context inspection, the intent listing and cache control.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use steward_config::AppConfig;
use steward_pipeline::Pipeline;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    /// Store collection that answered turns are appended to
    pub history_collection: String,
}

impl GatewayState {
    pub fn new(pipeline: Arc<Pipeline>, config: &AppConfig) -> Self {
        Self {
            pipeline,
            history_collection: config.pipeline.history.collection.clone(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - CORS restricted to the local web client
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://localhost:8080",
        )))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(
    config: &AppConfig,
    pipeline: Arc<Pipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::new(pipeline, config));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    intents: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.pipeline.provider_name().to_string(),
        intents: state.pipeline.registry().len(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use steward_core::error::ProviderError;
    use steward_core::message::Message;
    use steward_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use steward_pipeline::default_registry;
    use steward_store::InMemoryStore;
    use steward_store::fixtures::seed_demo;

    /// Replies with fixed text and counts calls.
    pub struct EchoProvider {
        pub reply: String,
        pub calls: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            Ok(ProviderResponse {
                message: Message::assistant(self.reply.clone()),
                usage: None,
                model: "echo-1".into(),
                metadata: Default::default(),
            })
        }
    }

    pub async fn test_state(reply: &str) -> (SharedState, Arc<EchoProvider>, Arc<InMemoryStore>) {
        let config = AppConfig::default();
        let provider = Arc::new(EchoProvider {
            reply: reply.into(),
            calls: Mutex::new(0),
        });
        let store = Arc::new(InMemoryStore::new());
        seed_demo(store.as_ref(), "b1", "u1").await.unwrap();
        let pipeline = Pipeline::new(
            &config,
            provider.clone(),
            store.clone(),
            default_registry().unwrap(),
        );
        let state = Arc::new(GatewayState::new(Arc::new(pipeline), &config));
        (state, provider, store)
    }
}
