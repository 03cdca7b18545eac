//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: auth endpoints + transparent proxy fallback
//! - Wire up middleware (identity resolution, tracing, timeout, request ID)
//! - Construct shared state (token service, upstream clients)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - One immutable AppState built at startup; no hidden globals
//! - Two HTTP client stacks: hyper-util legacy client for the streaming
//!   proxy path, reqwest for buffered JSON upstream calls
//! - Identity middleware runs router-wide but skips the auth prefix

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    middleware,
    routing::{get, post},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::auth::handlers::{login, register, register_status};
use crate::auth::identity::identity_middleware;
use crate::auth::token::TokenService;
use crate::auth::users::UserServiceClient;
use crate::config::loader::ConfigError;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::GatewayConfig;
use crate::proxy::proxy_handler;
use crate::saga::SagaClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub tokens: TokenService,
    pub users: UserServiceClient,
    pub saga: SagaClient,
    /// Streaming client for the proxy path.
    pub proxy: Client<HttpConnector, Body>,
    /// Buffered JSON client shared with background side effects.
    pub http: reqwest::Client,
    /// Core service origin, for URI rebasing and redirect rewriting.
    pub core_url: Url,
    /// Gateway public origin, for redirect rewriting.
    pub public_url: Url,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server from a validated configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let core_url = parse_url("upstreams.core_service_url", &config.upstreams.core_service_url)?;
        let public_url = parse_url("listener.public_url", &config.listener.public_url)?;

        // Title-case HTTP/1 headers so the core service sees the identity
        // header with canonical casing (X-User-Id).
        let proxy = Client::builder(TokioExecutor::new())
            .http1_title_case_headers(true)
            .build(HttpConnector::new());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .build()
            .map_err(|e| {
                ConfigError::Validation(vec![ValidationError {
                    field: "timeouts.upstream_secs".into(),
                    message: format!("failed to build upstream client: {}", e),
                }])
            })?;

        let users = UserServiceClient::new(http.clone(), config.upstreams.user_service_url.clone());
        let saga = SagaClient::new(
            http.clone(),
            config.upstreams.saga_orchestrator_url.clone(),
            &config.saga,
        );
        let tokens = TokenService::new(&config.auth);

        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            config: Arc::new(config),
            tokens,
            users,
            saga,
            proxy,
            http,
            core_url,
            public_url,
        };

        let router = Self::build_router(state, request_timeout);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/register/status/{task_id}", get(register_status))
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                identity_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    result = tokio::signal::ctrl_c() => {
                        let _ = result;
                    }
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| {
        ConfigError::Validation(vec![ValidationError {
            field: field.into(),
            message: format!("'{}' is not a valid URL: {}", value, e),
        }])
    })
}
