//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the guard's own endpoints
//! - Mount application routes behind CSRF and rate-limit middleware
//! - Wire up ambient middleware (tracing, request ID, limits, timeout, headers)
//! - Run the background sweeper
//! - Bind server to listener and shut down gracefully

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GuardConfig;
use crate::csrf::CsrfProtector;
use crate::http::handlers::{health, invalidate_token, issue_token};
use crate::observability::metrics;
use crate::security::csrf_guard::csrf_middleware;
use crate::security::headers::with_security_headers;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::security::sweeper::Sweeper;

/// Path of the token issue / invalidation endpoint.
pub const TOKEN_PATH: &str = "/api/v1/csrf-token";

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    pub protector: Arc<CsrfProtector>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: GuardConfig) -> Self {
        let protector = Arc::new(CsrfProtector::new(config.csrf.clone()));
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self {
            config: Arc::new(config),
            protector,
            limiter,
        }
    }
}

/// HTTP server for the guard.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server. `api` holds the application routes to protect.
    pub fn new(config: GuardConfig, api: Router) -> Self {
        let state = AppState::new(config);
        let router = Self::build_router(state.clone(), api);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, api: Router) -> Router {
        let config = state.config.clone();

        // Outermost layer runs first: CSRF, then rate limit, then the handler.
        let guarded = Router::new()
            .route(TOKEN_PATH, get(issue_token).delete(invalidate_token))
            .with_state(state.clone())
            .merge(api)
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
            .layer(middleware::from_fn_with_state(state, csrf_middleware));

        let mut router = Router::new()
            .route("/health", get(health))
            .merge(guarded)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_requests));

        if config.security.enable_headers {
            router = with_security_headers(router);
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Shared state (protector, limiter, config).
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            enforcement = self.state.config.csrf.enforcement.as_str(),
            rate_limit = self.state.config.rate_limit.enabled,
            "HTTP server starting"
        );

        let sweeper = Sweeper::new(
            self.state.protector.clone(),
            self.state.limiter.clone(),
            Duration::from_secs(self.state.config.csrf.sweep_interval_secs),
        );
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Record request count and latency.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
