//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend clients and shared handler state
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, tracing, request logging, timeout)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::{
    IdentityProvider, PostgrestSnippets, SnippetStore, SupabaseAuth, SupabaseClient, Unconfigured,
};
use crate::config::AppConfig;
use crate::http::handlers::{auth, cron, debug, health, snippets};
use crate::notify::CronNotifier;
use crate::request_log::{log_requests, RequestLogger};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub snippets: Arc<dyn SnippetStore>,
    pub notifier: CronNotifier,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        identity: Arc<dyn IdentityProvider>,
        snippets: Arc<dyn SnippetStore>,
        notifier: CronNotifier,
    ) -> Self {
        Self {
            config,
            identity,
            snippets,
            notifier,
            started_at: Instant::now(),
        }
    }

    /// User-facing calls use the anon key; the service-role key is only a
    /// fallback. Without a store URL every backend call is refused.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let store = &config.store;
        let key = store.anon_key.as_deref().or(store.service_role_key.as_deref());

        let client = match SupabaseClient::from_config(store, key) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize backend client");
                None
            }
        };

        let (identity, snippets): (Arc<dyn IdentityProvider>, Arc<dyn SnippetStore>) = match client {
            Some(client) => (
                Arc::new(SupabaseAuth::new(client.clone())),
                Arc::new(PostgrestSnippets::new(client, store.snippets_table.clone())),
            ),
            None => {
                tracing::warn!("Backend URL or key not set, auth and snippet routes will return 503");
                (Arc::new(Unconfigured), Arc::new(Unconfigured))
            }
        };

        let notifier = CronNotifier::from_config(&config);
        Self::new(config, identity, snippets, notifier)
    }
}

/// HTTP server for the Snippit API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let logger = RequestLogger::from_config(&config);
        if !logger.is_configured() {
            tracing::warn!("Request log store not configured, request records will be dropped");
        }

        let state = AppState::from_config(Arc::new(config));
        Self::with_state(state, logger)
    }

    /// Build a server around prepared state, e.g. in-memory backends.
    pub fn with_state(state: AppState, logger: RequestLogger) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state, logger);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The timeout sits inside the request logger so timed-out requests
    /// are still recorded.
    #[allow(deprecated)]
    fn build_router(state: AppState, logger: RequestLogger) -> Router {
        let timeout = Duration::from_secs(state.config.limits.request_timeout_secs);

        let mut router = Router::new()
            .route("/api/health", get(health::health))
            .route("/api/cron/health-check", get(cron::health_check))
            .route("/api/snippets", get(snippets::list).post(snippets::create))
            .route(
                "/api/snippets/{id}",
                patch(snippets::update).delete(snippets::remove),
            )
            .route("/api/auth/register", post(auth::register))
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/logout", post(auth::logout))
            .route("/api/auth/reset-password", post(auth::reset_password))
            .layer(TimeoutLayer::new(timeout))
            .layer(middleware::from_fn_with_state(logger, log_requests));

        if state.config.debug.endpoints_enabled {
            tracing::warn!("Debug endpoints enabled");
            router = router
                .route("/api/debug", get(debug::store_status))
                .route("/api/debug/email-config", get(debug::email_config));
        }

        router
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
