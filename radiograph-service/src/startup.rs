//! Application startup and lifecycle management.

use crate::config::{ProviderKind, Settings};
use crate::handlers::{
    analysis::{analyze_handler, clear_handler},
    app::{health_check, index, readiness_check},
    download::{download_report, image_preview},
    metrics::metrics,
    session::session_snapshot,
    upload::upload_handler,
};
use crate::middleware::metrics::metrics_middleware;
use crate::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use crate::services::providers::mock::MockVisionProvider;
use crate::services::providers::VisionProvider;
use crate::services::{AnalysisClient, SessionRegistry};
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Router knobs that come from configuration.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub max_upload_bytes: usize,
    pub secure_cookie: bool,
    pub session_idle: Duration,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

/// Bundled assets, resolved against this crate's source tree.
pub fn default_static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024,
            secure_cookie: false,
            session_idle: Duration::from_secs(24 * 60 * 60),
            static_dir: default_static_dir(),
        }
    }
}

impl From<&Settings> for RouterOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_upload_bytes: settings.upload.max_bytes,
            secure_cookie: settings.session.secure_cookie,
            session_idle: settings.session.idle_timeout(),
            static_dir: settings
                .server
                .static_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(default_static_dir),
        }
    }
}

pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(options.secure_cookie)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            options.session_idle.as_secs() as i64,
        )));

    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(options.max_upload_bytes)),
        )
        .route("/analyze", post(analyze_handler))
        .route("/clear", post(clear_handler))
        .route("/image", get(image_preview))
        .route("/report", get(download_report))
        .route("/api/session", get(session_snapshot))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route_layer(from_fn(metrics_middleware))
        .nest_service("/static", ServeDir::new(&options.static_dir))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        // Outermost so the span above sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Construct the configured analysis provider.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn VisionProvider>, AppError> {
    let analysis = &settings.analysis;
    let provider: Arc<dyn VisionProvider> = match analysis.provider {
        ProviderKind::Gemini => {
            let config = GeminiConfig {
                api_key: analysis.api_key.clone(),
                model: analysis.model.clone(),
                base_url: analysis.base_url.clone(),
                request_timeout: analysis.request_timeout_secs.map(Duration::from_secs),
            };
            let provider = GeminiVisionProvider::new(config)
                .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            Arc::new(provider)
        }
        ProviderKind::Mock => Arc::new(MockVisionProvider::replying(analysis.mock_reply.clone())),
    };

    tracing::info!(
        provider = ?analysis.provider,
        model = %provider.model(),
        "Initialized analysis provider"
    );

    Ok(provider)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    options: RouterOptions,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let provider = build_provider(&settings)?;
        Self::build_with_provider(settings, provider).await
    }

    /// Build with an explicit provider (tests, alternative backends).
    pub async fn build_with_provider(
        settings: Settings,
        provider: Arc<dyn VisionProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(AnalysisClient::new(provider), SessionRegistry::new());

        // Port 0 = random port for testing
        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
            options: RouterOptions::from(&settings),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until a shutdown signal arrives, sweeping idle sessions in the
    /// background.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let sessions = self.state.sessions.clone();
        let idle = self.options.session_idle;
        let sweep_every = (idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_every);
            loop {
                interval.tick().await;
                let evicted = sessions.sweep(idle);
                if evicted > 0 {
                    tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
                }
            }
        });

        let router = build_router(self.state, &self.options);
        tracing::info!("Starting radiograph-service on port {}", self.port);

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        sweeper.abort();
        result
    }
}
