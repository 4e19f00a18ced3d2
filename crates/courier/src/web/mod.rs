//! HTTP surface
//!
//! Mounts the chat UI, the optional login dance, and the chat API on an
//! axum router behind a cookie-session layer. One request per call: each
//! chat request awaits the downstream dispatch to completion.

pub mod handlers;
pub mod session;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::agent::AgentDispatcher;
use crate::auth::{AuthFlow, ServiceCredentialStore};
use crate::config::{Config, RelayMode};
use crate::error::{CourierError, Result};
use crate::relay::WebhookRelay;

/// The backend `/api/chat` dispatches to, fixed at startup
pub enum Dispatcher {
    Webhook(WebhookRelay),
    Agent(AgentDispatcher),
}

/// Shared application state for all handlers
pub struct AppState {
    /// Full configuration, resolved once at process start
    pub config: Config,
    /// Auth flow; present only when authentication is enabled
    pub auth: Option<AuthFlow>,
    /// The configured relay backend
    pub dispatcher: Dispatcher,
}

/// The main relay server
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Wire up the dispatcher and auth flow from configuration.
    ///
    /// In agent mode this also runs the service-credential preflight so a
    /// missing or expired token file is visible at startup rather than on
    /// the first tool call.
    pub async fn new(config: Config) -> Result<Self> {
        let dispatcher = match config.relay.mode {
            RelayMode::Webhook => {
                tracing::info!("Webhook mode, forwarding to {}", config.relay.webhook_url);
                Dispatcher::Webhook(WebhookRelay::new(config.relay.clone())?)
            }
            RelayMode::Agent => {
                tracing::info!("Agent mode, model {}", config.agent.model);
                let credentials = Arc::new(ServiceCredentialStore::new(
                    config.agent.credentials_file.clone(),
                ));
                match credentials.access_token().await {
                    Ok(_) => tracing::info!("Service credentials are valid"),
                    Err(e) => tracing::warn!(
                        "Service credentials unavailable, tool calls will fail: {e}"
                    ),
                }
                Dispatcher::Agent(AgentDispatcher::new(&config.agent, credentials)?)
            }
        };

        let auth = config
            .auth
            .enabled
            .then(|| AuthFlow::new(config.auth.clone()));

        Ok(Self {
            state: Arc::new(AppState {
                config,
                auth,
                dispatcher,
            }),
        })
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let addr: SocketAddr = self
            .state
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| CourierError::Config(format!("Invalid listen address: {e}")))?;

        let app = create_router(self.state.clone());

        tracing::info!("Starting relay server on {addr}");
        if self.state.config.auth.enabled {
            tracing::info!("Authentication enabled, login routes mounted");
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CourierError::Config(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CourierError::Config(format!("Server error: {e}")))?;

        tracing::info!("Relay server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured.
///
/// The login routes exist only in authenticated deployments; anonymous
/// deployments serve the chat UI directly.
pub fn create_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnSessionEnd);

    let mut router = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat));

    if state.config.auth.enabled {
        router = router
            .route("/login", get(handlers::login))
            .route("/auth", get(handlers::begin_auth))
            .route("/oauth2callback", get(handlers::oauth_callback))
            .route("/logout", get(handlers::logout));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
        .with_state(state)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
