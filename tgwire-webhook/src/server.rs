//! Axum router and server for webhook delivery.
//!
//! Request handling:
//!
//! | request                      | action                                   |
//! |------------------------------|------------------------------------------|
//! | POST to the configured path  | parse envelope, route valid updates, 200 |
//! | POST elsewhere               | 404, body unread                         |
//! | other method, configured path| 405, body unread                         |
//! | other method, elsewhere      | 501, body unread                         |
//! | unparsable / invalid body    | 400, nothing delivered                   |
//! | `ok: false` envelope body    | 200, nothing delivered                   |
//!
//! Every rejection is recoverable per-request: it produces a status
//! code and an optional callback invocation, never a crash, and never
//! affects other in-flight or future requests.

use std::sync::Arc;

use axum::http::{Method, StatusCode, Uri};
use axum::{Router, extract::State, routing::post};
use bytes::Bytes;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use tgwire_api::envelope::ApiResponse;
use tgwire_api::types::Update;
use tgwire_core::UpdateRouter;
use tgwire_core::events::classify::classify;

use crate::config::WebhookConfig;

/// A declined request, as reported to the rejection callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct WebhookRejection {
    pub status: StatusCode,
    pub message: String,
}

impl WebhookRejection {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

type RejectionCallback = Arc<dyn Fn(&WebhookRejection) + Send + Sync>;

/// Shared state of the webhook handlers: the fan-out router plus an
/// optional rejection callback.
#[derive(Clone)]
pub struct WebhookState {
    router: Arc<UpdateRouter>,
    on_rejection: Option<RejectionCallback>,
}

impl WebhookState {
    /// Deliver accepted updates through `router`.
    pub fn new(router: Arc<UpdateRouter>) -> Self {
        Self {
            router,
            on_rejection: None,
        }
    }

    /// Invoke `callback` for every declined request.
    pub fn on_rejection(
        mut self,
        callback: impl Fn(&WebhookRejection) + Send + Sync + 'static,
    ) -> Self {
        self.on_rejection = Some(Arc::new(callback));
        self
    }

    fn reject(&self, rejection: WebhookRejection) -> StatusCode {
        debug!(status = %rejection.status, message = %rejection.message, "Declining webhook request");
        if let Some(callback) = &self.on_rejection {
            callback(&rejection);
        }
        rejection.status
    }
}

/// Build the webhook router.
///
/// Accepts POSTed update envelopes on the configured path and declines
/// everything else per the table in the module docs.  Mount the result
/// into a larger `Router` or serve it directly with [`serve`].
pub fn webhook_router(config: &WebhookConfig, state: WebhookState) -> Router {
    Router::new()
        .route(
            &config.normalized_path(),
            post(accept_updates).fallback(method_not_allowed),
        )
        .fallback(unmatched_path)
        .with_state(state)
}

/// Bind the configured address and serve the webhook router until a
/// shutdown signal arrives.
pub async fn serve(config: &WebhookConfig, state: WebhookState) -> Result<(), std::io::Error> {
    let router = webhook_router(config, state);
    let listener = TcpListener::bind(config.listen).await?;
    info!("Webhook listener on {}", config.listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Completes when SIGTERM or SIGINT (Ctrl+C) is received.
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down webhook listener");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down webhook listener");
        }
    }
}

/// `POST` on the configured path: accumulate the body, parse it as an
/// update envelope, classify and route each structurally valid update.
async fn accept_updates(State(state): State<WebhookState>, body: Bytes) -> StatusCode {
    let envelope: ApiResponse<Vec<Update>> = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Webhook body is not an update envelope");
            return state.reject(WebhookRejection::new(StatusCode::BAD_REQUEST, "Bad Request"));
        }
    };

    if !envelope.ok {
        // An error envelope carries nothing to deliver; acknowledging
        // it keeps the remote side from re-pushing.
        return StatusCode::OK;
    }

    let updates = envelope.result.unwrap_or_default();
    debug!(count = updates.len(), "Webhook batch received");

    for update in &updates {
        match classify(update) {
            Some(tagged) => state.router.emit(tagged),
            None => warn!(
                update_id = update.update_id,
                "Ignoring pushed update with no recognizable payload"
            ),
        }
    }

    StatusCode::OK
}

/// Non-`POST` on the configured path.
async fn method_not_allowed(
    State(state): State<WebhookState>,
    method: Method,
    uri: Uri,
) -> StatusCode {
    state.reject(WebhookRejection::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("invalid {method} request to {uri}"),
    ))
}

/// Any request outside the configured path.
async fn unmatched_path(State(state): State<WebhookState>, method: Method, uri: Uri) -> StatusCode {
    let status = if method == Method::POST {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NOT_IMPLEMENTED
    };
    state.reject(WebhookRejection::new(
        status,
        format!("invalid {method} request to {uri}"),
    ))
}
