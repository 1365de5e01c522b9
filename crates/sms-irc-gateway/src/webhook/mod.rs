//! Webhook HTTP server: the provider's path into the gateway.

mod handlers;
pub mod signature;

use crate::media::MediaRelay;
use crate::Gateway;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub relay: Arc<MediaRelay>,
    /// Provider auth token: the signature key.
    pub auth_token: String,
    /// The exact URL the provider signs requests against.
    pub callback_url: String,
}

/// Build the webhook router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/onsms", get(handlers::onsms_query).post(handlers::onsms_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
