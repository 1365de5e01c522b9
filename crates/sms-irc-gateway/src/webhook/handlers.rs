//! Webhook request handlers.

use super::signature;
use super::AppState;
use crate::media::MediaItem;
use crate::routers;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use std::collections::HashMap;
use tracing::warn;

/// Signature header the provider attaches to every webhook request.
const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Index page; nothing is served here.
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<body style="background-color:#fff"><pre style="color:#eee">There's nothing to see here</pre></body>"#,
    )
}

/// GET variant: parameters arrive in the query string.
pub async fn onsms_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle_webhook(state, headers, params).await
}

/// POST variant: parameters arrive form-encoded.
pub async fn onsms_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    handle_webhook(state, headers, params).await
}

/// Shared webhook path. Malformed or unauthentic requests get a bare
/// 400 and never reach the router; everything else gets 200 with a
/// reply document.
async fn handle_webhook(
    state: AppState,
    headers: HeaderMap,
    params: HashMap<String, String>,
) -> Response {
    let Some(provided) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let (Some(from), Some(body)) = (params.get("From"), params.get("Body")) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if !signature::validate(&state.auth_token, &state.callback_url, &params, provided) {
        warn!("Invalid webhook signature");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let media = collect_media(&params);
    let reply = routers::sms::handle_inbound(&state, from, body, media).await;

    (
        [(header::CONTENT_TYPE, "text/xml")],
        reply.to_xml(),
    )
        .into_response()
}

/// Pull the indexed `MediaUrl{i}` / `MediaContentType{i}` pairs out of
/// the request.
fn collect_media(params: &HashMap<String, String>) -> Vec<MediaItem> {
    let count = params
        .get("NumMedia")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    (0..count)
        .filter_map(|i| {
            let url = params.get(&format!("MediaUrl{i}"))?.clone();
            let content_type = params
                .get(&format!("MediaContentType{i}"))
                .cloned()
                .unwrap_or_default();
            Some(MediaItem { url, content_type })
        })
        .collect()
}
