//! Webhook integration tests: boundary checks, command replies, and the
//! channel forward path.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use irc_session::{Outbound, SharedHandle};
use sms_client::SmsClient;
use sms_irc_gateway::media::MediaRelay;
use sms_irc_gateway::storage::StorageClient;
use sms_irc_gateway::webhook::{router, signature, AppState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLBACK_URL: &str = "https://gw.example.com/onsms";
const AUTH_TOKEN: &str = "token";

const EMPTY_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#;

async fn test_state(server: &MockServer, irc: SharedHandle, dir: &tempfile::TempDir) -> AppState {
    let gateway = test_gateway(server, irc, dir).await;
    let storage = StorageClient::new(server.uri(), "media.example.com", "access", "secret").unwrap();
    let sms = SmsClient::new(server.uri(), "AC123", "token", "+15005550006").unwrap();
    let relay = MediaRelay::new(storage, sms, "irc/", Duration::from_millis(10), Some(3)).unwrap();

    AppState {
        gateway,
        relay: Arc::new(relay),
        auth_token: AUTH_TOKEN.into(),
        callback_url: CALLBACK_URL.into(),
    }
}

fn sign(params: &[(&str, &str)], token: &str) -> String {
    let map: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    signature::compute(token, CALLBACK_URL, &map)
}

fn signed_post(params: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/onsms")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("X-Twilio-Signature", sign(params, AUTH_TOKEN))
        .body(Body::from(form_encode(params)))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;

    let request = Request::builder()
        .method("POST")
        .uri("/onsms")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form_encode(&[
            ("From", "+14155550123"),
            ("Body", "hello"),
        ])))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;

    let no_body = [("From", "+14155550123")];
    let response = router(state.clone()).oneshot(signed_post(&no_body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let no_from = [("Body", "hello")];
    let response = router(state).oneshot(signed_post(&no_from)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_signature_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;

    let params = [("From", "+14155550123"), ("Body", "hello")];
    let request = Request::builder()
        .method("POST")
        .uri("/onsms")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("X-Twilio-Signature", sign(&params, "wrong-token"))
        .body(Body::from(form_encode(&params)))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_sender_gets_an_empty_reply() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;

    let params = [("From", "+19995550000"), ("Body", "hello?")];
    let response = router(state).oneshot(signed_post(&params)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/xml"
    );
    assert_eq!(body_text(response).await, EMPTY_REPLY);
}

#[tokio::test]
async fn quiet_and_resume_commands_toggle_the_flag() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [("From", "+14155550123"), ("Body", "!quiet")];
    let response = router(state.clone()).oneshot(signed_post(&params)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("I won&apos;t send any messages to you."));
    assert_eq!(state.gateway.store.lock().await.quiet("alice"), Some(true));

    // STOP is an alias, matched case-insensitively.
    let params = [("From", "+14155550123"), ("Body", "STOP")];
    let response = router(state.clone()).oneshot(signed_post(&params)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let params = [("From", "+14155550123"), ("Body", "!hi")];
    let response = router(state.clone()).oneshot(signed_post(&params)).await.unwrap();
    assert!(body_text(response).await.contains("sending messages from IRC"));
    assert_eq!(state.gateway.store.lock().await.quiet("alice"), Some(false));
}

#[tokio::test]
async fn deregister_forgets_the_identity_for_good() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let (irc, mut rx) = connected_irc();
    let state = test_state(&server, irc, &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [("From", "+14155550123"), ("Body", "!deregister")];
    let response = router(state.clone()).oneshot(signed_post(&params)).await.unwrap();
    assert!(body_text(response).await.contains("forgotten who you are"));

    {
        let store = state.gateway.store.lock().await;
        assert!(store.is_empty());
        assert_eq!(store.username_for_number("+14155550123"), None);
    }

    // A later channel relay no longer knows the name.
    sms_irc_gateway::routers::channel::handle_channel_line(
        &state.gateway,
        "bob",
        "!msg alice are you still there?",
    )
    .await
    .unwrap();
    assert_eq!(
        expect_outbound(&mut rx).await,
        Outbound::Privmsg {
            target: "#lounge".into(),
            text: "bob: I don't know who alice is".into(),
        }
    );
}

#[tokio::test]
async fn help_command_replies_with_the_summary() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [("From", "+14155550123"), ("Body", "help")];
    let response = router(state).oneshot(signed_post(&params)).await.unwrap();
    assert!(body_text(response)
        .await
        .contains("Commands: !QUIET/STOP, !HI, !DEREGISTER, !HELP/HELP"));
}

#[tokio::test]
async fn unmatched_body_is_forwarded_to_the_channel() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let (irc, mut rx) = connected_irc();
    let state = test_state(&server, irc, &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [
        ("From", "+14155550123"),
        ("Body", "hello from the road"),
        ("NumMedia", "0"),
    ];
    let response = router(state).oneshot(signed_post(&params)).await.unwrap();

    // The webhook caller gets its empty acknowledgment right away...
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, EMPTY_REPLY);

    // ...and the forward lands on the channel from the spawned task.
    assert_eq!(
        expect_outbound(&mut rx).await,
        Outbound::Privmsg {
            target: "#lounge".into(),
            text: "<alice> hello from the road".into(),
        }
    );
}

#[tokio::test]
async fn forward_with_media_appends_rehosted_link_and_deletes_source() {
    let server = MockServer::start().await;
    let media_path = "/2010-04-01/Accounts/AC123/Messages/MM1/Media/ME1";
    Mock::given(method("GET"))
        .and(path(media_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{media_path}.json")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let (irc, mut rx) = connected_irc();
    let state = test_state(&server, irc, &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let media_url = format!("{}{media_path}", server.uri());
    let params = [
        ("From", "+14155550123"),
        ("Body", "check this out"),
        ("NumMedia", "1"),
        ("MediaUrl0", media_url.as_str()),
        ("MediaContentType0", "image/jpeg"),
    ];
    let response = router(state).oneshot(signed_post(&params)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let Outbound::Privmsg { target, text } = expect_outbound(&mut rx).await else {
        panic!("expected a channel post");
    };
    assert_eq!(target, "#lounge");
    assert!(text.starts_with("<alice> check this out "));
    assert!(text.contains("http://media.example.com/irc/"));
    assert!(text.contains(".jpg"));

    // Give the spawned task a moment to finish the provider deletion;
    // the DELETE mock's expect(1) is verified when the server drops.
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn forward_is_dropped_without_an_irc_session() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [("From", "+14155550123"), ("Body", "anyone there?")];
    let response = router(state).oneshot(signed_post(&params)).await.unwrap();

    // Still a well-formed acknowledgment; the message itself is gone.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, EMPTY_REPLY);
}

#[tokio::test]
async fn get_requests_work_with_query_parameters() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;
    activate_user(&state.gateway, "alice", "+14155550123").await;

    let params = [("From", "+14155550123"), ("Body", "!quiet")];
    let request = Request::builder()
        .method("GET")
        .uri(format!("/onsms?{}", form_encode(&params)))
        .header("X-Twilio-Signature", sign(&params, AUTH_TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("I won&apos;t send any messages"));
    assert_eq!(state.gateway.store.lock().await.quiet("alice"), Some(true));
}

#[tokio::test]
async fn index_page_has_nothing_to_see() {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let state = test_state(&server, disconnected_irc(), &dir).await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("There's nothing to see here"));
}
