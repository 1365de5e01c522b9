//! Shared fixtures for gateway integration tests.
#![allow(dead_code)]

use irc_session::{IrcHandle, Outbound, SharedHandle};
use sms_client::SmsClient;
use sms_irc_gateway::Gateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use user_store::UserStore;
use wiremock::MockServer;

/// A "connected" IRC slot whose outbound traffic lands on the returned
/// receiver.
pub fn connected_irc() -> (SharedHandle, mpsc::Receiver<Outbound>) {
    let (tx, rx) = mpsc::channel(16);
    (Arc::new(RwLock::new(Some(IrcHandle::new(tx)))), rx)
}

/// A slot with no live session.
pub fn disconnected_irc() -> SharedHandle {
    Arc::new(RwLock::new(None))
}

/// Gateway wired to a mock SMS provider and a fresh store file.
pub async fn test_gateway(
    sms_server: &MockServer,
    irc: SharedHandle,
    dir: &tempfile::TempDir,
) -> Arc<Gateway> {
    let store = UserStore::load_or_init(dir.path().join("users.json"), "US")
        .await
        .unwrap();
    let sms = SmsClient::new(sms_server.uri(), "AC123", "token", "+15005550006").unwrap();

    Arc::new(Gateway {
        store: Arc::new(Mutex::new(store)),
        sms,
        irc,
        channel: "#lounge".into(),
        nick: "gatewaybot".into(),
    })
}

/// Register and validate a user directly through the store.
pub async fn activate_user(gateway: &Gateway, username: &str, phone: &str) {
    let mut store = gateway.store.lock().await;
    let pending = store.register(username, phone).await.unwrap();
    assert!(store.validate(username, &pending.auth_code).await.unwrap());
}

/// Receive one outbound IRC command, failing the test if none arrives.
pub async fn expect_outbound(rx: &mut mpsc::Receiver<Outbound>) -> Outbound {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for IRC output")
        .expect("IRC channel closed")
}

/// Percent-encode one form value the way the provider does.
pub fn urlencode(value: &str) -> String {
    let mut out = String::new();
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Encode a parameter list as a form body / query string.
pub fn form_encode(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
