//! Inbound SMS command router.
//!
//! Runs only after the webhook layer verified the request. The sender's
//! number decides everything: an unknown number is dropped with an empty
//! reply; a known one either runs a self-service command or gets its
//! message forwarded into the channel.

use crate::media::MediaItem;
use crate::text::{DEREGISTER_REPLY, QUIET_REPLY, RESUME_REPLY, SMS_HELP_TEXT};
use crate::twiml::TwimlResponse;
use crate::webhook::AppState;
use irc_session::IrcHandle;
use tracing::{debug, error, instrument, warn};

/// Handle one verified inbound message. Always produces exactly one
/// reply document; the channel forward (and its media work) runs as a
/// spawned task so the provider gets its acknowledgment promptly.
#[instrument(skip(state, body, media))]
pub async fn handle_inbound(
    state: &AppState,
    from: &str,
    body: &str,
    media: Vec<MediaItem>,
) -> TwimlResponse {
    // One lock scope per invocation: the lookup and any mutation are
    // atomic with respect to other handlers.
    let mut store = state.gateway.store.lock().await;

    let Some(username) = store.username_for_number(from) else {
        debug!("Inbound message from unregistered number, dropping");
        return TwimlResponse::empty();
    };

    match body.trim().to_lowercase().as_str() {
        "!quiet" | "stop" => {
            if let Err(e) = store.set_quiet(&username, true).await {
                error!("Failed to persist quiet flag for {username}: {e}");
            }
            TwimlResponse::message(QUIET_REPLY)
        }
        "!hi" => {
            if let Err(e) = store.set_quiet(&username, false).await {
                error!("Failed to persist quiet flag for {username}: {e}");
            }
            TwimlResponse::message(RESUME_REPLY)
        }
        "!deregister" => {
            if let Err(e) = store.deregister(&username).await {
                error!("Failed to deregister {username}: {e}");
            }
            TwimlResponse::message(DEREGISTER_REPLY)
        }
        "!help" | "help" => TwimlResponse::message(SMS_HELP_TEXT),
        _ => {
            drop(store);
            let handle = state.gateway.irc.read().await.clone();
            match handle {
                Some(handle) => {
                    tokio::spawn(forward_to_channel(
                        state.clone(),
                        handle,
                        username,
                        body.to_string(),
                        media,
                    ));
                }
                // A disconnected bot cannot relay; the message is gone.
                None => warn!("No IRC session, dropping inbound message from {username}"),
            }
            TwimlResponse::empty()
        }
    }
}

/// Post `<username> text` (plus any re-hosted media links) to the
/// channel, then clean up the provider-side media copies.
async fn forward_to_channel(
    state: AppState,
    handle: IrcHandle,
    username: String,
    body: String,
    media: Vec<MediaItem>,
) {
    let mut parts = vec![format!("<{username}> {body}").trim().to_string()];
    parts.extend(state.relay.rehost(&media).await);

    if let Err(e) = handle.privmsg(&state.gateway.channel, &parts.join(" ")).await {
        warn!("IRC session went away, dropped forward from {username}: {e}");
        return;
    }

    state.relay.delete_source_media(&media).await;
}
