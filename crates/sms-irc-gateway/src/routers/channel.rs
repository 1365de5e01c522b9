//! Channel command router: `!msg` / `!sms` relay from the channel to a
//! registered phone.

use crate::error::AppResult;
use crate::Gateway;
use tracing::{debug, instrument};

/// Handle one line posted to the bridged channel.
///
/// The line splits at most twice, so the body keeps its spaces and never
/// includes the command or target tokens. Quiet users are reported
/// without attempting delivery; a provider failure on the actual send is
/// deliberately not caught here: it propagates and takes the process
/// down rather than being swallowed.
#[instrument(skip(gateway, text))]
pub async fn handle_channel_line(gateway: &Gateway, speaker: &str, text: &str) -> AppResult<()> {
    let mut split = text.splitn(3, ' ');
    let command = split.next().unwrap_or("");

    if command != "!msg" && command != "!sms" {
        if command.starts_with(&gateway.nick) {
            post(gateway, &format!("{speaker}: I respond to !msg or !sms")).await;
        }
        return Ok(());
    }

    let Some(target) = split.next() else {
        return Ok(());
    };

    let (number, quiet) = {
        let store = gateway.store.lock().await;
        (
            store.number_for_username(target),
            store.quiet(target).unwrap_or(false),
        )
    };

    let Some(number) = number else {
        post(
            gateway,
            &format!("{speaker}: I don't know who {target} is"),
        )
        .await;
        return Ok(());
    };

    if quiet {
        post(
            gateway,
            &format!("{speaker}: {target} has asked me to be quiet"),
        )
        .await;
        return Ok(());
    }

    let body = split.next().map(str::trim).unwrap_or("");
    if body.is_empty() {
        post(
            gateway,
            &format!("{speaker}: What should I tell {target}?"),
        )
        .await;
        return Ok(());
    }

    gateway
        .sms
        .send_message(&number, &format!("<{speaker}> {body}"))
        .await?;
    post(gateway, &format!("{speaker}: sent!")).await;
    Ok(())
}

/// Post to the bridged channel if the session is up. Channel events only
/// arrive while connected, so a missing handle just means the link
/// dropped mid-handling.
async fn post(gateway: &Gateway, text: &str) {
    let handle = gateway.irc.read().await.clone();
    match handle {
        Some(handle) => {
            if let Err(e) = handle.privmsg(&gateway.channel, text).await {
                debug!("Dropped channel post: {e}");
            }
        }
        None => debug!("No IRC session, dropped channel post"),
    }
}
