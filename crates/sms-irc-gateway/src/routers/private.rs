//! Private-message command surface: REGISTER / VALIDATE / HELP over
//! direct messages to the bot.

use crate::text::HELP_TEXT;
use crate::Gateway;
use tracing::{error, instrument};
use user_store::StoreError;

/// Handle one direct message. All outcomes are reported back to the
/// requester as notices; nothing here can take the process down.
#[instrument(skip(gateway, text))]
pub async fn handle_private_message(gateway: &Gateway, nick: &str, text: &str) {
    let trimmed = text.trim();
    let (command, rest) = match trimmed.split_once(' ') {
        Some((command, rest)) => (command, Some(rest)),
        None => (trimmed, None),
    };
    let args: Vec<&str> = rest.map(|r| r.split(' ').collect()).unwrap_or_default();

    match command.to_lowercase().as_str() {
        "register" => {
            if args.len() != 2 {
                notice(gateway, nick, "Invalid number of arguments; 2 expected").await;
                return;
            }
            register(gateway, nick, args[0], args[1]).await;
        }
        "validate" => {
            if args.len() != 2 {
                notice(gateway, nick, "Invalid number of arguments; 2 expected").await;
                return;
            }
            validate(gateway, nick, args[0], args[1]).await;
        }
        "help" => {
            for line in HELP_TEXT.lines().filter(|l| !l.is_empty()) {
                notice(gateway, nick, line).await;
            }
        }
        _ => notice(gateway, nick, "Unrecognized command. See HELP.").await,
    }
}

/// Registration workflow: create the pending identity, then text the
/// validation code to the claimed number.
async fn register(gateway: &Gateway, nick: &str, username: &str, raw_phone: &str) {
    let result = {
        let mut store = gateway.store.lock().await;
        store.register(username, raw_phone).await
    };

    let pending = match result {
        Ok(pending) => pending,
        // Both are user-correctable and written for direct display.
        Err(StoreError::Validation(reason)) | Err(StoreError::PhoneFormat(reason)) => {
            notice(gateway, nick, &reason).await;
            return;
        }
        Err(e) => {
            error!("Registration failed for {username}: {e}");
            notice(gateway, nick, "Unexpected error").await;
            return;
        }
    };

    let body = format!(
        "Hi, {}! This is the IRC gateway. Your validation code is: {}",
        pending.username, pending.auth_code
    );
    match gateway.sms.send_message(&pending.number, &body).await {
        Ok(_) => {
            notice(
                gateway,
                nick,
                "I sent a validation code to your phone. Use the VALIDATE command to validate your phone.",
            )
            .await;
        }
        Err(e) => {
            error!("Could not text validation code to {}: {e}", pending.number);
            notice(gateway, nick, "Unexpected error").await;
        }
    }
}

async fn validate(gateway: &Gateway, nick: &str, username: &str, code: &str) {
    let result = {
        let mut store = gateway.store.lock().await;
        store.validate(username, code).await
    };
    match result {
        Ok(true) => notice(gateway, nick, "Validation successful!").await,
        Ok(false) => notice(gateway, nick, "Validation failed.").await,
        Err(e) => {
            error!("Validation failed for {username}: {e}");
            notice(gateway, nick, "Unexpected error").await;
        }
    }
}

async fn notice(gateway: &Gateway, nick: &str, text: &str) {
    let handle = gateway.irc.read().await.clone();
    if let Some(handle) = handle {
        if let Err(e) = handle.notice(nick, text).await {
            error!("Dropped notice to {nick}: {e}");
        }
    }
}
