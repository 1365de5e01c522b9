//! IRC/SMS gateway - main entry point.

use anyhow::Context;
use irc_session::{IrcEvent, IrcSession, SessionConfig};
use sms_client::SmsClient;
use sms_irc_gateway::config::Config;
use sms_irc_gateway::error::AppResult;
use sms_irc_gateway::media::MediaRelay;
use sms_irc_gateway::storage::StorageClient;
use sms_irc_gateway::webhook::{self, AppState};
use sms_irc_gateway::{routers, Gateway};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_store::UserStore;

const IRC_EVENT_BUFFER: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting IRC/SMS gateway...");

    // User store: the sole source of truth across restarts.
    let store = UserStore::load_or_init(&config.store.path, &config.store.default_region).await?;
    info!("User store ready ({} records)", store.len());
    let store = Arc::new(Mutex::new(store));

    // Provider clients
    let sms = SmsClient::new(
        &config.twilio.api_base_url,
        &config.twilio.account_sid,
        &config.twilio.auth_token,
        &config.twilio.phone_number,
    )?;

    let storage = StorageClient::new(
        &config.media.s3_endpoint,
        &config.media.s3_bucket,
        &config.media.s3_access_key,
        &config.media.s3_secret_key,
    )
    .context("Failed to create storage client")?;

    let relay = MediaRelay::new(
        storage,
        sms.clone(),
        config.media.bucket_prefix.clone(),
        config.media.delete_retry_delay,
        config.media.delete_max_attempts,
    )
    .context("Failed to create media relay")?;

    // IRC session; its handle slot is what the webhook side reads.
    let session = IrcSession::new(SessionConfig {
        host: config.irc.host.clone(),
        port: config.irc.port,
        nick: config.irc.nick.clone(),
        channel: config.irc.channel.clone(),
        login_message: config.irc.login_message.clone(),
        login_target: config.irc.login_target.clone(),
        verify_tls: config.irc.verify_tls,
    });

    let gateway = Arc::new(Gateway {
        store,
        sms,
        irc: session.handle_slot(),
        channel: config.irc.channel.clone(),
        nick: config.irc.nick.clone(),
    });

    // Webhook server
    let state = AppState {
        gateway: gateway.clone(),
        relay: Arc::new(relay),
        auth_token: config.twilio.auth_token.clone(),
        callback_url: config.twilio.callback_url.clone(),
    };
    let app = webhook::router(state);

    let addr = SocketAddr::new(
        config.http.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.http.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind webhook listener")?;
    info!("Webhook listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Webhook server error: {e}");
            std::process::exit(1);
        }
    });

    // The first IRC connection must succeed; after that, a lost link is
    // retried forever while a refused one ends the process.
    let conn = session
        .connect()
        .await
        .context("Initial IRC connection failed")?;

    let (events_tx, mut events_rx) = mpsc::channel(IRC_EVENT_BUFFER);
    tokio::spawn(async move {
        let mut pending = Some(conn);
        loop {
            let current = match pending.take() {
                Some(conn) => conn,
                None => match session.connect().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("IRC reconnection failed: {e}");
                        std::process::exit(1);
                    }
                },
            };
            match session.run(current, &events_tx).await {
                // Event receiver dropped: the gateway is shutting down.
                Ok(()) => break,
                Err(e) => warn!("IRC link lost: {e}"),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });

    // Main event loop
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(IrcEvent::Channel { nick, text }) => {
                    // A provider failure here is deliberately fatal; see
                    // the channel router.
                    routers::channel::handle_channel_line(&gateway, &nick, &text).await?;
                }
                Some(IrcEvent::Private { nick, text }) => {
                    routers::private::handle_private_message(&gateway, &nick, &text).await;
                }
                None => break,
            },
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
