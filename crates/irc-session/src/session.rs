//! The IRC session: connection lifecycle and the read loop.

use crate::error::IrcError;
use crate::handle::{IrcHandle, Outbound, SharedHandle};
use crate::line::Line;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// Outbound queue depth between the routers and the writer task.
const OUTBOUND_BUFFER: usize = 64;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub nick: String,
    /// The single channel the bot joins and bridges.
    pub channel: String,
    /// Optional greeting sent right after registration (e.g. services
    /// authentication), delivered to `login_target`.
    pub login_message: Option<String>,
    pub login_target: String,
    /// Verify the server certificate against the webpki roots. Disable
    /// for networks running self-signed certificates.
    pub verify_tls: bool,
}

/// An incoming message the gateway cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// A line posted to the bridged channel.
    Channel { nick: String, text: String },
    /// A direct message to the bot.
    Private { nick: String, text: String },
}

/// An established (but not yet registered) TLS connection.
pub struct IrcConnection {
    stream: TlsStream<TcpStream>,
}

/// IRC client session. `connect` and `run` are separate so the caller
/// can treat an initial connection failure as fatal while retrying
/// `connect` + `run` forever once the first link was up.
pub struct IrcSession {
    config: SessionConfig,
    handle_slot: SharedHandle,
}

impl IrcSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            handle_slot: Arc::new(tokio::sync::RwLock::new(None)),
        }
    }

    /// The slot where the live outbound handle is published.
    pub fn handle_slot(&self) -> SharedHandle {
        self.handle_slot.clone()
    }

    /// Open the TCP + TLS connection.
    pub async fn connect(&self) -> Result<IrcConnection, IrcError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Connecting to {addr} as {}", self.config.nick);
        let tcp = TcpStream::connect(&addr).await?;

        let tls_config = if self.config.verify_tls {
            let roots: rustls::RootCertStore =
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth()
        } else {
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
                .with_no_client_auth()
        };

        let connector = TlsConnector::from(Arc::new(tls_config));
        let domain = rustls::pki_types::ServerName::try_from(self.config.host.clone())?;
        let stream = connector.connect(domain, tcp).await?;

        Ok(IrcConnection { stream })
    }

    /// Drive one connection until the link drops. Publishes the outbound
    /// handle on registration and clears it on exit, whatever the cause.
    pub async fn run(
        &self,
        conn: IrcConnection,
        events: &mpsc::Sender<IrcEvent>,
    ) -> Result<(), IrcError> {
        let (reader, writer) = tokio::io::split(conn.stream);
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let writer_task = tokio::spawn(write_loop(writer, rx));
        let handle = IrcHandle::new(tx);

        let result = self.read_loop(reader, &handle, events).await;

        *self.handle_slot.write().await = None;
        writer_task.abort();
        result
    }

    async fn read_loop(
        &self,
        reader: ReadHalf<TlsStream<TcpStream>>,
        handle: &IrcHandle,
        events: &mpsc::Sender<IrcEvent>,
    ) -> Result<(), IrcError> {
        let mut current_nick = self.config.nick.clone();
        handle.raw(format!("NICK {current_nick}")).await?;
        handle
            .raw(format!("USER {} 0 * :IRC to SMS gateway", self.config.nick))
            .await?;

        let mut reader = BufReader::new(reader);
        let mut buf = String::new();
        let mut registered = false;

        loop {
            buf.clear();
            match reader.read_line(&mut buf).await {
                Ok(0) => return Err(IrcError::ConnectionClosed),
                Ok(_) => {}
                Err(e) => return Err(e.into()),
            }

            let Some(line) = Line::parse(&buf) else {
                continue;
            };

            match line.command.as_str() {
                "PING" => {
                    handle.raw(format!("PONG :{}", line.param(0))).await?;
                }

                // RPL_WELCOME: registration complete
                "001" => {
                    registered = true;
                    info!("Registered with {} as {current_nick}", self.config.host);
                    if let Some(ref greeting) = self.config.login_message {
                        handle.privmsg(&self.config.login_target, greeting).await?;
                    }
                    handle.raw(format!("JOIN {}", self.config.channel)).await?;
                    *self.handle_slot.write().await = Some(handle.clone());
                }

                // ERR_NICKNAMEINUSE
                "433" => {
                    current_nick.push('_');
                    warn!("Nick in use, trying {current_nick}");
                    handle.raw(format!("NICK {current_nick}")).await?;
                }

                // Kicked from our channel: rejoin unconditionally.
                "KICK" => {
                    if line.param(0).eq_ignore_ascii_case(&self.config.channel)
                        && line.param(1) == current_nick
                    {
                        warn!("Kicked from {}, rejoining", self.config.channel);
                        handle.raw(format!("JOIN {}", self.config.channel)).await?;
                    }
                }

                "PRIVMSG" => {
                    if !registered {
                        continue;
                    }
                    let Some(nick) = line.source_nick() else {
                        continue;
                    };
                    let target = line.param(0);
                    let text = line.param(1);

                    let event = if target.eq_ignore_ascii_case(&self.config.channel) {
                        IrcEvent::Channel {
                            nick: nick.to_string(),
                            text: text.to_string(),
                        }
                    } else if target == current_nick {
                        IrcEvent::Private {
                            nick: nick.to_string(),
                            text: text.to_string(),
                        }
                    } else {
                        continue;
                    };

                    if events.send(event).await.is_err() {
                        // Receiver gone: the gateway is shutting down.
                        return Ok(());
                    }
                }

                _ => {}
            }
        }
    }
}

/// Writer task: serializes outbound commands onto the socket. Ends when
/// the channel closes or a write fails; the reader notices the broken
/// link on its side.
async fn write_loop(
    mut writer: WriteHalf<TlsStream<TcpStream>>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        let line = match outbound {
            Outbound::Privmsg { target, text } => format!("PRIVMSG {target} :{text}"),
            Outbound::Notice { target, text } => format!("NOTICE {target} :{text}"),
            Outbound::Raw(line) => line,
        };
        debug!(">> {line}");
        if writer.write_all(format!("{line}\r\n").as_bytes()).await.is_err() {
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}

/// Certificate verifier that accepts anything, for `verify_tls = false`.
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
