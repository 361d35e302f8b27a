//! Uplink Session
//!
//! One activation of the conversational neural uplink: runs discovery,
//! opens one channel to the live node, and maintains the append-only
//! message log. Sends are optimistic local echoes followed by one
//! fire-and-forget event; inbound responses are appended in arrival order
//! with no correlation to prior sends.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;

use super::messages::{ChatMessage, ClientEvent, Role, SendMode, ServerEvent};
use super::transport::{ChannelPair, ChannelTransport};
use crate::config::DiscoveryConfig;
use crate::discovery;
use crate::gateway::Gateway;
use crate::identity::{IdentityError, IdentityVault, UserIdentity};

const GREETING: &str =
    "Greetings. I am AION. The continuous stream is active. Ready to sync with you.";

/// Connectivity of an uplink activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UplinkStatus {
    Initializing,
    FetchingManifest,
    LocatingNode,
    Online,
    Offline,
}

impl fmt::Display for UplinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UplinkStatus::Initializing => "INITIALIZING...",
            UplinkStatus::FetchingManifest => "FETCHING GENESIS...",
            UplinkStatus::LocatingNode => "LOCATING NODE...",
            UplinkStatus::Online => "ONLINE",
            UplinkStatus::Offline => "OFFLINE",
        };
        f.write_str(label)
    }
}

/// Appends to the shared log and mirrors every entry to the consumer.
#[derive(Clone)]
struct LogWriter {
    log: Arc<RwLock<Vec<ChatMessage>>>,
    delivery: mpsc::UnboundedSender<ChatMessage>,
}

impl LogWriter {
    async fn append(&self, message: ChatMessage) {
        self.log.write().await.push(message.clone());
        // The consumer may have gone away; the log remains authoritative
        let _ = self.delivery.send(message);
    }
}

/// One conversational activation. The message log lives and dies with it.
pub struct UplinkSession {
    writer: LogWriter,
    status_tx: watch::Sender<UplinkStatus>,
    status_rx: watch::Receiver<UplinkStatus>,
    outbound: Option<mpsc::UnboundedSender<ClientEvent>>,
    operator: Arc<RwLock<UserIdentity>>,
    vault: Arc<IdentityVault>,
    pump: Option<JoinHandle<()>>,
}

impl UplinkSession {
    /// Open a session.
    ///
    /// Never fails: resolution or connection failure leaves the session in
    /// a terminal offline state with one system log line, exactly as a
    /// consumer would render it. The returned receiver observes every
    /// appended message in insertion order.
    pub async fn open(
        gateway: Arc<dyn Gateway>,
        transport: Arc<dyn ChannelTransport>,
        config: DiscoveryConfig,
        vault: Arc<IdentityVault>,
    ) -> (UplinkSession, mpsc::UnboundedReceiver<ChatMessage>) {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(UplinkStatus::Initializing);

        let writer = LogWriter {
            log: Arc::new(RwLock::new(Vec::new())),
            delivery: delivery_tx,
        };

        // Profile is read once per activation
        let operator = Arc::new(RwLock::new(vault.load()));

        let mut session = UplinkSession {
            writer: writer.clone(),
            status_tx,
            status_rx,
            outbound: None,
            operator,
            vault,
            pump: None,
        };

        session
            .writer
            .append(ChatMessage::new(Role::System, "INITIALIZING NEURAL LINK..."))
            .await;
        session
            .writer
            .append(ChatMessage::new(Role::System, "LOADING EPISODIC MEMORY..."))
            .await;
        session
            .writer
            .append(ChatMessage::new(Role::Assistant, GREETING))
            .await;

        let _ = session.status_tx.send(UplinkStatus::FetchingManifest);
        let located = match discovery::fetch_manifest(&*gateway, &config.manifest_url).await {
            Ok(manifest) => {
                let _ = session.status_tx.send(UplinkStatus::LocatingNode);
                discovery::locate_node(&*gateway, &manifest).await
            }
            Err(e) => Err(e),
        };

        let endpoint = match located {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!(error = %e, "uplink discovery failed");
                session.mark_unreachable().await;
                return (session, delivery_rx);
            }
        };

        let pair = match transport.connect(&endpoint.channel_url()).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "uplink channel refused");
                session.mark_unreachable().await;
                return (session, delivery_rx);
            }
        };

        let _ = session.status_tx.send(UplinkStatus::Online);
        session
            .writer
            .append(ChatMessage::new(
                Role::System,
                format!(":: UPLINK ESTABLISHED TO {} ::", endpoint.base_url()),
            ))
            .await;

        let ChannelPair {
            outbound,
            mut inbound,
        } = pair;
        session.outbound = Some(outbound);

        session.pump = Some(tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                match event {
                    ServerEvent::Response { text, image } => {
                        writer
                            .append(ChatMessage::with_image(Role::Assistant, text, image))
                            .await;
                    }
                }
            }
        }));

        (session, delivery_rx)
    }

    async fn mark_unreachable(&self) {
        let _ = self.status_tx.send(UplinkStatus::Offline);
        self.writer
            .append(ChatMessage::new(
                Role::System,
                ":: CONNECTION FAILED: AION IS UNREACHABLE ::",
            ))
            .await;
    }

    /// Send operator input.
    ///
    /// Whitespace-only input and sends without an open channel are rejected
    /// before any local or network effect: the log is untouched and nothing
    /// goes out. Otherwise the user message is echoed locally first, then
    /// one event is emitted with the current display name and mode.
    pub async fn send(&self, text: &str, mode: SendMode) -> Result<(), UplinkError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(UplinkError::EmptyMessage);
        }

        let outbound = self
            .outbound
            .as_ref()
            .filter(|tx| !tx.is_closed())
            .ok_or(UplinkError::ChannelClosed)?;

        // Optimistic local echo; the protocol has no delivery confirmation
        self.writer
            .append(ChatMessage::new(Role::User, trimmed))
            .await;

        let user = self.operator.read().await.name.clone();
        let event = ClientEvent::Input {
            text: trimmed.to_string(),
            user,
            mode,
        };
        if outbound.send(event).is_err() {
            tracing::debug!("uplink channel gone, input dropped");
        }

        Ok(())
    }

    /// Close the session: terminate the channel and stop inbound delivery.
    pub async fn close(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        // Dropping the sender lets the transport shut the connection
        self.outbound = None;
        let _ = self.status_tx.send(UplinkStatus::Offline);
        tracing::debug!("uplink session closed");
    }

    /// Save a new operator profile and switch subsequent sends to it.
    ///
    /// Appends the profile-update system line on success.
    pub async fn update_profile(&self, name: &str, avatar: &str) -> Result<(), IdentityError> {
        let identity = UserIdentity {
            name: name.to_string(),
            avatar: avatar.to_string(),
        };
        self.vault.save(&identity)?;
        *self.operator.write().await = identity;

        self.writer
            .append(ChatMessage::new(
                Role::System,
                format!(":: USER PROFILE UPDATED: {} ::", name.to_uppercase()),
            ))
            .await;
        Ok(())
    }

    /// Snapshot of the message log in insertion order.
    pub async fn log(&self) -> Vec<ChatMessage> {
        self.writer.log.read().await.clone()
    }

    /// The operator profile this session sends as.
    pub async fn operator(&self) -> UserIdentity {
        self.operator.read().await.clone()
    }

    /// A receiver over the session status.
    pub fn status(&self) -> watch::Receiver<UplinkStatus> {
        self.status_rx.clone()
    }

    /// The current session status.
    pub fn current_status(&self) -> UplinkStatus {
        *self.status_rx.borrow()
    }

    /// Whether a channel is open for sending.
    pub fn is_open(&self) -> bool {
        self.outbound
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }
}

impl Drop for UplinkSession {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Errors a send can be rejected with
#[derive(Debug, Error)]
pub enum UplinkError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("no uplink channel is open")]
    ChannelClosed,
}
