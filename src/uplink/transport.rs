//! Uplink Transport
//!
//! The bidirectional channel seam plus the production websocket
//! implementation. A connected channel is a pair of unbounded queues:
//! fire-and-forget outbound events and arrival-ordered inbound events.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::messages::{ClientEvent, ServerEvent};

/// A connected bidirectional channel.
///
/// Dropping the inbound receiver or the outbound sender tears the
/// underlying connection down.
pub struct ChannelPair {
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub inbound: mpsc::UnboundedReceiver<ServerEvent>,
}

/// Opens persistent channels to a resolved node.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Open one channel. Failure is terminal for the activation; the
    /// session never retries.
    async fn connect(&self, url: &str) -> Result<ChannelPair, TransportError>;
}

/// Errors that can occur opening or driving a channel
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel connect failed: {0}")]
    Connect(String),
}

/// Production transport: a websocket to the resolved node.
pub struct WsTransport;

#[async_trait]
impl ChannelTransport for WsTransport {
    async fn connect(&self, url: &str) -> Result<ChannelPair, TransportError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::info!(url = %url, "uplink channel connected");

        let (mut sink, mut stream) = socket.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerEvent>();

        // Forward outbound events onto the socket. Ends when the session
        // drops its sender, which also closes the socket.
        let mut send_task = tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            tracing::debug!("uplink send failed, closing channel");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize event");
                    }
                }
            }
            let _ = sink.close().await;
        });

        // Pump inbound frames toward the session; unrecognized frames are
        // skipped without killing the channel.
        let mut recv_task = tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                let frame = match result {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(error = %e, "uplink receive error");
                        break;
                    }
                };

                match frame {
                    Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, text = %text, "unrecognized uplink event");
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        });

        // Neither half outlives the other.
        tokio::spawn(async move {
            tokio::select! {
                _ = &mut send_task => recv_task.abort(),
                _ = &mut recv_task => send_task.abort(),
            }
        });

        Ok(ChannelPair {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
