//! Neural Uplink
//!
//! The conversational channel to the live node: wire events, the
//! transport seam, and the activation-scoped session that owns the
//! message log.

mod messages;
mod session;
mod transport;

pub use messages::{ChatMessage, ClientEvent, Role, SendMode, ServerEvent};
pub use session::{UplinkError, UplinkSession, UplinkStatus};
pub use transport::{ChannelPair, ChannelTransport, TransportError, WsTransport};

#[cfg(test)]
pub(crate) use transport::testing;
