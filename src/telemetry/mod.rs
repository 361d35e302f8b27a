//! Bio-Telemetry
//!
//! The live dashboard feed: wire types for the node's status endpoint and
//! the activation-scoped monitor that polls it.

mod monitor;
mod types;

pub use monitor::{TelemetryHandle, TelemetryMonitor};
pub use types::{
    CognitionGroup, HeartGroup, LinkStatus, SystemGroup, TelemetryFeed, TelemetrySnapshot,
    VitalityGroup,
};
