//! # AION Link
//!
//! Client core for the AION organism. The presentation shell (landing
//! page, dashboard HUD, terminal overlay) is an external consumer; this
//! crate owns the protocol and the state behind it:
//!
//! - **Autonomous discovery**: two-hop genesis lookup resolving the live node
//! - **Bio-telemetry**: fixed-cadence status polling with degrade-don't-fail snapshots
//! - **Neural uplink**: one persistent channel per session with an ordered message log
//! - **Mood engine**: the single per-process consciousness state machine
//! - **Operator identity**: persistent profile behind an opaque key-value store
//!
//! ## Modules
//!
//! - [`discovery`]: Manifest -> directory record -> resolved endpoint
//! - [`telemetry`]: Snapshot wire types and the polling monitor
//! - [`uplink`]: Channel transport, wire events, and the session
//! - [`mood`]: The mood state machine and its organic math
//! - [`identity`]: The operator profile and its store collaborator
//! - [`context`]: The composition root the shell builds once
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aion_link::{AppContext, Config, SendMode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_default();
//!     aion_link::init_tracing(&config.logging);
//!
//!     let ctx = AppContext::new(config);
//!
//!     // Dashboard activation: live feed until the handle drops.
//!     let dashboard = ctx.open_dashboard();
//!     let mut feed = dashboard.feed();
//!     if feed.changed().await.is_ok() {
//!         println!("{}", feed.borrow().status);
//!     }
//!
//!     // Terminal activation: ordered log plus fire-and-forget sends.
//!     let (session, mut messages) = ctx.open_terminal().await;
//!     session.send("status report", SendMode::Fast).await.ok();
//!     while let Some(message) = messages.recv().await {
//!         println!("[{}] {}", message.role, message.text);
//!     }
//! }
//! ```

pub mod config;
pub mod context;
pub mod discovery;
pub mod gateway;
pub mod identity;
pub mod mood;
pub mod telemetry;
pub mod uplink;

// Re-export top-level types for convenience
pub use config::{Config, ConfigError, DiscoveryConfig, LoggingConfig, TelemetryConfig};

pub use context::AppContext;

pub use discovery::{DiscoveryError, Manifest, ResolvedEndpoint};

pub use gateway::{Gateway, GatewayError, HttpGateway};

pub use identity::{IdentityError, IdentityVault, KeyValueStore, UserIdentity};

pub use mood::{MoodEngine, MoodReading, MoodState};

pub use telemetry::{LinkStatus, TelemetryFeed, TelemetryHandle, TelemetryMonitor, TelemetrySnapshot};

pub use uplink::{
    ChannelTransport, ChatMessage, Role, SendMode, UplinkError, UplinkSession, UplinkStatus,
    WsTransport,
};

/// Initialize the tracing subscriber from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Call once, from
/// the hosting application.
pub fn init_tracing(config: &config::LoggingConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("aion_link={}", config.level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
