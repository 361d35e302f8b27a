//! Application Context
//!
//! The composition root. The hosting shell builds one context at startup;
//! it owns the shared HTTP gateway, the channel transport, the identity
//! vault, and the single mood engine, and hands out activation-scoped
//! handles for the dashboard and the terminal. Activations are independent:
//! each re-resolves the live node and owns its own teardown.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::gateway::{Gateway, HttpGateway};
use crate::identity::{FileStore, IdentityVault, KeyValueStore};
use crate::mood::MoodEngine;
use crate::telemetry::{TelemetryHandle, TelemetryMonitor};
use crate::uplink::{ChannelTransport, ChatMessage, UplinkSession, WsTransport};

/// Long-lived application services, built once per process.
pub struct AppContext {
    config: Config,
    gateway: Arc<dyn Gateway>,
    transport: Arc<dyn ChannelTransport>,
    vault: Arc<IdentityVault>,
    mood: Arc<MoodEngine>,
}

impl AppContext {
    /// Build the production context and ignite the mood engine.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Self {
        let gateway: Arc<dyn Gateway> =
            Arc::new(HttpGateway::new(config.discovery.request_timeout_ms));
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::new(config.identity.data_dir.clone()));
        Self::with_collaborators(config, gateway, Arc::new(WsTransport), store)
    }

    /// Build a context over explicit collaborators (tests, embedders).
    pub fn with_collaborators(
        config: Config,
        gateway: Arc<dyn Gateway>,
        transport: Arc<dyn ChannelTransport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let vault = Arc::new(IdentityVault::new(store));
        let mood = Arc::new(MoodEngine::new());
        mood.ignite();

        Self {
            config,
            gateway,
            transport,
            vault,
            mood,
        }
    }

    /// Open one dashboard activation: resolve the node and start polling.
    pub fn open_dashboard(&self) -> TelemetryHandle {
        TelemetryMonitor::new(
            Arc::clone(&self.gateway),
            self.config.discovery.clone(),
            self.config.telemetry.clone(),
        )
        .start()
    }

    /// Open one terminal activation: resolve the node and connect the
    /// uplink channel.
    pub async fn open_terminal(&self) -> (UplinkSession, mpsc::UnboundedReceiver<ChatMessage>) {
        UplinkSession::open(
            Arc::clone(&self.gateway),
            Arc::clone(&self.transport),
            self.config.discovery.clone(),
            Arc::clone(&self.vault),
        )
        .await
    }

    /// The one mood engine for this process.
    pub fn mood(&self) -> &MoodEngine {
        &self.mood
    }

    /// The identity vault shared by all sessions.
    pub fn identity(&self) -> &IdentityVault {
        &self.vault
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use crate::identity::MemoryStore;
    use crate::mood::MoodState;
    use crate::telemetry::LinkStatus;
    use crate::uplink::testing::FakeChannel;
    use crate::uplink::UplinkStatus;

    const MANIFEST_URL: &str = "https://genesis.test/aion_genesis.json";
    const DIRECTORY_URL: &str = "https://beacon.test/active.json";
    const NODE_URL: &str = "https://node-7.aion.test";

    fn test_config() -> Config {
        let mut config = Config::default();
        config.discovery.manifest_url = MANIFEST_URL.to_string();
        config
    }

    fn scripted_gateway() -> Arc<ScriptedGateway> {
        let gateway = ScriptedGateway::new();
        gateway.script_ok(
            MANIFEST_URL,
            &format!(r#"{{"beacon_database_url": "{}"}}"#, DIRECTORY_URL),
        );
        gateway.script_ok(DIRECTORY_URL, &format!(r#"{{"url": "{}"}}"#, NODE_URL));
        gateway.script_ok(
            "https://node-7.aion.test/api/status",
            r#"{"heart": {"bpm": 70.0}}"#,
        );
        Arc::new(gateway)
    }

    #[tokio::test(start_paused = true)]
    async fn context_ignites_the_one_mood_engine() {
        let channel = FakeChannel::new();
        let ctx = AppContext::with_collaborators(
            test_config(),
            scripted_gateway(),
            channel.transport(),
            Arc::new(MemoryStore::new()),
        );

        assert_eq!(ctx.mood().state(), MoodState::Awakening);
        tokio::time::sleep(crate::mood::AWAKEN_DELAY + std::time::Duration::from_millis(10)).await;
        assert_eq!(ctx.mood().state(), MoodState::Observing);
    }

    #[tokio::test(start_paused = true)]
    async fn dashboard_and_terminal_share_the_context_collaborators() {
        let channel = FakeChannel::new();
        let ctx = AppContext::with_collaborators(
            test_config(),
            scripted_gateway(),
            channel.transport(),
            Arc::new(MemoryStore::new()),
        );

        let dashboard = ctx.open_dashboard();
        let (session, _delivered) = ctx.open_terminal().await;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(dashboard.latest().status, LinkStatus::Linked);
        assert_eq!(session.current_status(), UplinkStatus::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn identity_saved_in_one_session_is_visible_to_the_next() {
        let channel = FakeChannel::new();
        let ctx = AppContext::with_collaborators(
            test_config(),
            scripted_gateway(),
            channel.transport(),
            Arc::new(MemoryStore::new()),
        );

        ctx.identity()
            .save(&crate::identity::UserIdentity {
                name: "Operator Nine".to_string(),
                avatar: String::new(),
            })
            .unwrap();

        let (session, _delivered) = ctx.open_terminal().await;
        assert_eq!(session.operator().await.name, "Operator Nine");
    }
}
