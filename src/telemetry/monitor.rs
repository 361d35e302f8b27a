//! Telemetry Monitor
//!
//! One activation of the bio-telemetry dashboard: resolve the live node,
//! then poll its status endpoint on a fixed cadence until the handle is
//! dropped. Resolution failure is terminal (OFFLINE, no polling); a failed
//! poll only degrades the link and keeps the last good snapshot on display.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use super::types::{LinkStatus, TelemetryFeed, TelemetrySnapshot};
use crate::config::{DiscoveryConfig, TelemetryConfig};
use crate::discovery::{self, ResolvedEndpoint};
use crate::gateway::{Gateway, GatewayError};

/// Factory for telemetry activations.
pub struct TelemetryMonitor {
    gateway: Arc<dyn Gateway>,
    discovery: DiscoveryConfig,
    telemetry: TelemetryConfig,
}

impl TelemetryMonitor {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        discovery: DiscoveryConfig,
        telemetry: TelemetryConfig,
    ) -> Self {
        Self {
            gateway,
            discovery,
            telemetry,
        }
    }

    /// Start one activation.
    ///
    /// Discovery runs fresh for this activation and publishes its progress
    /// on the feed. On success one status fetch fires immediately, then the
    /// fixed cadence takes over. Dropping the returned handle (or calling
    /// [`TelemetryHandle::stop`]) tears the whole activation down; no timer
    /// survives it.
    pub fn start(&self) -> TelemetryHandle {
        let (tx, rx) = watch::channel(TelemetryFeed::default());

        let gateway = Arc::clone(&self.gateway);
        let discovery = self.discovery.clone();
        let poll_interval = Duration::from_millis(self.telemetry.poll_interval_ms);

        let task = tokio::spawn(async move {
            run_activation(gateway, discovery, poll_interval, tx).await;
        });

        TelemetryHandle { feed: rx, task }
    }
}

/// Owner of one running activation. Dropping it stops the polling.
pub struct TelemetryHandle {
    feed: watch::Receiver<TelemetryFeed>,
    task: JoinHandle<()>,
}

impl TelemetryHandle {
    /// A receiver over the live feed; clones observe the same activation.
    pub fn feed(&self) -> watch::Receiver<TelemetryFeed> {
        self.feed.clone()
    }

    /// The most recent feed value.
    pub fn latest(&self) -> TelemetryFeed {
        self.feed.borrow().clone()
    }

    /// Tear the activation down.
    pub fn stop(self) {
        // Drop does the work
    }
}

impl Drop for TelemetryHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_activation(
    gateway: Arc<dyn Gateway>,
    discovery: DiscoveryConfig,
    poll_interval: Duration,
    tx: watch::Sender<TelemetryFeed>,
) {
    let endpoint = match resolve_with_progress(&*gateway, &discovery, &tx).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::warn!(error = %e, "autonomous discovery failed");
            let _ = tx.send(TelemetryFeed {
                status: LinkStatus::Offline,
                snapshot: None,
            });
            return;
        }
    };

    let status_url = endpoint.status_url();
    tracing::info!(url = %status_url, "telemetry link established");

    // The first tick completes immediately, so the link gets one status
    // fetch right away before the cadence takes over.
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;

        match poll_once(&*gateway, &status_url).await {
            Ok(snapshot) => {
                tx.send_modify(|feed| {
                    feed.status = LinkStatus::Linked;
                    feed.snapshot = Some(snapshot);
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "status poll failed");
                tx.send_modify(|feed| {
                    feed.status = LinkStatus::SignalLost;
                });
            }
        }
    }
}

async fn resolve_with_progress(
    gateway: &dyn Gateway,
    config: &DiscoveryConfig,
    tx: &watch::Sender<TelemetryFeed>,
) -> Result<ResolvedEndpoint, discovery::DiscoveryError> {
    tx.send_modify(|feed| feed.status = LinkStatus::FetchingManifest);
    let manifest = discovery::fetch_manifest(gateway, &config.manifest_url).await?;

    tx.send_modify(|feed| feed.status = LinkStatus::LocatingNode);
    discovery::locate_node(gateway, &manifest).await
}

async fn poll_once(gateway: &dyn Gateway, url: &str) -> Result<TelemetrySnapshot, PollError> {
    let body = gateway.get_text(url).await?;
    Ok(serde_json::from_str(&body)?)
}

/// One failed poll tick; recovered on the next tick
#[derive(Debug, Error)]
enum PollError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] GatewayError),

    #[error("snapshot malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;

    const MANIFEST_URL: &str = "https://genesis.test/aion_genesis.json";
    const DIRECTORY_URL: &str = "https://beacon.test/active.json";
    const NODE_URL: &str = "https://node-7.aion.test";
    const STATUS_URL: &str = "https://node-7.aion.test/api/status";

    fn configs() -> (DiscoveryConfig, TelemetryConfig) {
        (
            DiscoveryConfig {
                manifest_url: MANIFEST_URL.to_string(),
                request_timeout_ms: 5000,
            },
            TelemetryConfig {
                poll_interval_ms: 1000,
            },
        )
    }

    fn script_discovery(gateway: &ScriptedGateway) {
        gateway.script_ok(
            MANIFEST_URL,
            &format!(r#"{{"beacon_database_url": "{}"}}"#, DIRECTORY_URL),
        );
        gateway.script_ok(DIRECTORY_URL, &format!(r#"{{"url": "{}"}}"#, NODE_URL));
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_discovery_is_terminal_offline_with_no_polling() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.script_err(MANIFEST_URL);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        assert_eq!(handle.latest().status, LinkStatus::Offline);
        assert!(handle.latest().snapshot.is_none());

        // No poll ever fires, even well past the cadence
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(gateway.call_count(STATUS_URL), 0);
        assert_eq!(gateway.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_immediate_poll_then_fixed_cadence() {
        let gateway = Arc::new(ScriptedGateway::new());
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        assert_eq!(gateway.call_count(STATUS_URL), 1);
        assert_eq!(handle.latest().status, LinkStatus::Linked);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(gateway.call_count(STATUS_URL), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(gateway.call_count(STATUS_URL), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_the_cadence() {
        let gateway = Arc::new(ScriptedGateway::new());
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let polls_before_drop = gateway.call_count(STATUS_URL);
        assert!(polls_before_drop >= 3);

        handle.stop();
        settle().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(gateway.call_count(STATUS_URL), polls_before_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_degrades_but_keeps_last_snapshot() {
        let gateway = Arc::new(ScriptedGateway::new());
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);
        gateway.script_err(STATUS_URL);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        let feed = handle.latest();
        assert_eq!(feed.status, LinkStatus::Linked);
        assert_eq!(feed.snapshot.as_ref().map(|s| s.bpm()), Some(72));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let feed = handle.latest();
        // Degraded, not "never connected" -- and the old reading survives
        assert_eq!(feed.status, LinkStatus::SignalLost);
        assert_eq!(feed.snapshot.as_ref().map(|s| s.bpm()), Some(72));
    }

    #[tokio::test(start_paused = true)]
    async fn recovered_poll_relinks() {
        let gateway = Arc::new(ScriptedGateway::new());
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);
        gateway.script_err(STATUS_URL);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 75.0}}"#);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.latest().status, LinkStatus::SignalLost);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let feed = handle.latest();
        assert_eq!(feed.status, LinkStatus::Linked);
        assert_eq!(feed.snapshot.as_ref().map(|s| s.bpm()), Some(75));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_snapshot_counts_as_a_degraded_tick() {
        let gateway = Arc::new(ScriptedGateway::new());
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);
        gateway.script_ok(STATUS_URL, "garbage");

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry);
        let handle = monitor.start();

        settle().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let feed = handle.latest();
        assert_eq!(feed.status, LinkStatus::SignalLost);
        assert_eq!(feed.snapshot.as_ref().map(|s| s.bpm()), Some(72));
    }

    #[tokio::test(start_paused = true)]
    async fn independent_activations_do_not_share_teardown() {
        let gateway = Arc::new(ScriptedGateway::new());
        // Both activations re-resolve; the sticky last replies serve both
        script_discovery(&gateway);
        gateway.script_ok(STATUS_URL, r#"{"heart": {"bpm": 72.0}}"#);

        let (discovery, telemetry) = configs();
        let monitor = TelemetryMonitor::new(gateway.clone(), discovery, telemetry.clone());
        let first = monitor.start();
        let second = monitor.start();

        settle().await;
        assert_eq!(first.latest().status, LinkStatus::Linked);
        assert_eq!(second.latest().status, LinkStatus::Linked);

        first.stop();
        settle().await;
        let polls_after_stop = gateway.call_count(STATUS_URL);

        tokio::time::sleep(Duration::from_secs(2)).await;
        // The surviving activation keeps polling
        assert!(gateway.call_count(STATUS_URL) > polls_after_stop);
        assert_eq!(second.latest().status, LinkStatus::Linked);
    }
}
