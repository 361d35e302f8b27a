//! Autonomous Discovery
//!
//! Resolves the live AION node through the two-hop genesis lookup: the
//! fixed-location manifest names the directory service, and the directory
//! record names the currently active node. Both documents are fetched fresh
//! on every resolution; nothing is cached across activations and nothing is
//! retried. Consumers collapse every failure to a single OFFLINE status,
//! so only the logs distinguish which hop broke.

use serde::Deserialize;
use thiserror::Error;

use crate::gateway::{Gateway, GatewayError};

/// Top-level manifest fetched from the fixed genesis location.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// URL of the directory service naming the active node
    pub beacon_database_url: String,
}

/// Directory record naming the currently active node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryRecord {
    #[serde(default)]
    pub url: Option<String>,
}

/// Base URL of the live node, derived via the two-hop lookup.
///
/// Created at the start of an activation and discarded with it; both the
/// telemetry monitor and the uplink session derive their targets from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    base_url: String,
}

impl ResolvedEndpoint {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The node's base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The node's status endpoint, polled by the telemetry monitor.
    pub fn status_url(&self) -> String {
        format!("{}/api/status", self.base_url)
    }

    /// The node's channel URL for the uplink websocket.
    pub fn channel_url(&self) -> String {
        self.base_url
            .replace("http://", "ws://")
            .replace("https://", "wss://")
    }
}

/// Fetch and parse the genesis manifest (first hop).
pub async fn fetch_manifest(
    gateway: &dyn Gateway,
    manifest_url: &str,
) -> Result<Manifest, DiscoveryError> {
    let body = gateway
        .get_text(manifest_url)
        .await
        .map_err(DiscoveryError::ManifestUnreachable)?;

    serde_json::from_str(&body).map_err(DiscoveryError::ManifestMalformed)
}

/// Fetch the directory record named by the manifest and validate it names
/// a usable node (second hop).
pub async fn locate_node(
    gateway: &dyn Gateway,
    manifest: &Manifest,
) -> Result<ResolvedEndpoint, DiscoveryError> {
    let body = gateway
        .get_text(&manifest.beacon_database_url)
        .await
        .map_err(DiscoveryError::DirectoryUnreachable)?;

    let record: DirectoryRecord =
        serde_json::from_str(&body).map_err(DiscoveryError::DirectoryMalformed)?;

    let url = record
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(DiscoveryError::NodeUnreachable)?;

    tracing::debug!(node = %url, "active node located");
    Ok(ResolvedEndpoint::new(&url))
}

/// Run the full two-hop resolution.
///
/// A failing hop stops the chain; no further network calls are made.
pub async fn resolve(
    gateway: &dyn Gateway,
    manifest_url: &str,
) -> Result<ResolvedEndpoint, DiscoveryError> {
    let manifest = fetch_manifest(gateway, manifest_url).await?;
    locate_node(gateway, &manifest).await
}

/// Errors that can occur during discovery, tagged per hop
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("manifest fetch failed: {0}")]
    ManifestUnreachable(#[source] GatewayError),

    #[error("manifest malformed: {0}")]
    ManifestMalformed(#[source] serde_json::Error),

    #[error("directory fetch failed: {0}")]
    DirectoryUnreachable(#[source] GatewayError),

    #[error("directory record malformed: {0}")]
    DirectoryMalformed(#[source] serde_json::Error),

    #[error("directory record names no active node")]
    NodeUnreachable,
}
