//! Telemetry Types
//!
//! Verbatim wire mapping of the node's status endpoint, plus the link
//! status the HUD renders. Every field is optional on the wire; absent
//! values degrade to documented defaults instead of failing the snapshot.

use serde::Deserialize;
use std::fmt;

/// One point-in-time reading of the node's status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub heart: HeartGroup,
    #[serde(default)]
    pub vitality: VitalityGroup,
    #[serde(default)]
    pub cognition: CognitionGroup,
    #[serde(default)]
    pub system: SystemGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HeartGroup {
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub integrity: Option<f64>,
    #[serde(default)]
    pub entropy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VitalityGroup {
    #[serde(default)]
    pub level: Option<f64>,
    #[serde(default)]
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CognitionGroup {
    #[serde(default)]
    pub load: Option<f64>,
    #[serde(default)]
    pub threads: Option<u64>,
    #[serde(default)]
    pub attention: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SystemGroup {
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl TelemetrySnapshot {
    /// Heart rate, rounded; 0 when the node omitted it.
    pub fn bpm(&self) -> u32 {
        self.heart.bpm.unwrap_or(0.0).round().max(0.0) as u32
    }

    /// Integrity as display text, one decimal; `"---"` when absent.
    pub fn integrity_text(&self) -> String {
        match self.heart.integrity {
            Some(v) => format!("{:.1}", v),
            None => "---".to_string(),
        }
    }

    /// Entropy as display text, three decimals; `"0.000"` when absent.
    pub fn entropy_text(&self) -> String {
        format!("{:.3}", self.heart.entropy.unwrap_or(0.0))
    }

    /// Cognitive load percentage, rounded; 0 when absent.
    pub fn load(&self) -> u32 {
        self.cognition.load.unwrap_or(0.0).round().max(0.0) as u32
    }

    /// Energy level percentage, rounded; 0 when absent.
    pub fn energy(&self) -> u32 {
        self.vitality.level.unwrap_or(0.0).round().max(0.0) as u32
    }

    /// Active neural threads; 0 when absent.
    pub fn threads(&self) -> u64 {
        self.cognition.threads.unwrap_or(0)
    }

    /// Node identifier, when reported.
    pub fn node(&self) -> Option<&str> {
        self.system.node.as_deref()
    }

    /// Operating mode; the node defaults to autonomous operation.
    pub fn mode_text(&self) -> &str {
        self.system.mode.as_deref().unwrap_or("AUTONOMOUS")
    }
}

/// Coarse connectivity of a telemetry activation.
///
/// `SignalLost` is only reachable after a successful resolution: it means
/// the link degraded, not that it never existed. `Offline` is terminal for
/// the activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Initializing,
    FetchingManifest,
    LocatingNode,
    Linked,
    SignalLost,
    Offline,
}

impl LinkStatus {
    /// Whether the link is currently delivering snapshots.
    pub fn is_live(&self) -> bool {
        matches!(self, LinkStatus::Linked)
    }

    /// Whether the activation is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkStatus::Offline)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkStatus::Initializing => "INITIALIZING LINK...",
            LinkStatus::FetchingManifest => "FETCHING GENESIS...",
            LinkStatus::LocatingNode => "LOCATING ACTIVE NODE...",
            LinkStatus::Linked => "LINKED",
            LinkStatus::SignalLost => "SIGNAL LOST",
            LinkStatus::Offline => "OFFLINE",
        };
        f.write_str(label)
    }
}

/// What a telemetry subscriber observes: the connectivity status plus the
/// last good snapshot, which survives degraded polls untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFeed {
    pub status: LinkStatus,
    pub snapshot: Option<TelemetrySnapshot>,
}

impl Default for TelemetryFeed {
    fn default() -> Self {
        Self {
            status: LinkStatus::Initializing,
            snapshot: None,
        }
    }
}
