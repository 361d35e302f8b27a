//! Mood Engine
//!
//! The consciousness state machine behind the shell's ambient mood. Purely
//! cosmetic: it reflects recent operator activity and idle time, nothing
//! more. Exactly one engine exists per process; it is constructed and owned
//! by the application context and handed out by reference, and it is never
//! reset or destroyed before the process ends.

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

use super::math;

/// Delay between ignition and settling into observation.
pub const AWAKEN_DELAY: Duration = Duration::from_secs(2);

/// How long after a stimulus the processing state tries to revert.
pub const REVERT_DELAY: Duration = Duration::from_secs(3);

/// A revert only lands when the last stimulus is at least this old.
pub const REVERT_GUARD: Duration = Duration::from_millis(2500);

/// Continuous idle time that forces the dreaming state.
pub const DREAM_AFTER: Duration = Duration::from_secs(60);

/// Consciousness states, in rough order of arousal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodState {
    Dormant,
    Awakening,
    Observing,
    Processing,
    Dreaming,
}

impl fmt::Display for MoodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MoodState::Dormant => "DORMANT",
            MoodState::Awakening => "AWAKENING",
            MoodState::Observing => "OBSERVING",
            MoodState::Processing => "PROCESSING",
            MoodState::Dreaming => "DREAMING",
        };
        f.write_str(label)
    }
}

/// One self-evaluation result.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MoodReading {
    pub state: MoodState,
    pub entropy: f64,
    pub interactions: u64,
}

struct Inner {
    state: MoodState,
    interactions: u64,
    last_stimulus: Instant,
    /// Bumped by every stimulus that lands in the processing state; a
    /// pending revert timer only fires for the generation that armed it.
    revert_gen: u64,
}

/// The process-wide mood state machine.
pub struct MoodEngine {
    inner: Arc<Mutex<Inner>>,
    started: Instant,
}

impl MoodEngine {
    /// Create the engine in its dormant state.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: MoodState::Dormant,
                interactions: 0,
                last_stimulus: now,
                revert_gen: 0,
            })),
            started: now,
        }
    }

    /// Start the consciousness cycle: awakening immediately, observing
    /// after [`AWAKEN_DELAY`]. The shift is unconditional and cannot be
    /// cancelled. Must be called from within a tokio runtime.
    pub fn ignite(&self) {
        {
            let mut inner = self.lock();
            inner.state = MoodState::Awakening;
        }
        tracing::debug!("mood engine igniting");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(AWAKEN_DELAY).await;
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.state = MoodState::Observing;
        });
    }

    /// Record an operator stimulus (click, key, scroll).
    ///
    /// While observing or dreaming this enters the processing state. Each
    /// stimulus that lands in processing arms its own revert timer and
    /// supersedes any earlier pending one; the revert only lands when the
    /// most recent stimulus is at least [`REVERT_GUARD`] old.
    pub fn stimulus(&self) {
        let armed_gen = {
            let mut inner = self.lock();
            inner.interactions += 1;
            inner.last_stimulus = Instant::now();

            if matches!(inner.state, MoodState::Observing | MoodState::Dreaming) {
                inner.state = MoodState::Processing;
            }
            if inner.state != MoodState::Processing {
                return;
            }

            inner.revert_gen += 1;
            inner.revert_gen
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(REVERT_DELAY).await;
            let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
            // A later stimulus superseded this timer, or the state moved on.
            if inner.revert_gen != armed_gen || inner.state != MoodState::Processing {
                return;
            }
            if inner.last_stimulus.elapsed() >= REVERT_GUARD {
                inner.state = MoodState::Observing;
            }
        });
    }

    /// Self-evaluation, invoked by the consumer's own cadence (the engine
    /// never schedules it). Computes entropy from uptime and interaction
    /// count, and forces the dreaming state after [`DREAM_AFTER`] of
    /// continuous idleness regardless of the processing debounce.
    pub fn evaluate(&self) -> MoodReading {
        let uptime_ms = self.started.elapsed().as_millis() as u64;
        let mut inner = self.lock();

        let entropy = math::entropy(uptime_ms, inner.interactions);

        if inner.last_stimulus.elapsed() >= DREAM_AFTER && inner.state != MoodState::Dreaming {
            tracing::debug!("idle threshold crossed, drifting into dreaming");
            inner.state = MoodState::Dreaming;
        }

        MoodReading {
            state: inner.state,
            entropy,
            interactions: inner.interactions,
        }
    }

    /// Current state without evaluating.
    pub fn state(&self) -> MoodState {
        self.lock().state
    }

    /// Total stimuli recorded since construction.
    pub fn interactions(&self) -> u64 {
        self.lock().interactions
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MoodEngine {
    fn default() -> Self {
        Self::new()
    }
}
