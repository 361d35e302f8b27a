//! Organic Math
//!
//! Non-linear helpers for simulating organic behavior in a digital system.

/// Deterministic noise blend, used for organic variation.
pub fn noise(time: f64) -> f64 {
    time.sin() * (time * 2.5).cos() * (time * 0.5).sin()
}

/// System entropy from uptime and accumulated interactions.
///
/// Entropy rises with the log of uptime and falls as interactions
/// accumulate (negentropy), floored at zero. Rounded to four decimals.
pub fn entropy(uptime_ms: u64, interactions: u64) -> f64 {
    let time_factor = (uptime_ms as f64 + 1.0).ln() * 0.001;
    let stability_factor = interactions as f64 * 0.05;
    ((time_factor - stability_factor).max(0.0) * 10_000.0).round() / 10_000.0
}

/// Heartbeat rhythm: base BPM plus stress-bounded variance.
pub fn pulse_rhythm(base_bpm: f64, stress_level: f64) -> f64 {
    base_bpm + jitter() * stress_level
}

/// Simple jitter source (0.0 to 1.0)
fn jitter() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}
