//! Mood
//!
//! The cosmetic consciousness layer: a per-process state machine driven by
//! operator activity and idle time, plus the organic math behind it.

mod engine;
pub mod math;

pub use engine::{
    MoodEngine, MoodReading, MoodState, AWAKEN_DELAY, DREAM_AFTER, REVERT_DELAY, REVERT_GUARD,
};
