use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{CompletedSession, TimerMode, TimerState};

/// Every state change in the system produces an Event.
/// The CLI prints them as JSON; observers of the tick loop receive them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        session: CompletedSession,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        mode: TimerMode,
        remaining_ms: u64,
        duration_ms: u64,
        /// `MM:SS`, rounded up to the next whole second.
        display: String,
        progress: f64,
        at: DateTime<Utc>,
    },
    /// Progression result of a completed session.
    RewardGranted {
        mode: TimerMode,
        minutes: u64,
        exp_gained: u64,
        experience: u64,
        level: u32,
        leveled_up: bool,
        new_sticker: Option<String>,
        /// Today's study total, present for study sessions only.
        study_minutes_today: Option<u64>,
        at: DateTime<Utc>,
    },
}
