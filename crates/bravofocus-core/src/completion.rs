//! What happens after a countdown finishes.
//!
//! Every completed session is credited experience; study sessions also add
//! to the day's study total. Storage failures are logged and reported as a
//! missing part of the [`Settlement`], never as an error.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::progression::{ProgressionState, ProgressionTracker, SessionReward, StickerPicker};
use crate::storage::KeyValueStore;
use crate::timer::{CompletedSession, TimerMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub mode: TimerMode,
    /// Minutes credited to progression.
    pub minutes: u64,
    /// `None` if the progression write failed.
    pub reward: Option<SessionReward>,
    /// Today's study total after this session; study sessions only.
    pub study_minutes_today: Option<u64>,
}

impl Settlement {
    pub fn to_event(&self, state: &ProgressionState) -> Event {
        let reward = self.reward.as_ref();
        Event::RewardGranted {
            mode: self.mode,
            minutes: self.minutes,
            exp_gained: reward.map(|r| r.exp_gained).unwrap_or(0),
            experience: state.experience(),
            level: state.level(),
            leveled_up: reward.is_some_and(|r| r.leveled_up),
            new_sticker: reward.and_then(|r| r.new_sticker.clone()),
            study_minutes_today: self.study_minutes_today,
            at: Utc::now(),
        }
    }
}

/// Apply a completed session to progression.
///
/// `today` is the calendar day study minutes are filed under.
pub fn settle_completion<S, P>(
    tracker: &mut ProgressionTracker<S, P>,
    state: &mut ProgressionState,
    completed: &CompletedSession,
    today: NaiveDate,
) -> Settlement
where
    S: KeyValueStore,
    P: StickerPicker,
{
    let minutes = completed.credited_minutes();

    let reward = match tracker.record_session(state, minutes) {
        Ok(reward) => Some(reward),
        Err(e) => {
            tracing::warn!(error = %e, minutes, "failed to record experience");
            None
        }
    };

    let study_minutes_today = if completed.mode == TimerMode::Study {
        match tracker.record_study_minutes(minutes, today) {
            Ok(total) => Some(total),
            Err(e) => {
                tracing::warn!(error = %e, minutes, "failed to record study minutes");
                None
            }
        }
    } else {
        None
    };

    Settlement {
        mode: completed.mode,
        minutes,
        reward,
        study_minutes_today,
    }
}
