use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::state::ProgressionState;
use super::stickers::{pick_sticker, StickerPicker};
use crate::error::StorageError;
use crate::storage::{keys, read_parsed, KeyValueStore};

/// Experience is granted in whole blocks of this many minutes.
pub const EXP_STEP_MINUTES: u64 = 10;

/// `floor(minutes / 10) * 10`. Sessions under ten minutes earn nothing.
pub fn exp_for_minutes(minutes: u64) -> u64 {
    minutes / EXP_STEP_MINUTES * EXP_STEP_MINUTES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReward {
    pub exp_gained: u64,
    pub leveled_up: bool,
    pub new_level: u32,
    pub new_sticker: Option<String>,
}

/// Applies completed sessions to a [`ProgressionState`] and persists the
/// result.
pub struct ProgressionTracker<S, P> {
    store: S,
    picker: P,
}

impl<S: KeyValueStore, P: StickerPicker> ProgressionTracker<S, P> {
    pub fn new(store: S, picker: P) -> Self {
        Self { store, picker }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Credit a completed session.
    ///
    /// Crossing one or more level boundaries awards exactly one sticker.
    /// Experience, level and stickers are written in a single batch and only
    /// then committed to `state`; if the write fails `state` is untouched.
    ///
    /// # Errors
    /// Returns an error if the store rejects the batch.
    pub fn record_session(
        &mut self,
        state: &mut ProgressionState,
        minutes: u64,
    ) -> Result<SessionReward, StorageError> {
        let exp_gained = exp_for_minutes(minutes);
        if exp_gained == 0 {
            return Ok(SessionReward {
                exp_gained: 0,
                leveled_up: false,
                new_level: state.level(),
                new_sticker: None,
            });
        }

        let mut next = state.clone();
        next.gain(exp_gained);
        let leveled_up = next.level() > state.level();
        let new_sticker = if leveled_up {
            let sticker = pick_sticker(&mut self.picker).to_string();
            next.award(sticker.clone());
            Some(sticker)
        } else {
            None
        };

        self.store.set_many(&next.entries())?;
        *state = next;

        if leveled_up {
            tracing::info!(level = state.level(), sticker = ?new_sticker, "level up");
        }
        tracing::debug!(exp_gained, experience = state.experience(), "experience recorded");

        Ok(SessionReward {
            exp_gained,
            leveled_up,
            new_level: state.level(),
            new_sticker,
        })
    }

    /// Add study minutes to `day`'s total and return the new total.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub fn record_study_minutes(
        &mut self,
        minutes: u64,
        day: NaiveDate,
    ) -> Result<u64, StorageError> {
        let total = self.study_minutes(day).saturating_add(minutes);
        self.store.set(&keys::study_time(day), &total.to_string())?;
        Ok(total)
    }

    /// Minutes studied on `day`; 0 if nothing (readable) was recorded.
    pub fn study_minutes(&self, day: NaiveDate) -> u64 {
        read_parsed(&self.store, &keys::study_time(day)).unwrap_or(0)
    }

    /// Every recorded day, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be scanned.
    pub fn study_history(&self) -> Result<Vec<(NaiveDate, u64)>, StorageError> {
        let rows = self.store.scan_prefix(keys::STUDY_TIME_PREFIX)?;
        Ok(rows
            .into_iter()
            .filter_map(|(key, value)| {
                let day = keys::study_day(&key)?;
                let minutes = value.trim().parse().ok()?;
                Some((day, minutes))
            })
            .collect())
    }
}
