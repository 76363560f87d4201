//! Experience, levels and stickers.
//!
//! Levels are a pure function of experience (`experience / 100 + 1`); the
//! stored level is only a cache and is recomputed on load.

mod state;
mod stickers;
mod tracker;

pub use state::{level_for, ProgressionState, EXP_PER_LEVEL};
pub use stickers::{pick_sticker, RandomPicker, SeededPicker, StickerPicker, STICKER_EMOJIS};
pub use tracker::{exp_for_minutes, ProgressionTracker, SessionReward, EXP_STEP_MINUTES};
