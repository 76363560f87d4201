//! # BravoFocus Core Library
//!
//! Core logic for the BravoFocus countdown timer: a drift-free timer engine,
//! light gamification (experience, levels, stickers) and the local state it
//! persists. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. The caller (or the
//!   [`TickLoop`]) invokes `tick()` and remaining time is recomputed from the
//!   elapsed clock delta, so late ticks never accumulate drift
//! - **Progression**: Experience, level and sticker accounting for completed
//!   sessions
//! - **Storage**: A string key/value store (SQLite or in-memory) plus a TOML
//!   configuration file
//! - **Audio**: Completion chime with a non-fatal notification fallback
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`ProgressionTracker`]: Reward accounting
//! - [`Database`]: Key/value persistence
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod completion;
pub mod error;
pub mod events;
pub mod progression;
pub mod storage;
pub mod timer;

pub use audio::{
    AudioPlayer, Chime, ChimeOutcome, CommandPlayer, MutedPlayer, Notifier, PlaybackError,
    SoundAsset, SoundChoice, COMPLETION_MESSAGE,
};
pub use completion::{settle_completion, Settlement};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use progression::{
    ProgressionState, ProgressionTracker, RandomPicker, SeededPicker, SessionReward,
    StickerPicker, STICKER_EMOJIS,
};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, Preferences, Theme};
pub use timer::{
    display_seconds, format_clock, Clock, Command, CompletedSession, ManualClock, MonotonicClock,
    Session, SessionLength, SystemClock, TickLoop, TickObserver, TimerEngine, TimerMode,
    TimerState,
};
