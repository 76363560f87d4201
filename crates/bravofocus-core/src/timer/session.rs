//! Session model: one countdown with a fixed duration and mutable remaining
//! time.
//!
//! Mutation is reserved for the engine; everything else reads.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use super::display::{display_seconds, format_clock};
use crate::error::{StorageError, ValidationError};
use crate::storage::{keys, KeyValueStore};

const MS_PER_MINUTE: u64 = 60_000;

/// Which completion accounting (and accent) a session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Manual,
    Study,
    Break,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Manual => "manual",
            TimerMode::Study => "study",
            TimerMode::Break => "break",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TimerMode::Manual => "Timer",
            TimerMode::Study => "Study Time",
            TimerMode::Break => "Break Time",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TimerMode::Manual => "⏰",
            TimerMode::Study => "📚",
            TimerMode::Break => "☕",
        }
    }

    /// Progress gauge colour.
    pub fn accent_color(&self) -> &'static str {
        match self {
            TimerMode::Manual => "#3b82f6",
            TimerMode::Study => "#10b981",
            TimerMode::Break => "#f97316",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// A validated, non-zero countdown length.
///
/// The engine only accepts this type, so a zero-length session can never
/// reach `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SessionLength(NonZeroU64);

impl SessionLength {
    pub fn from_ms(ms: u64) -> Result<Self, ValidationError> {
        NonZeroU64::new(ms)
            .map(Self)
            .ok_or(ValidationError::ZeroDuration)
    }

    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        Self::from_ms(u64::from(minutes) * MS_PER_MINUTE)
    }

    /// Manual timer input. Seconds must be a clock-face value (0..=59).
    pub fn from_minutes_seconds(minutes: u32, seconds: u32) -> Result<Self, ValidationError> {
        if seconds > 59 {
            return Err(ValidationError::SecondsOutOfRange(seconds));
        }
        Self::from_ms(u64::from(minutes) * MS_PER_MINUTE + u64::from(seconds) * 1000)
    }

    pub fn as_ms(&self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for SessionLength {
    type Error = ValidationError;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        Self::from_ms(ms)
    }
}

impl From<SessionLength> for u64 {
    fn from(length: SessionLength) -> Self {
        length.as_ms()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    mode: TimerMode,
    state: TimerState,
    duration_ms: u64,
    /// Remaining time in milliseconds, unrounded.
    remaining_ms: u64,
    /// Elapsed-time baseline. Only set while running.
    #[serde(default)]
    started_at_ms: Option<u64>,
    /// When the session was first started; survives pause/resume.
    #[serde(default)]
    first_started_at_ms: Option<u64>,
}

impl Session {
    pub fn idle() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn first_started_at_ms(&self) -> Option<u64> {
        self.first_started_at_ms
    }

    pub fn display_seconds(&self) -> u64 {
        display_seconds(self.remaining_ms)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.display_seconds())
    }

    /// 0.0 .. 1.0 elapsed fraction, from the unrounded remaining time.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        let elapsed = self.duration_ms - self.remaining_ms;
        (elapsed as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// Whether the fields describe a state the engine could have produced.
    pub fn is_consistent(&self) -> bool {
        if self.remaining_ms > self.duration_ms {
            return false;
        }
        match self.state {
            TimerState::Idle => {
                self.duration_ms == 0 && self.remaining_ms == 0 && self.started_at_ms.is_none()
            }
            TimerState::Running => self.duration_ms > 0 && self.started_at_ms.is_some(),
            TimerState::Paused => self.duration_ms > 0 && self.started_at_ms.is_none(),
            TimerState::Completed => self.duration_ms > 0 && self.remaining_ms == 0,
        }
    }

    /// Whether `other` is the same countdown, still running from the same
    /// baseline. Any start, pause, resume or reset in between breaks this.
    pub fn same_run(&self, other: &Session) -> bool {
        self.state == TimerState::Running
            && other.state == TimerState::Running
            && self.mode == other.mode
            && self.duration_ms == other.duration_ms
            && self.started_at_ms == other.started_at_ms
            && self.first_started_at_ms == other.first_started_at_ms
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Read the persisted session, falling back to idle when it is absent,
    /// unreadable, or inconsistent.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let raw = match store.get(keys::SESSION) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::idle(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                return Self::idle();
            }
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_consistent() => session,
            Ok(_) => {
                tracing::warn!("persisted session is inconsistent, starting idle");
                Self::idle()
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted session is corrupt, starting idle");
                Self::idle()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        store.set(keys::SESSION, &json)
    }

    // ── Engine-side mutation ─────────────────────────────────────────

    pub(super) fn begin(&mut self, length: SessionLength, mode: TimerMode, now_ms: u64) {
        *self = Self {
            mode,
            state: TimerState::Running,
            duration_ms: length.as_ms(),
            remaining_ms: length.as_ms(),
            started_at_ms: Some(now_ms),
            first_started_at_ms: Some(now_ms),
        };
    }

    /// Recompute remaining time from the elapsed baseline.
    ///
    /// The result is clamped to the previous sample so a clock that steps
    /// backwards can never make remaining time grow.
    pub(super) fn sample(&mut self, now_ms: u64) {
        if let Some(start) = self.started_at_ms {
            let elapsed = now_ms.saturating_sub(start);
            let computed = self.duration_ms.saturating_sub(elapsed);
            self.remaining_ms = computed.min(self.remaining_ms);
        }
    }

    pub(super) fn freeze(&mut self, now_ms: u64) {
        self.sample(now_ms);
        self.started_at_ms = None;
        self.state = TimerState::Paused;
    }

    /// Move the baseline so that `duration - (now - start) == remaining`.
    pub(super) fn rebase(&mut self, now_ms: u64) {
        let consumed = self.duration_ms - self.remaining_ms;
        self.started_at_ms = Some(now_ms.saturating_sub(consumed));
        self.state = TimerState::Running;
    }

    pub(super) fn finish(&mut self) {
        self.remaining_ms = 0;
        self.started_at_ms = None;
        self.state = TimerState::Completed;
    }

    pub(super) fn clear(&mut self) {
        *self = Self::idle();
    }
}

/// A finished session, handed to completion accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub mode: TimerMode,
    pub duration_ms: u64,
    pub started_at_ms: u64,
    pub completed_at_ms: u64,
}

impl CompletedSession {
    /// Whole minutes credited to progression.
    ///
    /// Study and break sessions are credited their preset length. Manual
    /// sessions are credited wall-clock minutes since they were first
    /// started, paused time included.
    pub fn credited_minutes(&self) -> u64 {
        match self.mode {
            TimerMode::Study | TimerMode::Break => self.duration_ms / MS_PER_MINUTE,
            TimerMode::Manual => {
                self.completed_at_ms.saturating_sub(self.started_at_ms) / MS_PER_MINUTE
            }
        }
    }
}
