//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller (usually a [`TickLoop`](super::TickLoop)) is
//! responsible for calling `tick()` periodically. Every tick recomputes the
//! remaining time from the clock, so a late or skipped tick costs nothing.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed -> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(SystemClock);
//! engine.start(SessionLength::from_minutes(25)?, TimerMode::Study);
//! // In a loop:
//! engine.tick(); // Returns Some(Event::TimerCompleted) exactly once
//! ```

use chrono::Utc;

use super::clock::{Clock, SystemClock};
use super::session::{CompletedSession, Session, SessionLength, TimerMode, TimerState};
use crate::events::Event;

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread.
#[derive(Debug, Clone)]
pub struct TimerEngine<C: Clock = SystemClock> {
    clock: C,
    session: Session,
}

impl<C: Clock> TimerEngine<C> {
    /// Create an idle engine.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            session: Session::idle(),
        }
    }

    /// Resume from a previously persisted session.
    ///
    /// Inconsistent sessions are discarded in favour of an idle one.
    pub fn restore(clock: C, session: Session) -> Self {
        let session = if session.is_consistent() {
            session
        } else {
            tracing::warn!("discarding inconsistent session");
            Session::idle()
        };
        Self { clock, session }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.session.state()
    }

    pub fn mode(&self) -> TimerMode {
        self.session.mode()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.session.remaining_ms()
    }

    pub fn duration_ms(&self) -> u64 {
        self.session.duration_ms()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.session.state(),
            mode: self.session.mode(),
            remaining_ms: self.session.remaining_ms(),
            duration_ms: self.session.duration_ms(),
            display: self.session.display(),
            progress: self.session.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new countdown. Legal from every state; whatever was running
    /// before is superseded.
    pub fn start(&mut self, length: SessionLength, mode: TimerMode) -> Event {
        if self.session.state() != TimerState::Idle {
            tracing::debug!(previous = ?self.session.state(), "superseding session");
        }
        self.session.begin(length, mode, self.clock.now_ms());
        tracing::debug!(%mode, duration_ms = length.as_ms(), "timer started");
        Event::TimerStarted {
            mode,
            duration_ms: length.as_ms(),
            at: Utc::now(),
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.session.state() {
            TimerState::Running => {
                // Flush elapsed time first so the exact remainder is kept.
                self.session.freeze(self.clock.now_ms());
                tracing::debug!(remaining_ms = self.session.remaining_ms(), "timer paused");
                Some(Event::TimerPaused {
                    remaining_ms: self.session.remaining_ms(),
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.session.state() {
            TimerState::Paused => {
                self.session.rebase(self.clock.now_ms());
                tracing::debug!(remaining_ms = self.session.remaining_ms(), "timer resumed");
                Some(Event::TimerResumed {
                    remaining_ms: self.session.remaining_ms(),
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) -> Event {
        self.session.clear();
        tracing::debug!("timer reset");
        Event::TimerReset { at: Utc::now() }
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` once, on the
    /// tick that observes the countdown reaching zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.session.state() != TimerState::Running {
            return None;
        }
        let now = self.clock.now_ms();
        self.session.sample(now);
        if self.session.remaining_ms() > 0 {
            return None;
        }

        let completed = CompletedSession {
            mode: self.session.mode(),
            duration_ms: self.session.duration_ms(),
            started_at_ms: self.session.first_started_at_ms().unwrap_or(now),
            completed_at_ms: now,
        };
        self.session.finish();
        tracing::info!(mode = %completed.mode, duration_ms = completed.duration_ms, "timer completed");
        Some(Event::TimerCompleted {
            session: completed,
            at: Utc::now(),
        })
    }
}
