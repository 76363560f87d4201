//! Live tick loop.
//!
//! [`TickLoop`] owns a [`TimerEngine`] and multiplexes two sources on a single
//! task: user commands from an mpsc channel and a tick interval. The interval
//! only exists while the engine is running and is dropped before any command
//! is applied, so there is never more than one tick source and no tick can
//! land after a pause or reset has been handled.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use super::clock::Clock;
use super::engine::TimerEngine;
use super::session::{Session, SessionLength, TimerMode, TimerState};
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        length: SessionLength,
        mode: TimerMode,
    },
    Pause,
    Resume,
    Reset,
    /// Stop the loop and hand the engine back.
    Shutdown,
}

/// Receives everything the loop produces.
pub trait TickObserver {
    /// Called for every engine event. `Break` stops the loop.
    fn on_event(&mut self, event: &Event, session: &Session) -> ControlFlow<()>;

    /// Called after every tick while running. `Break` stops the loop.
    fn on_tick(&mut self, _session: &Session) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F> TickObserver for F
where
    F: FnMut(&Event, &Session) -> ControlFlow<()>,
{
    fn on_event(&mut self, event: &Event, session: &Session) -> ControlFlow<()> {
        self(event, session)
    }
}

pub struct TickLoop<C: Clock> {
    engine: TimerEngine<C>,
    period: Duration,
}

impl<C: Clock> TickLoop<C> {
    /// Fine enough for a smooth gauge at 120 fps.
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(8);

    pub fn new(engine: TimerEngine<C>, period: Duration) -> Self {
        // tokio rejects a zero period.
        let period = period.max(Duration::from_millis(1));
        Self { engine, period }
    }

    /// Drive the engine until the command channel closes, a `Shutdown`
    /// arrives, or the observer breaks. Returns the engine in whatever state
    /// it was left.
    pub async fn run<O>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        observer: &mut O,
    ) -> TimerEngine<C>
    where
        O: TickObserver + ?Sized,
    {
        let mut ticker = self.arm();

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let command = match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => command,
                    };
                    drop(ticker.take());
                    let event = self.apply(command);
                    ticker = self.arm();
                    if let Some(event) = event {
                        if observer.on_event(&event, self.engine.session()).is_break() {
                            break;
                        }
                    }
                }

                _ = next_tick(&mut ticker) => {
                    let completed = self.engine.tick();
                    if observer.on_tick(self.engine.session()).is_break() {
                        break;
                    }
                    if let Some(event) = completed {
                        ticker = None;
                        if observer.on_event(&event, self.engine.session()).is_break() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(state = ?self.engine.state(), "tick loop stopped");
        self.engine
    }

    fn apply(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::Start { length, mode } => Some(self.engine.start(length, mode)),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::Reset => Some(self.engine.reset()),
            Command::Shutdown => None,
        }
    }

    fn arm(&self) -> Option<Interval> {
        if self.engine.state() != TimerState::Running {
            return None;
        }
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Some(interval)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::MonotonicClock;

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        samples: Vec<(TimerState, u64)>,
        stop_on_completion: bool,
        stop_after_samples: Option<usize>,
    }

    impl TickObserver for Recorder {
        fn on_event(&mut self, event: &Event, _session: &Session) -> ControlFlow<()> {
            self.events.push(event.clone());
            if self.stop_on_completion && matches!(event, Event::TimerCompleted { .. }) {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }

        fn on_tick(&mut self, session: &Session) -> ControlFlow<()> {
            self.samples.push((session.state(), session.remaining_ms()));
            match self.stop_after_samples {
                Some(limit) if self.samples.len() >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        }
    }

    impl Recorder {
        fn completions(&self) -> usize {
            self.events
                .iter()
                .filter(|e| matches!(e, Event::TimerCompleted { .. }))
                .count()
        }
    }

    fn start(ms: u64) -> Command {
        Command::Start {
            length: SessionLength::from_ms(ms).unwrap(),
            mode: TimerMode::Manual,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_once() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(1_000)).unwrap();

        let began = tokio::time::Instant::now();
        let mut recorder = Recorder {
            stop_on_completion: true,
            ..Default::default()
        };
        let engine = TickLoop::new(
            TimerEngine::new(MonotonicClock::new()),
            TickLoop::<MonotonicClock>::DEFAULT_PERIOD,
        )
        .run(rx, &mut recorder)
        .await;

        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(engine.remaining_ms(), 0);
        assert_eq!(recorder.completions(), 1);
        assert!(began.elapsed() >= Duration::from_millis(1_000));
        assert!(recorder
            .samples
            .windows(2)
            .all(|pair| pair[1].1 <= pair[0].1));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_ticking_after_completion() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(100)).unwrap();

        let mut recorder = Recorder::default();
        let driver = async {
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            tx.send(Command::Shutdown).unwrap();
        };
        let (engine, ()) = tokio::join!(
            TickLoop::new(TimerEngine::new(MonotonicClock::new()), Duration::from_millis(8))
                .run(rx, &mut recorder),
            driver
        );

        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(recorder.completions(), 1);
        let last_sample = recorder.samples.last().copied().unwrap();
        assert_eq!(last_sample, (TimerState::Completed, 0));
        // Roughly 100ms of 8ms ticks, nothing after completion.
        assert!(recorder.samples.len() <= 15, "{} samples", recorder.samples.len());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_ticks_and_resume_continues() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(1_000)).unwrap();

        let mut recorder = Recorder {
            stop_on_completion: true,
            ..Default::default()
        };
        let driver = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            tx.send(Command::Pause).unwrap();
            tokio::time::sleep(Duration::from_millis(2_000)).await;
            tx.send(Command::Resume).unwrap();
        };
        let (engine, ()) = tokio::join!(
            TickLoop::new(TimerEngine::new(MonotonicClock::new()), Duration::from_millis(8))
                .run(rx, &mut recorder),
            driver
        );

        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(recorder.completions(), 1);

        let paused_at = recorder
            .events
            .iter()
            .find_map(|e| match e {
                Event::TimerPaused { remaining_ms, .. } => Some(*remaining_ms),
                _ => None,
            })
            .expect("pause event");
        assert!((490..=500).contains(&paused_at), "paused at {paused_at}");
        assert!(recorder
            .samples
            .iter()
            .all(|(state, _)| *state != TimerState::Paused));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_running_session() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(10_000)).unwrap();

        let mut recorder = Recorder {
            stop_on_completion: true,
            ..Default::default()
        };
        let driver = async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            tx.send(start(200)).unwrap();
        };
        let began = tokio::time::Instant::now();
        let (engine, ()) = tokio::join!(
            TickLoop::new(TimerEngine::new(MonotonicClock::new()), Duration::from_millis(8))
                .run(rx, &mut recorder),
            driver
        );

        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(engine.duration_ms(), 200);
        assert_eq!(recorder.completions(), 1);
        assert!(began.elapsed() < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_observer_can_detach_while_running() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(60_000)).unwrap();

        let mut recorder = Recorder {
            stop_after_samples: Some(3),
            ..Default::default()
        };
        let engine = TickLoop::new(TimerEngine::new(MonotonicClock::new()), Duration::from_millis(8))
            .run(rx, &mut recorder)
            .await;

        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(recorder.samples.len(), 3);
        assert_eq!(recorder.completions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_channel_returns_engine() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(start(60_000)).unwrap();
        tx.send(Command::Pause).unwrap();
        drop(tx);

        let mut events = Vec::new();
        let mut observer = |event: &Event, _: &Session| {
            events.push(event.clone());
            ControlFlow::Continue(())
        };
        let engine = TickLoop::new(TimerEngine::new(MonotonicClock::new()), Duration::ZERO)
            .run(rx, &mut observer)
            .await;

        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.remaining_ms(), 60_000);
        assert_eq!(events.len(), 2);
    }
}
