use std::error::Error;
use std::ops::ControlFlow;

use bravofocus_core::{
    settle_completion, Chime, Command, Config, Database, Event, Preferences, ProgressionState,
    ProgressionTracker, RandomPicker, Session, SessionLength, SystemClock, TickLoop, TickObserver,
    TimerEngine, TimerMode, TimerState,
};
use chrono::Local;
use clap::Subcommand;
use tokio::sync::mpsc;

use super::{audio_player, print_json};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a manual countdown
    Start {
        /// Minutes (defaults to the configured manual timer)
        #[arg(long)]
        minutes: Option<u32>,
        /// Seconds, 0-59
        #[arg(long)]
        seconds: Option<u32>,
        /// Stay attached and show the countdown until it completes
        #[arg(long)]
        follow: bool,
    },
    /// Start a study session from the study preset
    Study {
        #[arg(long)]
        follow: bool,
    },
    /// Start a break from the break preset
    Break {
        #[arg(long)]
        follow: bool,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Reset to idle state
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Follow the running countdown live; Ctrl-C pauses it
    Run,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn Error>> {
    let mut db = Database::open()?;
    let mut engine = TimerEngine::restore(SystemClock, Session::load(&db));

    // Settle a countdown that ran out while nothing was watching it.
    let mut changed = false;
    if let Some(event) = engine.tick() {
        settle(&event, &mut db, config)?;
        changed = true;
    }

    let follow = match action {
        TimerAction::Start {
            minutes,
            seconds,
            follow,
        } => {
            let length = manual_length(config, minutes, seconds)?;
            print_json(&engine.start(length, TimerMode::Manual))?;
            changed = true;
            follow
        }
        TimerAction::Study { follow } => {
            print_json(&engine.start(config.study_length()?, TimerMode::Study))?;
            changed = true;
            follow
        }
        TimerAction::Break { follow } => {
            print_json(&engine.start(config.break_length()?, TimerMode::Break))?;
            changed = true;
            follow
        }
        TimerAction::Pause => {
            let event = match engine.pause() {
                Some(event) => {
                    changed = true;
                    event
                }
                None => engine.snapshot(),
            };
            print_json(&event)?;
            false
        }
        TimerAction::Resume => {
            let event = match engine.resume() {
                Some(event) => {
                    changed = true;
                    event
                }
                None => engine.snapshot(),
            };
            print_json(&event)?;
            false
        }
        TimerAction::Reset => {
            print_json(&engine.reset())?;
            changed = true;
            false
        }
        TimerAction::Status => {
            print_json(&engine.snapshot())?;
            false
        }
        TimerAction::Run => {
            if engine.state() != TimerState::Running {
                print_json(&engine.snapshot())?;
            }
            true
        }
    };

    // Read-only commands leave the stored session alone so they never
    // overwrite a change another invocation made in the meantime.
    if changed {
        engine.session().save(&mut db)?;
    }

    if follow && engine.state() == TimerState::Running {
        follow_live(engine, &mut db, config)?;
    }
    Ok(())
}

/// `--minutes` alone means whole minutes; neither flag means the configured
/// manual timer.
fn manual_length(
    config: &Config,
    minutes: Option<u32>,
    seconds: Option<u32>,
) -> Result<SessionLength, Box<dyn Error>> {
    let length = match (minutes, seconds) {
        (None, None) => config.manual_length()?,
        (minutes, seconds) => {
            SessionLength::from_minutes_seconds(minutes.unwrap_or(0), seconds.unwrap_or(0))?
        }
    };
    Ok(length)
}

/// Chime, credit progression and report the reward.
fn settle(event: &Event, db: &mut Database, config: &Config) -> Result<(), Box<dyn Error>> {
    let Event::TimerCompleted { session, .. } = event else {
        return Ok(());
    };
    print_json(event)?;

    let prefs = Preferences::load(&*db);
    let mut chime = Chime::new(audio_player(config), |message: &str| eprintln!("{message}"));
    chime.ring(&prefs.sound.resolve(&config.asset_dir()));

    let mut state = ProgressionState::load(&*db);
    let mut tracker = ProgressionTracker::new(&mut *db, RandomPicker);
    let settlement = settle_completion(
        &mut tracker,
        &mut state,
        session,
        Local::now().date_naive(),
    );
    print_json(&settlement.to_event(&state))?;
    Ok(())
}

/// Terminal countdown. The clock line goes to stderr so stdout stays JSON.
///
/// Other invocations may start, pause or reset the timer while this one is
/// watching. The persisted session is checked on every redraw; once it no
/// longer continues the followed run, the view detaches.
struct LiveView<'a> {
    db: &'a Database,
    following: Session,
    shown: Option<String>,
    completed: Option<Event>,
    detached: bool,
}

impl<'a> LiveView<'a> {
    fn new(db: &'a Database, following: Session) -> Self {
        Self {
            db,
            following,
            shown: None,
            completed: None,
            detached: false,
        }
    }

    fn superseded(&self) -> bool {
        !self.following.same_run(&Session::load(self.db))
    }

    fn detach(&mut self) -> ControlFlow<()> {
        eprintln!();
        self.detached = true;
        ControlFlow::Break(())
    }
}

impl TickObserver for LiveView<'_> {
    fn on_event(&mut self, event: &Event, _session: &Session) -> ControlFlow<()> {
        match event {
            Event::TimerCompleted { .. } | Event::TimerPaused { .. } if self.superseded() => {
                self.detach()
            }
            Event::TimerCompleted { .. } => {
                eprintln!();
                self.completed = Some(event.clone());
                ControlFlow::Break(())
            }
            Event::TimerPaused { .. } => {
                eprintln!();
                if let Err(e) = print_json(event) {
                    tracing::warn!(error = %e, "failed to print pause event");
                }
                ControlFlow::Continue(())
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn on_tick(&mut self, session: &Session) -> ControlFlow<()> {
        let display = session.display();
        if self.shown.as_deref() == Some(display.as_str()) {
            return ControlFlow::Continue(());
        }
        if self.superseded() {
            return self.detach();
        }
        eprint!(
            "\r{} {}  {}  ({:>3.0}%)",
            session.mode().icon(),
            session.mode().title(),
            display,
            session.progress() * 100.0
        );
        self.shown = Some(display);
        ControlFlow::Continue(())
    }
}

/// Follow a running session until it completes, is interrupted, or is
/// changed by another invocation. Only in the first two cases is the
/// outcome persisted.
fn follow_live(
    engine: TimerEngine,
    db: &mut Database,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut view = LiveView::new(&*db, engine.session().clone());
    let ticker = TickLoop::new(engine, config.tick_interval());
    let (commands, receiver) = mpsc::unbounded_channel();

    let engine = runtime.block_on(async {
        let interrupt = commands.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = interrupt.send(Command::Pause);
                let _ = interrupt.send(Command::Shutdown);
            }
        });
        // Let the signal handler register before the first tick.
        tokio::task::yield_now().await;
        ticker.run(receiver, &mut view).await
    });
    drop(commands);

    let LiveView {
        completed,
        detached,
        ..
    } = view;
    if detached {
        tracing::info!("session changed by another command, stopped following");
        eprintln!("timer changed elsewhere; stopped following");
        return Ok(());
    }

    engine.session().save(db)?;
    if let Some(event) = completed {
        settle(&event, db, config)?;
    }
    Ok(())
}
