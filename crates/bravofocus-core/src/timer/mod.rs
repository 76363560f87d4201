mod clock;
mod display;
mod engine;
mod session;
mod ticker;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use display::{display_seconds, format_clock};
pub use engine::TimerEngine;
pub use session::{CompletedSession, Session, SessionLength, TimerMode, TimerState};
pub use ticker::{Command, TickLoop, TickObserver};
