mod clock;
mod config;
mod engine;
mod linked;

pub use clock::{Clock, SystemClock};
pub use config::{DurationParts, Preset, TimerConfig, TimerMode};
pub use engine::{FocusTimer, TickHandle, TimerSnapshot, TimerState};
pub use linked::LinkedTask;
