// Copyright (c) 2024 Mike Tsao

//! The traits that define the seams between the engine and its host.

use crate::{error::Result, sequencing::Track};
use core::time::Duration;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{HasSettings, IntervalId, Reverses, StepExecutor, Tickable, Timer, TimerCallback};
}

/// A [StepExecutor] does whatever a step means to the host: play a note, flash
/// a light, log a line. A [Track] calls it synchronously each time it lands on
/// an active step, passing itself so the executor can read
/// [Track::parameters()] and [Track::current_step()].
///
/// Errors aren't caught by the engine. They stop the tick that caused them,
/// and the tracks that hadn't yet advanced during that tick stay where they
/// are.
pub trait StepExecutor<T> {
    /// Handles one fired step.
    fn execute(&mut self, track: &Track<T>) -> anyhow::Result<()>;
}
impl<T, F> StepExecutor<T> for F
where
    F: FnMut(&Track<T>) -> anyhow::Result<()>,
{
    fn execute(&mut self, track: &Track<T>) -> anyhow::Result<()> {
        self(track)
    }
}

/// Something that a [PeriodicTicker](crate::timing::PeriodicTicker) can
/// drive. Normally a [Sequencer](crate::sequencing::Sequencer).
pub trait Tickable {
    /// Called once per tick.
    fn on_tick(&mut self) -> Result<()>;
}

/// Opaque identifier of an interval scheduled with a [Timer].
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct IntervalId(pub u64);

/// The callback a [Timer] runs each time an interval elapses.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// A [Timer] schedules repeating callbacks. It's the only thing in the system
/// that knows about wall-clock time, which lets tests substitute a
/// [ManualTimer](crate::timing::ManualTimer) for the real
/// [ThreadTimer](crate::timing::ThreadTimer).
pub trait Timer {
    /// Runs `callback` every `interval` until the returned [IntervalId] is
    /// cleared. The first run happens one full interval from now.
    fn set_interval(&mut self, callback: TimerCallback, interval: Duration) -> IntervalId;

    /// Cancels the interval. Unknown or already-cleared ids are ignored.
    fn clear_interval(&mut self, id: IntervalId);
}

/// Parameters that remember a direction of travel. This is how
/// [ping_pong](crate::sequencing::ping_pong) keeps its state between ticks
/// without the engine knowing anything about the host's parameter type.
pub trait Reverses {
    /// True if the track is currently traveling toward lower step indexes.
    fn is_reversed(&self) -> bool;

    /// Changes the direction of travel.
    fn set_reversed(&mut self, is_reversed: bool);
}

/// Each app should have a Settings struct that is composed of subsystems having
/// their own settings. Implementing [HasSettings] helps the composed struct
/// manage its parts.
pub trait HasSettings {
    /// Whether the current state of this struct has been saved to disk.
    fn has_been_saved(&self) -> bool;
    /// Call this whenever the struct changes.
    fn needs_save(&mut self);
    /// Call this after a load() or a save().
    fn mark_clean(&mut self);
}
