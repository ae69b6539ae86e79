// Copyright (c) 2024 Mike Tsao

use crate::{
    error::{Error, Result},
    traits::{IntervalId, Tickable, Timer, TimerCallback},
    types::Tempo,
};
use derivative::Derivative;
use std::sync::{Arc, Mutex};

/// Receives errors from scheduled ticks, which have no caller to return to.
pub type TickErrorFn = Box<dyn FnMut(Error) + Send>;

/// Drives a [Tickable] once per beat.
///
/// The tickable is shared as `Arc<Mutex<K>>` because the [Timer] calls it
/// from wherever its callbacks run. Host code that changes the tickable
/// between ticks takes the same lock, so a tick never sees a half-applied
/// change.
///
/// A ticker owns at most one scheduled interval. [PeriodicTicker::start()]
/// always cancels the current one before scheduling another, so starting a
/// running ticker is a restart rather than an error.
///
/// Errors from the immediate tick are returned to the caller. Errors from
/// scheduled ticks are logged and passed to the function registered with
/// [PeriodicTicker::on_tick_error()], and the schedule continues.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PeriodicTicker<K, M: Timer> {
    tickable: Arc<Mutex<K>>,
    timer: M,
    tempo: Tempo,
    interval_id: Option<IntervalId>,

    #[derivative(Debug = "ignore")]
    tick_error_fn: Arc<Mutex<Option<TickErrorFn>>>,
}
impl<K, M: Timer> PeriodicTicker<K, M> {
    /// Whether an interval is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.interval_id.is_some()
    }

    /// Cancels the schedule. Does nothing if the ticker isn't running.
    pub fn stop(&mut self) {
        if let Some(id) = self.interval_id.take() {
            self.timer.clear_interval(id);
            log::debug!("ticker stopped");
        }
    }

    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    #[allow(missing_docs)]
    pub fn bpm(&self) -> f64 {
        self.tempo.bpm()
    }

    #[allow(missing_docs)]
    pub fn tickable(&self) -> &Arc<Mutex<K>> {
        &self.tickable
    }

    #[allow(missing_docs)]
    pub fn timer(&self) -> &M {
        &self.timer
    }

    /// Registers the function that receives scheduled-tick errors, replacing
    /// any previous one. Takes effect immediately, even while running.
    pub fn on_tick_error(&mut self, tick_error_fn: impl FnMut(Error) + Send + 'static) {
        if let Ok(mut slot) = self.tick_error_fn.lock() {
            *slot = Some(Box::new(tick_error_fn));
        }
    }
}
impl<K, M> PeriodicTicker<K, M>
where
    K: Tickable + Send + 'static,
    M: Timer,
{
    #[allow(missing_docs)]
    pub fn new_with(tickable: Arc<Mutex<K>>, timer: M, tempo: Tempo) -> Self {
        Self {
            tickable,
            timer,
            tempo,
            interval_id: None,
            tick_error_fn: Default::default(),
        }
    }

    /// Ticks once right now, then once every [Tempo::interval()].
    ///
    /// Any existing schedule is cancelled first. If the immediate tick fails,
    /// nothing is scheduled and the error is returned.
    pub fn start(&mut self) -> Result<()> {
        self.stop();
        self.tick()?;
        let interval = self.tempo.interval();
        self.interval_id = Some(
            self.timer.set_interval(
                tick_callback(
                    Arc::clone(&self.tickable),
                    Arc::clone(&self.tick_error_fn),
                ),
                interval,
            ),
        );
        log::debug!("ticker started at {} ({interval:?} per tick)", self.tempo);
        Ok(())
    }

    /// Changes the tempo. A running ticker restarts on the new schedule,
    /// which means the tickable gets one extra tick immediately.
    pub fn set_tempo(&mut self, tempo: Tempo) -> Result<()> {
        self.tempo = tempo;
        if self.is_running() {
            self.stop();
            self.start()?;
        }
        Ok(())
    }

    /// Like [PeriodicTicker::set_tempo()], but validates a raw BPM first.
    /// Fails with [Error::InvalidBpm] without changing anything.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        self.set_tempo(Tempo::new_with(bpm)?)
    }

    /// Calls [Tickable::on_tick()] once.
    pub fn tick(&self) -> Result<()> {
        tick_shared(&self.tickable)
    }
}
impl<K, M: Timer> Drop for PeriodicTicker<K, M> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_shared<K: Tickable>(tickable: &Mutex<K>) -> Result<()> {
    tickable.lock().map_err(|_| Error::Poisoned)?.on_tick()
}

// Kept outside the impl so the closure's type depends only on K.
fn tick_callback<K: Tickable + Send + 'static>(
    tickable: Arc<Mutex<K>>,
    tick_error_fn: Arc<Mutex<Option<TickErrorFn>>>,
) -> TimerCallback {
    Box::new(move || {
        if let Err(e) = tick_shared(&tickable) {
            log::error!("scheduled tick failed: {e}");
            if let Ok(mut slot) = tick_error_fn.lock() {
                if let Some(report) = slot.as_mut() {
                    report(e);
                }
            }
        }
    })
}
