// Copyright (c) 2024 Mike Tsao

use crate::traits::{IntervalId, Timer, TimerCallback};
use core::time::Duration;
use crossbeam::channel::{RecvTimeoutError, Sender};
use derivative::Derivative;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

/// A [Timer] backed by real time. Each interval gets its own thread, which
/// sleeps on a crossbeam channel until either the next deadline passes or the
/// interval is cleared.
///
/// Deadlines are computed from the start time rather than from the previous
/// callback, so a slow callback doesn't make the schedule drift.
///
/// [Timer::clear_interval()] signals the thread and returns without waiting
/// for it. A callback that was already due when the interval was cleared can
/// still run once afterward.
#[derive(Debug, Default)]
pub struct ThreadTimer {
    next_id: u64,
    stop_senders: HashMap<IntervalId, Sender<()>>,
}
impl Timer for ThreadTimer {
    fn set_interval(&mut self, mut callback: TimerCallback, interval: Duration) -> IntervalId {
        let interval = interval.max(Self::MIN_INTERVAL);
        let id = IntervalId(self.next_id);
        self.next_id += 1;

        let (stop_sender, stop_receiver) = crossbeam::channel::bounded::<()>(1);
        self.stop_senders.insert(id, stop_sender);

        std::thread::spawn(move || {
            let mut deadline = Instant::now() + interval;
            loop {
                match stop_receiver.recv_deadline(deadline) {
                    Err(RecvTimeoutError::Timeout) => {
                        callback();
                        deadline += interval;
                    }
                    // Either an explicit stop or the timer went away.
                    Ok(_) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        id
    }

    fn clear_interval(&mut self, id: IntervalId) {
        if let Some(stop_sender) = self.stop_senders.remove(&id) {
            let _ = stop_sender.try_send(());
        }
    }
}
impl ThreadTimer {
    /// Shorter intervals are stretched to this. A thread can't usefully
    /// sleep for less, and a zero interval would never sleep at all.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// How many intervals are currently scheduled.
    pub fn interval_count(&self) -> usize {
        self.stop_senders.len()
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
struct ScheduledInterval {
    interval: Duration,
    next_due: Duration,
    // None while the callback is running.
    #[derivative(Debug = "ignore")]
    callback: Option<TimerCallback>,
}

#[derive(Debug, Default)]
struct ManualTimerState {
    now: Duration,
    next_id: u64,
    intervals: BTreeMap<IntervalId, ScheduledInterval>,
}

/// A [Timer] whose clock only moves when [ManualTimer::advance()] is called.
/// Clones share the same clock and schedule, so a test can hand one clone to
/// a [PeriodicTicker](crate::timing::PeriodicTicker) and keep another to move
/// time forward.
#[derive(Clone, Debug, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}
impl Timer for ManualTimer {
    fn set_interval(&mut self, callback: TimerCallback, interval: Duration) -> IntervalId {
        // A zero interval would fire forever without the clock moving.
        let interval = interval.max(Duration::from_nanos(1));
        let mut state = self.lock();
        let id = IntervalId(state.next_id);
        state.next_id += 1;
        let next_due = state.now + interval;
        state.intervals.insert(
            id,
            ScheduledInterval {
                interval,
                next_due,
                callback: Some(callback),
            },
        );
        id
    }

    fn clear_interval(&mut self, id: IntervalId) {
        self.lock().intervals.remove(&id);
    }
}
impl ManualTimer {
    fn lock(&self) -> MutexGuard<'_, ManualTimerState> {
        // A callback that panicked doesn't invalidate the schedule itself.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// The period of each scheduled interval, in the order they were created.
    pub fn scheduled_intervals(&self) -> Vec<Duration> {
        self.lock().intervals.values().map(|i| i.interval).collect()
    }

    #[allow(missing_docs)]
    pub fn interval_count(&self) -> usize {
        self.lock().intervals.len()
    }

    /// Moves the clock forward by `duration`, running every callback that
    /// comes due along the way in time order. Callbacks due at the same
    /// moment run in the order their intervals were created. Returns how many
    /// callbacks ran.
    ///
    /// The lock isn't held while a callback runs, so callbacks may schedule
    /// or clear intervals.
    pub fn advance(&self, duration: Duration) -> usize {
        let target = self.now() + duration;
        let mut fired = 0;
        loop {
            let (id, callback) = {
                let mut state = self.lock();
                let due = state
                    .intervals
                    .iter()
                    .filter(|(_, i)| i.callback.is_some() && i.next_due <= target)
                    .min_by_key(|(id, i)| (i.next_due, **id))
                    .map(|(id, _)| *id);
                let Some(id) = due else {
                    state.now = target;
                    break;
                };
                let mut taken = None;
                let mut due_at = state.now;
                if let Some(scheduled) = state.intervals.get_mut(&id) {
                    due_at = scheduled.next_due;
                    scheduled.next_due += scheduled.interval;
                    taken = scheduled.callback.take();
                }
                state.now = due_at;
                (id, taken)
            };
            if let Some(mut callback) = callback {
                callback();
                fired += 1;
                if let Some(scheduled) = self.lock().intervals.get_mut(&id) {
                    scheduled.callback = Some(callback);
                }
            }
        }
        fired
    }
}
