// Copyright (c) 2024 Mike Tsao

//! Runs a [Sequencer] and its [PeriodicTicker] on a daemon thread.

use crate::traits::ProvidesService;
use core::fmt::Debug;
use crossbeam::channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use stepseq::{prelude::*, types::CrossbeamChannel, Result};

/// The client changes the sequencer through [SequencerServiceInput]
/// messages. Tracks are addressed by index, as with [Sequencer].
#[derive(Clone, Debug)]
pub enum SequencerServiceInput<T> {
    /// Appends a track: parameters, number of steps, active steps.
    AddTrack(T, usize, Vec<usize>),

    /// Removes the track at this index.
    RemoveTrack(usize),

    /// Replaces a track's parameters.
    SetParameters(usize, T),

    /// Changes a track's length.
    SetNumberOfSteps(usize, usize),

    /// Flips one step: track index, step index.
    ToggleStep(usize, usize),

    /// Switches every track to a built-in stepping strategy.
    SetDirection(StepDirection),

    /// Changes the tempo. A running ticker restarts on the new schedule.
    SetBpm(f64),

    /// Replaces every track.
    Load(SequencerState<T>),

    /// Starts ticking. Ticks once immediately.
    Start,

    /// Stops ticking.
    Stop,

    /// The app is ready to quit, so the service should end.
    Quit,
}

/// The service reports back through [SequencerServiceEvent] messages.
#[derive(Clone, Debug)]
pub enum SequencerServiceEvent<T> {
    /// The sequencer published a new snapshot, either because of an input or
    /// because it ticked.
    StateChanged(SequencerState<T>),

    /// The ticker started or stopped.
    IsRunningChanged(bool),

    /// An input was rejected, or a tick failed. A rejected input changed
    /// nothing. A failed tick stopped at the failing track, so earlier tracks
    /// have already advanced.
    Failed(String),

    /// The service has processed [SequencerServiceInput::Quit] and is going
    /// away.
    Quit,
}

/// Wraps a [Sequencer] with a crossbeam-channels interface. The sequencer
/// ticks in real time on a [ThreadTimer].
#[derive(Debug)]
pub struct SequencerService<T> {
    inputs: CrossbeamChannel<SequencerServiceInput<T>>,
    events: CrossbeamChannel<SequencerServiceEvent<T>>,
}
impl<T> ProvidesService<SequencerServiceInput<T>, SequencerServiceEvent<T>> for SequencerService<T>
where
    T: Debug,
{
    fn sender(&self) -> &Sender<SequencerServiceInput<T>> {
        &self.inputs.sender
    }

    fn receiver(&self) -> &Receiver<SequencerServiceEvent<T>> {
        &self.events.receiver
    }
}
impl<T> SequencerService<T>
where
    T: Clone + Debug + Send + 'static,
{
    /// Spawns the daemon. If `settings` says so, it starts ticking right away.
    pub fn new_with<E>(executor: E, settings: TickerSettings) -> Self
    where
        E: StepExecutor<T> + Send + 'static,
    {
        let r = Self {
            inputs: Default::default(),
            events: Default::default(),
        };
        r.spawn_thread(executor, settings);
        r
    }

    fn spawn_thread<E>(&self, executor: E, settings: TickerSettings)
    where
        E: StepExecutor<T> + Send + 'static,
    {
        let receiver = self.inputs.receiver.clone();
        let sender = self.events.sender.clone();
        std::thread::spawn(move || {
            let mut daemon = SequencerServiceDaemon::new_with(receiver, sender, executor, settings);
            daemon.execute();
        });
    }
}

struct SequencerServiceDaemon<T, E>
where
    T: Clone + Send + 'static,
    E: StepExecutor<T> + Send + 'static,
{
    receiver: Receiver<SequencerServiceInput<T>>,
    sender: Sender<SequencerServiceEvent<T>>,
    sequencer: Arc<Mutex<Sequencer<T, E>>>,
    ticker: PeriodicTicker<Sequencer<T, E>, ThreadTimer>,
    settings: TickerSettings,
}
impl<T, E> SequencerServiceDaemon<T, E>
where
    T: Clone + Send + 'static,
    E: StepExecutor<T> + Send + 'static,
{
    fn new_with(
        receiver: Receiver<SequencerServiceInput<T>>,
        sender: Sender<SequencerServiceEvent<T>>,
        executor: E,
        settings: TickerSettings,
    ) -> Self {
        let mut sequencer = Sequencer::new_with(executor);
        let state_sender = sender.clone();
        sequencer.on_state_change(move |state| {
            let _ = state_sender.send(SequencerServiceEvent::StateChanged(state.clone()));
        });
        let sequencer = Arc::new(Mutex::new(sequencer));
        let mut ticker = PeriodicTicker::new_with(
            Arc::clone(&sequencer),
            ThreadTimer::default(),
            settings.tempo(),
        );
        let error_sender = sender.clone();
        ticker.on_tick_error(move |e| {
            let _ = error_sender.send(SequencerServiceEvent::Failed(e.to_string()));
        });
        Self {
            receiver,
            sender,
            sequencer,
            ticker,
            settings,
        }
    }

    fn execute(&mut self) {
        if self.settings.start_immediately() {
            let result = self.start();
            self.report(result);
        }
        while let Ok(input) = self.receiver.recv() {
            let result = match input {
                SequencerServiceInput::AddTrack(parameters, number_of_steps, active_steps) => self
                    .with_sequencer(|s| s.add_track(parameters, number_of_steps, active_steps)),
                SequencerServiceInput::RemoveTrack(index) => {
                    self.with_sequencer(|s| s.remove_track(index))
                }
                SequencerServiceInput::SetParameters(index, parameters) => {
                    self.with_sequencer(|s| s.set_parameters(index, parameters))
                }
                SequencerServiceInput::SetNumberOfSteps(index, number_of_steps) => {
                    self.with_sequencer(|s| s.set_number_of_steps(index, number_of_steps))
                }
                SequencerServiceInput::ToggleStep(index, step_index) => {
                    self.with_sequencer(|s| s.toggle_step(index, step_index))
                }
                SequencerServiceInput::SetDirection(direction) => self.with_sequencer(|s| {
                    s.set_step_direction(direction);
                    Ok(())
                }),
                SequencerServiceInput::SetBpm(bpm) => self.set_bpm(bpm),
                SequencerServiceInput::Load(state) => self.with_sequencer(|s| s.load(state)),
                SequencerServiceInput::Start => self.start(),
                SequencerServiceInput::Stop => {
                    self.stop();
                    Ok(())
                }
                SequencerServiceInput::Quit => {
                    log::debug!("sequencer service quitting");
                    self.stop();
                    let _ = self.sender.send(SequencerServiceEvent::Quit);
                    break;
                }
            };
            self.report(result);
        }
    }

    fn report(&self, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("sequencer service: {e}");
            let _ = self.sender.send(SequencerServiceEvent::Failed(e.to_string()));
        }
    }

    // The ticker takes the same lock on every tick, so this must never be
    // held across a ticker call.
    fn with_sequencer(&self, f: impl FnOnce(&mut Sequencer<T, E>) -> Result<()>) -> Result<()> {
        let mut sequencer = self.sequencer.lock().map_err(|_| Error::Poisoned)?;
        f(&mut sequencer)
    }

    fn start(&mut self) -> Result<()> {
        let was_running = self.ticker.is_running();
        let result = self.ticker.start();
        self.notify_if_running_changed(was_running);
        result
    }

    fn stop(&mut self) {
        let was_running = self.ticker.is_running();
        self.ticker.stop();
        self.notify_if_running_changed(was_running);
    }

    fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        let was_running = self.ticker.is_running();
        let result = self.ticker.set_bpm(bpm);
        if result.is_ok() {
            self.settings.set_tempo(self.ticker.tempo());
        }
        self.notify_if_running_changed(was_running);
        result
    }

    fn notify_if_running_changed(&self, was_running: bool) {
        let is_running = self.ticker.is_running();
        if is_running != was_running {
            let _ = self
                .sender
                .send(SequencerServiceEvent::IsRunningChanged(is_running));
        }
    }
}
