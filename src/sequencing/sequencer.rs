// Copyright (c) 2024 Mike Tsao

use super::{forward, NextStepStrategy, StepDirection, Track};
use crate::{
    error::{Error, Result},
    traits::{StepExecutor, Tickable},
    types::SequencerState,
};
use derivative::Derivative;

/// Receives every state snapshot the [Sequencer] publishes.
pub type StateChangeFn<T> = Box<dyn FnMut(&SequencerState<T>) + Send>;

/// [Sequencer] owns an ordered list of [Track]s and advances all of them
/// together on each tick, using one shared [StepExecutor] and one shared
/// stepping strategy.
///
/// Every successful change (including a tick) publishes exactly one
/// [SequencerState] to the observer registered with
/// [Sequencer::on_state_change()]. There is one observer slot, and
/// registering a new observer replaces the old one. Failed calls change
/// nothing and publish nothing.
///
/// Tracks are addressed by index. Removing a track shifts every later track
/// down by one, so an index saved before a removal may name a different
/// track afterward (or none, which is [Error::IndexOutOfRange]).
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Sequencer<T, E> {
    tracks: Vec<Track<T>>,
    executor: E,

    #[derivative(Debug = "ignore")]
    next_step_strategy: NextStepStrategy<T>,

    #[derivative(Debug = "ignore")]
    state_change_fn: Option<StateChangeFn<T>>,
}
impl<T, E> Sequencer<T, E>
where
    T: Clone + 'static,
    E: StepExecutor<T>,
{
    /// Creates an empty [Sequencer] that steps forward.
    pub fn new_with(executor: E) -> Self {
        Self {
            tracks: Default::default(),
            executor,
            next_step_strategy: Box::new(forward::<T>),
            state_change_fn: None,
        }
    }

    #[allow(missing_docs)]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    #[allow(missing_docs)]
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    #[allow(missing_docs)]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[allow(missing_docs)]
    pub fn track(&self, index: usize) -> Option<&Track<T>> {
        self.tracks.get(index)
    }

    #[allow(missing_docs)]
    pub fn tracks(&self) -> &[Track<T>] {
        &self.tracks
    }

    /// A snapshot of every track. This is the same thing observers receive.
    pub fn state(&self) -> SequencerState<T> {
        SequencerState {
            tracks: self.tracks.iter().map(Track::state).collect(),
        }
    }

    /// Registers the observer, discarding any previous one. Doesn't publish.
    pub fn on_state_change(&mut self, state_change_fn: impl FnMut(&SequencerState<T>) + Send + 'static) {
        self.state_change_fn = Some(Box::new(state_change_fn));
    }

    /// Appends a track.
    pub fn add_track(
        &mut self,
        parameters: T,
        number_of_steps: usize,
        active_steps: impl IntoIterator<Item = usize>,
    ) -> Result<()> {
        let track = Track::new_with(parameters, number_of_steps, active_steps)?;
        self.tracks.push(track);
        log::debug!("added track {} with {number_of_steps} steps", self.tracks.len() - 1);
        self.update();
        Ok(())
    }

    /// Removes the track at `index`. Later tracks move down by one.
    pub fn remove_track(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.tracks.remove(index);
        log::debug!("removed track {index}");
        self.update();
        Ok(())
    }

    /// Replaces the parameters of the track at `index`.
    pub fn set_parameters(&mut self, index: usize, parameters: T) -> Result<()> {
        self.check_index(index)?;
        self.tracks[index].set_parameters(parameters);
        self.update();
        Ok(())
    }

    /// Changes the length of the track at `index`. See
    /// [Track::set_number_of_steps()] for what happens to its position.
    pub fn set_number_of_steps(&mut self, index: usize, number_of_steps: usize) -> Result<()> {
        self.check_index(index)?;
        self.tracks[index].set_number_of_steps(number_of_steps)?;
        self.update();
        Ok(())
    }

    /// Flips step `step_index` of the track at `index`.
    pub fn toggle_step(&mut self, index: usize, step_index: usize) -> Result<()> {
        self.check_index(index)?;
        self.tracks[index].toggle_step(step_index);
        self.update();
        Ok(())
    }

    /// Changes the strategy that the next [Sequencer::on_tick()] uses.
    ///
    /// The strategy isn't part of [SequencerState], so the snapshot this
    /// publishes is the same as the previous one.
    pub fn set_next_step_strategy(
        &mut self,
        strategy: impl FnMut(&mut Track<T>) -> usize + Send + 'static,
    ) {
        self.next_step_strategy = Box::new(strategy);
        self.update();
    }

    /// Shorthand for [Sequencer::set_next_step_strategy()] with a built-in.
    pub fn set_step_direction(&mut self, direction: StepDirection) {
        log::debug!("stepping {direction}");
        self.next_step_strategy = direction.strategy();
        self.update();
    }

    /// Replaces every track with ones rebuilt from `state`. Each track starts
    /// at step zero; `current` flags in the snapshot are ignored. If any
    /// incoming track has no steps, nothing is replaced.
    pub fn load(&mut self, state: SequencerState<T>) -> Result<()> {
        let tracks = state
            .tracks
            .into_iter()
            .map(Track::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.tracks = tracks;
        log::debug!("loaded {} tracks", self.tracks.len());
        self.update();
        Ok(())
    }

    /// Sends every track back to step zero.
    pub fn reset(&mut self) {
        self.tracks.iter_mut().for_each(Track::reset);
        self.update();
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.tracks.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                count: self.tracks.len(),
            })
        }
    }

    fn update(&mut self) {
        if let Some(state_change_fn) = self.state_change_fn.as_mut() {
            let state = SequencerState {
                tracks: self.tracks.iter().map(Track::state).collect(),
            };
            state_change_fn(&state);
        }
    }
}
impl<T, E> Tickable for Sequencer<T, E>
where
    T: Clone + 'static,
    E: StepExecutor<T>,
{
    /// Advances every track in index order, then publishes once. If the
    /// executor fails, the remaining tracks stay put and nothing is
    /// published.
    fn on_tick(&mut self) -> Result<()> {
        for track in self.tracks.iter_mut() {
            track.step(&mut self.executor, self.next_step_strategy.as_mut())?;
        }
        self.update();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackState;
    use std::sync::{Arc, Mutex};

    type Fired = Arc<Mutex<Vec<(&'static str, usize)>>>;

    #[derive(Debug, Default)]
    struct RecordingExecutor {
        fired: Fired,
    }
    impl StepExecutor<&'static str> for RecordingExecutor {
        fn execute(&mut self, track: &Track<&'static str>) -> anyhow::Result<()> {
            self.fired
                .lock()
                .unwrap()
                .push((*track.parameters(), track.current_step()));
            Ok(())
        }
    }

    fn observed(
        s: &mut Sequencer<&'static str, RecordingExecutor>,
    ) -> Arc<Mutex<Vec<SequencerState<&'static str>>>> {
        let states = Arc::new(Mutex::new(Vec::new()));
        let states_clone = Arc::clone(&states);
        s.on_state_change(move |state| states_clone.lock().unwrap().push(state.clone()));
        states
    }

    #[test]
    fn each_mutation_publishes_once() {
        let mut s = Sequencer::new_with(RecordingExecutor::default());
        let states = observed(&mut s);

        s.add_track("kick", 4, [0]).unwrap();
        s.add_track("snare", 4, [2]).unwrap();
        s.set_parameters(1, "clap").unwrap();
        s.set_number_of_steps(0, 8).unwrap();
        s.toggle_step(0, 4).unwrap();
        s.set_step_direction(StepDirection::Backward);
        s.on_tick().unwrap();
        s.reset();
        s.remove_track(0).unwrap();
        s.set_next_step_strategy(|t: &mut Track<&'static str>| t.current_step() + 2);
        s.toggle_step(0, 1).unwrap();
        let saved = s.state();
        s.load(saved).unwrap();

        let states = states.lock().unwrap();
        assert_eq!(states.len(), 12);
        assert_eq!(states[1].tracks.len(), 2);
        assert_eq!(states[2].tracks[1].parameters, "clap");
        assert_eq!(states[3].tracks[0].steps.len(), 8);
        assert_eq!(states[4].tracks[0].active_steps().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(states[5], states[4], "changing strategy doesn't change state");
        assert_eq!(states[6].tracks[0].current_step(), Some(7));
        assert_eq!(states[6].tracks[1].current_step(), Some(3));
        assert_eq!(states[7].tracks[0].current_step(), Some(0));
        assert_eq!(states[8].tracks.len(), 1);
        assert_eq!(states[8].tracks[0].parameters, "clap");
        assert_eq!(states[9], states[8], "custom strategy publishes an unchanged state");
        assert_eq!(states[10].tracks[0].active_steps().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(states[11], states[10], "loading a fresh snapshot publishes it once");
    }

    #[test]
    fn failed_preconditions_change_nothing() {
        let mut s = Sequencer::new_with(RecordingExecutor::default());
        s.add_track("kick", 4, [0]).unwrap();
        let states = observed(&mut s);
        let before = s.state();

        assert!(matches!(
            s.remove_track(1),
            Err(Error::IndexOutOfRange { index: 1, count: 1 })
        ));
        assert!(matches!(
            s.set_parameters(5, "nope"),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            s.set_number_of_steps(3, 2),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(s.toggle_step(1, 0), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(
            s.set_number_of_steps(0, 0),
            Err(Error::InvalidStepCount)
        ));
        assert!(matches!(s.add_track("empty", 0, []), Err(Error::InvalidStepCount)));

        assert!(states.lock().unwrap().is_empty());
        assert_eq!(s.state(), before);
    }

    #[test]
    fn last_observer_wins() {
        let mut s = Sequencer::new_with(RecordingExecutor::default());
        let first = observed(&mut s);
        let second = observed(&mut s);
        s.add_track("kick", 4, [0]).unwrap();
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn tick_advances_tracks_in_order() {
        let mut s = Sequencer::new_with(RecordingExecutor::default());
        s.add_track("a", 2, [0, 1]).unwrap();
        s.add_track("b", 3, [1]).unwrap();
        s.add_track("c", 1, [0]).unwrap();
        s.on_tick().unwrap();
        s.on_tick().unwrap();

        assert_eq!(
            *s.executor().fired.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("c", 0), ("a", 0), ("c", 0)]
        );
    }

    #[test]
    fn load_rejects_empty_tracks_atomically() {
        let mut s = Sequencer::new_with(RecordingExecutor::default());
        s.add_track("kick", 4, [0]).unwrap();
        let mut incoming = s.state();
        incoming.tracks.push(TrackState {
            steps: vec![],
            parameters: "broken",
        });
        assert!(matches!(s.load(incoming), Err(Error::InvalidStepCount)));
        assert_eq!(s.track_count(), 1);
    }
}
