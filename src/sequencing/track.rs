// Copyright (c) 2024 Mike Tsao

use crate::{
    error::{Error, Result},
    traits::StepExecutor,
    types::{Step, TrackState},
};
use std::collections::BTreeSet;

/// A single repeating pattern of steps.
///
/// A [Track] knows how long its pattern is, which steps are active, where it
/// is right now, and carries a host-defined parameter payload `T` that the
/// engine never looks inside.
///
/// Active steps are allowed to lie beyond the end of the pattern. They do
/// nothing until the pattern grows to include them again, which is what lets
/// a user shrink and regrow a track without losing their work.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    parameters: T,
    number_of_steps: usize,
    current_step: usize,
    active_steps: BTreeSet<usize>,
}
impl<T> Track<T> {
    /// Creates a [Track] positioned at step zero. Fails with
    /// [Error::InvalidStepCount] if `number_of_steps` is zero.
    pub fn new_with(
        parameters: T,
        number_of_steps: usize,
        active_steps: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        Self::check_number_of_steps(number_of_steps)?;
        Ok(Self {
            parameters,
            number_of_steps,
            current_step: 0,
            active_steps: active_steps.into_iter().collect(),
        })
    }

    pub(crate) fn check_number_of_steps(number_of_steps: usize) -> Result<()> {
        if number_of_steps == 0 {
            Err(Error::InvalidStepCount)
        } else {
            Ok(())
        }
    }

    #[allow(missing_docs)]
    pub fn parameters(&self) -> &T {
        &self.parameters
    }

    /// Mutable access to the payload. Strategies use this to keep their own
    /// state (for example, a direction flag) between ticks.
    pub fn parameters_mut(&mut self) -> &mut T {
        &mut self.parameters
    }

    /// Replaces the payload wholesale.
    pub fn set_parameters(&mut self, parameters: T) {
        self.parameters = parameters;
    }

    /// The length of the pattern.
    pub fn number_of_steps(&self) -> usize {
        self.number_of_steps
    }

    /// Changes the length of the pattern.
    ///
    /// The position is left alone. If the pattern shrinks below
    /// it, [Track::state()] reports no current step until the next
    /// [Track::step()] brings the position back into range.
    pub fn set_number_of_steps(&mut self, number_of_steps: usize) -> Result<()> {
        Self::check_number_of_steps(number_of_steps)?;
        self.number_of_steps = number_of_steps;
        Ok(())
    }

    /// The position reached by the most recent [Track::step()]. Normally in
    /// `0..number_of_steps()`; see [Track::set_number_of_steps()] for the
    /// exception.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    #[allow(missing_docs)]
    pub fn active_steps(&self) -> &BTreeSet<usize> {
        &self.active_steps
    }

    /// Whether step `index` fires the executor. Indexes beyond the pattern can
    /// be active.
    pub fn is_active(&self, index: usize) -> bool {
        self.active_steps.contains(&index)
    }

    /// Flips step `index` between active and inactive. There's no bounds
    /// check; see the type-level docs.
    pub fn toggle_step(&mut self, index: usize) {
        if !self.active_steps.remove(&index) {
            self.active_steps.insert(index);
        }
    }

    /// Advances to whatever step `strategy` picks, then calls `executor` if
    /// the new step is active.
    ///
    /// The strategy's answer is taken modulo the pattern length, so the
    /// position is always in range afterward. If the executor fails, the
    /// track has still moved.
    pub fn step<E, S>(&mut self, executor: &mut E, strategy: &mut S) -> Result<()>
    where
        E: StepExecutor<T> + ?Sized,
        S: FnMut(&mut Track<T>) -> usize + ?Sized,
    {
        let next = strategy(self);
        self.current_step = next % self.number_of_steps;

        if self.is_active(self.current_step) {
            executor.execute(self).map_err(Error::Executor)?;
        }
        Ok(())
    }

    /// Returns to step zero. Active steps and parameters don't change.
    pub fn reset(&mut self) {
        self.current_step = 0;
    }

    /// The [Step]s of the pattern, in index order.
    pub fn steps(&self) -> Vec<Step> {
        (0..self.number_of_steps)
            .map(|i| Step {
                active: self.is_active(i),
                current: i == self.current_step,
            })
            .collect()
    }
}
impl<T: Clone> Track<T> {
    /// A snapshot of this track.
    pub fn state(&self) -> TrackState<T> {
        TrackState {
            steps: self.steps(),
            parameters: self.parameters.clone(),
        }
    }
}
impl<T> TryFrom<TrackState<T>> for Track<T> {
    type Error = Error;

    /// Rebuilds a track from a snapshot. The position restarts at zero;
    /// `current` flags in the snapshot are ignored.
    fn try_from(value: TrackState<T>) -> Result<Self> {
        let active_steps: Vec<usize> = value.active_steps().collect();
        Self::new_with(value.parameters, value.steps.len(), active_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::{backward, forward};
    use more_asserts::assert_lt;

    #[derive(Debug, Default)]
    struct CountingExecutor {
        fired_at: Vec<usize>,
    }
    impl<T> StepExecutor<T> for CountingExecutor {
        fn execute(&mut self, track: &Track<T>) -> anyhow::Result<()> {
            self.fired_at.push(track.current_step());
            Ok(())
        }
    }

    fn track_at(current_step: usize) -> Track<()> {
        let mut t = Track::new_with((), 4, [0, 2]).unwrap();
        t.current_step = current_step;
        t
    }

    #[test]
    fn zero_steps_is_rejected() {
        assert!(matches!(
            Track::new_with((), 0, []),
            Err(Error::InvalidStepCount)
        ));

        let mut t = Track::new_with((), 3, []).unwrap();
        assert!(matches!(
            t.set_number_of_steps(0),
            Err(Error::InvalidStepCount)
        ));
        assert_eq!(t.number_of_steps(), 3, "failed resize shouldn't mutate");
    }

    #[test]
    fn forward_wraps_and_fires() {
        let mut t = track_at(3);
        let mut e = CountingExecutor::default();
        t.step(&mut e, &mut forward).unwrap();
        assert_eq!(t.current_step(), 0);
        assert_eq!(e.fired_at, vec![0]);
    }

    #[test]
    fn backward_fires() {
        let mut t = track_at(3);
        let mut e = CountingExecutor::default();
        t.step(&mut e, &mut backward).unwrap();
        assert_eq!(t.current_step(), 2);
        assert_eq!(e.fired_at, vec![2]);
    }

    #[test]
    fn inactive_steps_are_silent() {
        let mut t = track_at(0);
        let mut e = CountingExecutor::default();
        t.step(&mut e, &mut forward).unwrap();
        assert_eq!(t.current_step(), 1);
        assert!(e.fired_at.is_empty());

        (0..8).for_each(|_| t.step(&mut e, &mut forward).unwrap());
        assert_eq!(e.fired_at, vec![2, 0, 2, 0]);
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut t = Track::new_with((), 8, [1, 5]).unwrap();
        for i in [0, 1, 5, 7, 100] {
            let before = t.is_active(i);
            t.toggle_step(i);
            assert_ne!(t.is_active(i), before);
            t.toggle_step(i);
            assert_eq!(t.is_active(i), before);
        }
        assert_eq!(t.active_steps().iter().copied().collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn out_of_range_active_steps_survive_resize() {
        let mut t = Track::new_with((), 8, [1, 6]).unwrap();
        t.set_number_of_steps(4).unwrap();
        assert_eq!(
            t.steps().iter().filter(|s| s.active).count(),
            1,
            "step 6 should be inert while the pattern is short"
        );
        t.set_number_of_steps(8).unwrap();
        assert!(t.steps()[6].active, "step 6 should come back");
    }

    #[test]
    fn shrinking_defers_correction_to_next_step() {
        let mut t = Track::new_with((), 8, [0]).unwrap();
        let mut e = CountingExecutor::default();
        (0..6).for_each(|_| t.step(&mut e, &mut forward).unwrap());
        assert_eq!(t.current_step(), 6);

        t.set_number_of_steps(4).unwrap();
        assert_eq!(t.current_step(), 6, "resize doesn't clamp");
        assert!(
            t.steps().iter().all(|s| !s.current),
            "no step is current while the position is out of range"
        );

        t.step(&mut e, &mut forward).unwrap();
        assert_lt!(t.current_step(), t.number_of_steps());
        assert_eq!(t.current_step(), 3);

        // Same thing in the other direction.
        let mut t = Track::new_with((), 8, []).unwrap();
        t.current_step = 7;
        t.set_number_of_steps(3).unwrap();
        t.step(&mut e, &mut backward).unwrap();
        assert_lt!(t.current_step(), 3);
    }

    #[test]
    fn misbehaving_strategy_still_lands_in_range() {
        let mut t = Track::new_with((), 5, []).unwrap();
        let mut e = CountingExecutor::default();
        let mut wild = |_: &mut Track<()>| 1_000_003usize;
        for n in 1..12 {
            t.set_number_of_steps(n).unwrap();
            t.step(&mut e, &mut wild).unwrap();
            assert_lt!(t.current_step(), n);
        }
    }

    #[test]
    fn executor_sees_the_new_position_and_failure_propagates() {
        let mut t = Track::new_with(String::from("kick"), 4, [1]).unwrap();
        let mut seen = Vec::new();
        let mut e = |track: &Track<String>| -> anyhow::Result<()> {
            seen.push((track.parameters().clone(), track.current_step()));
            Err(anyhow::anyhow!("device unplugged"))
        };
        let r = t.step(&mut e, &mut forward);
        assert!(matches!(r, Err(Error::Executor(_))));
        assert_eq!(t.current_step(), 1, "position moves even if the executor fails");
        assert_eq!(seen, vec![(String::from("kick"), 1)]);
    }

    #[test]
    fn reset_and_state() {
        let mut t = track_at(3);
        let state = t.state();
        assert_eq!(state.steps.len(), 4);
        assert_eq!(state.current_step(), Some(3));
        assert_eq!(state.active_steps().collect::<Vec<_>>(), vec![0, 2]);

        t.reset();
        assert_eq!(t.current_step(), 0);
        assert_eq!(t.active_steps().len(), 2);
    }

    #[test]
    fn rebuild_from_state() {
        let state = track_at(3).state();
        let t = Track::try_from(state).unwrap();
        assert_eq!(t.current_step(), 0, "position isn't restored");
        assert_eq!(t.number_of_steps(), 4);
        assert!(t.is_active(0) && t.is_active(2));

        let empty = TrackState {
            steps: vec![],
            parameters: (),
        };
        assert!(matches!(
            Track::try_from(empty),
            Err(Error::InvalidStepCount)
        ));
    }
}
