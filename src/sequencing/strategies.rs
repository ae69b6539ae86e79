// Copyright (c) 2024 Mike Tsao

//! Built-in stepping strategies.
//!
//! A strategy looks at a [Track] before it advances and returns the index it
//! should land on next. It must return an index in
//! `0..track.number_of_steps()`, and it may read or change the track's
//! parameters to remember things between ticks.

use super::Track;
use crate::{traits::Reverses, util::Rng};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A boxed stepping strategy, as held by a
/// [Sequencer](crate::sequencing::Sequencer).
pub type NextStepStrategy<T> = Box<dyn FnMut(&mut Track<T>) -> usize + Send>;

/// One step toward the end of the pattern, wrapping to the start.
pub fn forward<T>(track: &mut Track<T>) -> usize {
    (track.current_step() + 1) % track.number_of_steps()
}

/// One step toward the start of the pattern, wrapping to the end.
pub fn backward<T>(track: &mut Track<T>) -> usize {
    let n = track.number_of_steps();
    // Reduce first so a position left stale by a shrink can't underflow the
    // arithmetic or land out of range.
    (track.current_step() % n + n - 1) % n
}

/// Bounces between the ends of the pattern. The direction lives in the
/// track's parameters, so each track bounces independently.
pub fn ping_pong<T: Reverses>(track: &mut Track<T>) -> usize {
    let n = track.number_of_steps();
    if n == 1 {
        return 0;
    }
    let current = track.current_step().min(n - 1);
    let reversed = track.parameters().is_reversed();
    if (!reversed && current == n - 1) || (reversed && current == 0) {
        track.parameters_mut().set_reversed(!reversed);
    }
    if track.parameters().is_reversed() {
        current - 1
    } else {
        current + 1
    }
}

/// Returns a strategy that jumps to a uniformly random step.
pub fn random<T>(mut rng: Rng) -> impl FnMut(&mut Track<T>) -> usize + Send {
    move |track: &mut Track<T>| rng.rand_index(track.number_of_steps())
}

/// Names the built-in strategies that don't need anything from the track's
/// parameters. Handy for hosts that let the user pick a direction from a list.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StepDirection {
    #[allow(missing_docs)]
    #[default]
    Forward,
    #[allow(missing_docs)]
    Backward,
    /// A fresh, randomly seeded [Rng] each time [StepDirection::strategy()] is
    /// called.
    Random,
}
impl StepDirection {
    /// Returns the boxed strategy this name stands for.
    pub fn strategy<T: 'static>(&self) -> NextStepStrategy<T> {
        match self {
            StepDirection::Forward => Box::new(forward::<T>),
            StepDirection::Backward => Box::new(backward::<T>),
            StepDirection::Random => Box::new(random::<T>(Rng::default())),
        }
    }
}
