// Copyright (c) 2024 Mike Tsao

//! Tracks, stepping strategies, and the [Sequencer] that drives them.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        backward, forward, ping_pong, random, NextStepStrategy, Sequencer, StateChangeFn,
        StepDirection, Track,
    };
}

pub use sequencer::{Sequencer, StateChangeFn};
pub use strategies::{backward, forward, ping_pong, random, NextStepStrategy, StepDirection};
pub use track::Track;

mod sequencer;
mod strategies;
mod track;
