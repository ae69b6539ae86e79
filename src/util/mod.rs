// Copyright (c) 2024 Mike Tsao

//! System utilities.

/// Commonly used imports.
pub mod prelude {
    pub use super::{
        MidiStepExecutor, MidiStepParameters, MidiStepParametersBuilder, Rng, TickerSettings,
    };
}

pub use midi::{
    MidiMessagesFn, MidiStepExecutor, MidiStepParameters, MidiStepParametersBuilder,
    MidiStepParametersBuilderError, MidiUtils,
};
pub use rng::Rng;
pub use settings::TickerSettings;

mod midi;
mod rng;
mod settings;
