// Copyright (c) 2024 Mike Tsao

//! Common data types used throughout the system.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{MidiChannel, MidiMessage, SequencerState, Step, Tempo, TrackState};
}

pub use {
    channels::CrossbeamChannel,
    midi::{u4, u7, LiveEvent, MidiChannel, MidiMessage},
    state::{SequencerState, Step, TrackState},
    time::Tempo,
};

mod channels;
mod midi;
mod state;
mod time;
