// Copyright (c) 2024 Mike Tsao

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use midly::{
    live::LiveEvent,
    num::{u4, u7},
    MidiMessage,
};

/// Newtype for MIDI channel. Valid channels are 0..=15.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct MidiChannel(pub u8);
#[allow(missing_docs)]
impl MidiChannel {
    pub const MIN_VALUE: u8 = 0;
    pub const MAX_VALUE: u8 = 15; // inclusive
    pub const COUNT: usize = Self::MAX_VALUE as usize + 1;
    pub const DRUM_VALUE: u8 = 10;
    pub const DRUM: Self = Self(Self::DRUM_VALUE);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }
}
impl From<u4> for MidiChannel {
    fn from(value: u4) -> Self {
        Self(value.as_int())
    }
}
impl From<MidiChannel> for u4 {
    fn from(value: MidiChannel) -> Self {
        u4::from_int_lossy(value.0)
    }
}
