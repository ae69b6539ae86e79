// Copyright (c) 2024 Mike Tsao

use crate::{
    prelude::*,
    types::{u7, LiveEvent},
};
use anyhow::bail;
use bit_vec::BitVec;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Passes MIDI messages to the host, which decides where they go.
pub type MidiMessagesFn = Box<dyn FnMut(MidiChannel, MidiMessage) + Send>;

/// Provides MIDI-related utility functionality.
pub struct MidiUtils {}
impl MidiUtils {
    /// Convenience function to make a note-on [MidiMessage].
    pub fn new_note_on(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            key: u7::from_int_lossy(note),
            vel: u7::from_int_lossy(vel),
        }
    }

    /// Convenience function to make a note-off [MidiMessage].
    pub fn new_note_off(note: u8, vel: u8) -> MidiMessage {
        MidiMessage::NoteOff {
            key: u7::from_int_lossy(note),
            vel: u7::from_int_lossy(vel),
        }
    }

    /// Encodes a channel message the way it travels over a MIDI cable.
    pub fn to_bytes(channel: MidiChannel, message: MidiMessage) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(3);
        LiveEvent::Midi {
            channel: channel.into(),
            message,
        }
        .write_std(&mut bytes)?;
        Ok(bytes)
    }
}

/// Per-track parameters for [MidiStepExecutor]. Hosts with richer parameters
/// can embed one and implement `AsRef<MidiStepParameters>`.
#[derive(Builder, Clone, Debug, Derivative, Eq, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(rename_all = "kebab-case")]
pub struct MidiStepParameters {
    /// 0..=15
    #[builder(setter(into))]
    pub channel: MidiChannel,

    /// The note to play, 0..=127.
    #[derivative(Default(value = "60"))]
    pub key: u8,

    /// Note-on velocity, 0..=127.
    #[derivative(Default(value = "127"))]
    pub velocity: u8,

    /// A disabled track still steps, but stays silent.
    #[derivative(Default(value = "true"))]
    pub enabled: bool,

    /// Direction flag for [ping_pong](crate::sequencing::ping_pong).
    #[serde(default)]
    pub reversed: bool,
}
impl MidiStepParameters {
    fn check(channel: MidiChannel, key: u8, velocity: u8) -> Result<(), String> {
        if channel.0 > MidiChannel::MAX_VALUE {
            Err(format!("MIDI channel {channel} is out of range"))
        } else if key > 127 {
            Err(format!("MIDI key {key} is out of range"))
        } else if velocity > 127 {
            Err(format!("MIDI velocity {velocity} is out of range"))
        } else {
            Ok(())
        }
    }
}
impl MidiStepParametersBuilder {
    fn validate(&self) -> Result<(), String> {
        let defaults = MidiStepParameters::default();
        MidiStepParameters::check(
            self.channel.unwrap_or(defaults.channel),
            self.key.unwrap_or(defaults.key),
            self.velocity.unwrap_or(defaults.velocity),
        )
    }
}
impl AsRef<MidiStepParameters> for MidiStepParameters {
    fn as_ref(&self) -> &MidiStepParameters {
        self
    }
}
impl Reverses for MidiStepParameters {
    fn is_reversed(&self) -> bool {
        self.reversed
    }

    fn set_reversed(&mut self, is_reversed: bool) {
        self.reversed = is_reversed;
    }
}

/// A [StepExecutor] that plays a note each time a step fires.
///
/// Messages go to a host-supplied function rather than to a device, so the
/// host chooses the transport. A note that is still sounding when its step
/// fires again is released first, and [MidiStepExecutor::release_all()]
/// silences everything (call it when the transport stops).
///
/// There is no gate timer. A note holds until the same key on the same
/// channel fires again or [MidiStepExecutor::release_all()] runs, so on a
/// track with one active step it sounds for a full pattern cycle. Hosts that
/// want short notes can call [MidiStepExecutor::release_all()] from their own
/// timer, or send note-offs themselves through the messages function.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MidiStepExecutor {
    #[derivative(Debug = "ignore")]
    midi_messages_fn: MidiMessagesFn,

    // One bit per (channel, key).
    sounding: BitVec,
}
impl MidiStepExecutor {
    /// The velocity sent with every note-off.
    pub const NOTE_OFF_VELOCITY: u8 = 127;

    #[allow(missing_docs)]
    pub fn new_with(midi_messages_fn: impl FnMut(MidiChannel, MidiMessage) + Send + 'static) -> Self {
        Self {
            midi_messages_fn: Box::new(midi_messages_fn),
            sounding: BitVec::from_elem(MidiChannel::COUNT * 128, false),
        }
    }

    fn bit(channel: MidiChannel, key: u8) -> usize {
        channel.0 as usize * 128 + key as usize
    }

    /// Whether a note-on has been sent for this key without a matching
    /// note-off.
    pub fn is_sounding(&self, channel: MidiChannel, key: u8) -> bool {
        self.sounding
            .get(Self::bit(channel, key))
            .unwrap_or_default()
    }

    /// Sends note-off for every sounding note.
    pub fn release_all(&mut self) {
        let sounding: Vec<usize> = self
            .sounding
            .iter()
            .enumerate()
            .filter_map(|(i, is_sounding)| is_sounding.then_some(i))
            .collect();
        for i in sounding {
            let channel = MidiChannel((i / 128) as u8);
            let key = (i % 128) as u8;
            self.send_note_off(channel, key);
        }
    }

    fn send_note_off(&mut self, channel: MidiChannel, key: u8) {
        self.sounding.set(Self::bit(channel, key), false);
        (self.midi_messages_fn)(channel, MidiUtils::new_note_off(key, Self::NOTE_OFF_VELOCITY));
    }
}
impl<T: AsRef<MidiStepParameters>> StepExecutor<T> for MidiStepExecutor {
    fn execute(&mut self, track: &Track<T>) -> anyhow::Result<()> {
        let parameters = track.parameters().as_ref();
        if !parameters.enabled {
            return Ok(());
        }
        if let Err(e) =
            MidiStepParameters::check(parameters.channel, parameters.key, parameters.velocity)
        {
            bail!(e);
        }
        let (channel, key) = (parameters.channel, parameters.key);
        if self.is_sounding(channel, key) {
            self.send_note_off(channel, key);
        }
        self.sounding.set(Self::bit(channel, key), true);
        (self.midi_messages_fn)(channel, MidiUtils::new_note_on(key, parameters.velocity));
        Ok(())
    }
}
