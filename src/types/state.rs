// Copyright (c) 2024 Mike Tsao

//! The read-only snapshots that the sequencer publishes after every change.

use crate::error::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// One position in a track's pattern, as seen from outside the track. Steps
/// are never stored; they're computed on demand from the track's active set
/// and position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Whether reaching this step fires the executor.
    pub active: bool,
    /// Whether this is the track's current position.
    pub current: bool,
}

/// A snapshot of a single track.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackState<T> {
    /// One entry per step, in index order.
    pub steps: Vec<Step>,
    /// The host-defined payload.
    pub parameters: T,
}
impl<T> TrackState<T> {
    /// The indexes of the active steps, in ascending order.
    pub fn active_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, step)| step.active.then_some(i))
    }

    /// The index of the current step, if the track's position is in range.
    pub fn current_step(&self) -> Option<usize> {
        self.steps.iter().position(|step| step.current)
    }
}

/// A snapshot of every track, in index order. This is the shape that
/// persistence collaborators save, and that
/// [Sequencer::load()](crate::sequencing::Sequencer::load) accepts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencerState<T> {
    #[allow(missing_docs)]
    pub tracks: Vec<TrackState<T>>,
}
impl<T: Serialize> SequencerState<T> {
    /// Serializes the snapshot as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
impl<T: DeserializeOwned> SequencerState<T> {
    /// Parses a snapshot previously produced by [SequencerState::to_json()].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_field_names() {
        let state = SequencerState {
            tracks: vec![TrackState {
                steps: vec![
                    Step {
                        active: true,
                        current: false,
                    },
                    Step {
                        active: false,
                        current: true,
                    },
                ],
                parameters: 7u8,
            }],
        };
        let json = state.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"tracks":[{"steps":[{"active":true,"current":false},{"active":false,"current":true}],"parameters":7}]}"#
        );
        assert_eq!(SequencerState::<u8>::from_json(&json).unwrap(), state);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SequencerState::<u8>::from_json(r#"{"tracks":[{"steps":3}]}"#),
            Err(crate::Error::Serialization(_))
        ));
    }

    #[test]
    fn track_state_helpers() {
        let ts = TrackState {
            steps: vec![
                Step {
                    active: true,
                    current: false,
                },
                Step::default(),
                Step {
                    active: true,
                    current: true,
                },
            ],
            parameters: (),
        };
        assert_eq!(ts.active_steps().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(ts.current_step(), Some(2));

        let empty: TrackState<()> = TrackState {
            steps: vec![Step::default(); 4],
            parameters: (),
        };
        assert_eq!(empty.current_step(), None);
    }
}
