// Copyright (c) 2024 Mike Tsao

//! The errors that the engine reports to its host.

use thiserror::Error;

/// Everything that can go wrong inside the engine. Precondition failures
/// ([Error::IndexOutOfRange], [Error::InvalidStepCount], [Error::InvalidBpm])
/// are detected before anything is mutated or published.
#[derive(Debug, Error)]
pub enum Error {
    /// A track-addressed operation named a track that doesn't exist.
    #[error("track index {index} is out of range (there are {count} tracks)")]
    IndexOutOfRange {
        /// The index the caller asked for.
        index: usize,
        /// How many tracks existed at the time.
        count: usize,
    },

    /// A track can't have zero steps.
    #[error("a track must have at least one step")]
    InvalidStepCount,

    /// Tempo must be positive and finite.
    #[error("{0} is not a valid BPM")]
    InvalidBpm(f64),

    /// The step executor failed. Tracks after the failing one were not
    /// advanced during that tick.
    #[error("step executor failed: {0}")]
    Executor(#[source] anyhow::Error),

    /// A previous tick panicked while holding the shared tickable.
    #[error("the tickable's lock was poisoned")]
    Poisoned,

    /// A state snapshot couldn't be converted to or from JSON.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Shorthand for results carrying an engine [Error].
pub type Result<T, E = Error> = core::result::Result<T, E>;
