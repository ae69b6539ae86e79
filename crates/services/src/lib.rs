// Copyright (c) 2024 Mike Tsao

//! Wrappers that run stepseq components on their own threads and talk to
//! clients over crossbeam channels.

#![deny(missing_docs)]

/// The most commonly used imports.
pub mod prelude {
    pub use super::{
        ProvidesService, SequencerService, SequencerServiceEvent, SequencerServiceInput,
    };
}

pub use sequencer::{SequencerService, SequencerServiceEvent, SequencerServiceInput};
pub use traits::ProvidesService;

mod sequencer;
mod traits;
