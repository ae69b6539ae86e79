// Copyright (c) 2024 Mike Tsao

#![deny(missing_docs, unused_imports, unused_variables)]
#![allow(rustdoc::private_intra_doc_links)]

//! stepseq is a multi-track step sequencer engine.
//!
//! A [Sequencer] holds any number of [Track]s, each a repeating pattern of
//! steps with its own length, active steps, and host-defined parameters. Each
//! tick moves every track to the step chosen by a pluggable strategy
//! ([forward](sequencing::forward), [backward](sequencing::backward),
//! [ping_pong](sequencing::ping_pong), [random](sequencing::random), or your
//! own), and calls your [StepExecutor] whenever a track lands on an active
//! step. After every change, the sequencer publishes a [SequencerState]
//! snapshot to a single observer.
//!
//! Ticks come from a [PeriodicTicker], which turns a [Tempo] into a schedule
//! on a [Timer](traits::Timer). Use [ThreadTimer](timing::ThreadTimer) for
//! real time and [ManualTimer](timing::ManualTimer) when a test needs to
//! control the clock.
//!
//! ```
//! use stepseq::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let played = Arc::new(Mutex::new(Vec::new()));
//! let played_clone = Arc::clone(&played);
//! let executor = move |track: &Track<&'static str>| -> anyhow::Result<()> {
//!     played_clone.lock().unwrap().push(*track.parameters());
//!     Ok(())
//! };
//! let mut sequencer = Sequencer::new_with(executor);
//! sequencer.add_track("kick", 4, [1]).unwrap();
//! sequencer.add_track("hat", 2, [0]).unwrap();
//!
//! let sequencer = Arc::new(Mutex::new(sequencer));
//! let timer = ManualTimer::default();
//! let mut ticker = PeriodicTicker::new_with(Arc::clone(&sequencer), timer.clone(), Tempo::default());
//! ticker.start().unwrap();
//! timer.advance(Tempo::default().interval());
//! assert_eq!(*played.lock().unwrap(), vec!["kick", "hat"]);
//! ```

/// A collection of imports that are useful to users of this crate. `use
/// stepseq::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        sequencing::prelude::*, timing::prelude::*, traits::prelude::*, types::prelude::*,
        util::prelude::*,
    };
    pub use crate::Error;
}

// Fundamental structures that are important enough to re-export at top level.
pub use {
    error::{Error, Result},
    sequencing::{Sequencer, Track},
    timing::PeriodicTicker,
    traits::StepExecutor,
    types::{SequencerState, Step, Tempo, TrackState},
};

pub mod error;
pub mod sequencing;
pub mod timing;
pub mod traits;
pub mod types;
pub mod util;
