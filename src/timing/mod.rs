// Copyright (c) 2024 Mike Tsao

//! Turns wall-clock time into ticks.

/// The most commonly used imports.
pub mod prelude {
    pub use super::{ManualTimer, PeriodicTicker, ThreadTimer};
}

pub use ticker::{PeriodicTicker, TickErrorFn};
pub use timers::{ManualTimer, ThreadTimer};

mod ticker;
mod timers;
