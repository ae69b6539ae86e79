// Copyright (c) 2024 Mike Tsao

//! Wall-clock tempo.

use crate::error::Error;
use core::time::Duration;
use derivative::Derivative;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Beats per minute. One beat is one tick of the
/// [PeriodicTicker](crate::timing::PeriodicTicker). Always positive and
/// finite.
#[derive(Clone, Copy, Debug, Derivative, Display, PartialEq, PartialOrd, Serialize, Deserialize)]
#[derivative(Default)]
#[display(fmt = "{:0.2} BPM", _0)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tempo(#[derivative(Default(value = "120.0"))] f64);
impl Tempo {
    /// Milliseconds in a minute; the numerator of the tick interval.
    pub const MS_PER_MINUTE: f64 = 60_000.0;

    /// Returns a [Tempo], or [Error::InvalidBpm] unless `bpm` is positive,
    /// finite, and gives a nonzero interval that a [Duration] can hold.
    pub fn new_with(bpm: f64) -> Result<Self, Error> {
        if bpm.is_finite() && bpm > 0.0 && Self::interval_for(bpm).is_some() {
            Ok(Self(bpm))
        } else {
            Err(Error::InvalidBpm(bpm))
        }
    }

    fn interval_for(bpm: f64) -> Option<Duration> {
        Duration::try_from_secs_f64(Self::MS_PER_MINUTE / bpm / 1000.0)
            .ok()
            .filter(|interval| !interval.is_zero())
    }

    #[allow(missing_docs)]
    pub fn bpm(&self) -> f64 {
        self.0
    }

    /// Beats per second.
    pub fn bps(&self) -> f64 {
        self.0 / 60.0
    }

    /// The time between two ticks, `60000 / bpm` milliseconds.
    pub fn interval(&self) -> Duration {
        // new_with() already rejected anything without an interval.
        Self::interval_for(self.0).unwrap_or(Duration::MAX)
    }
}
impl TryFrom<f64> for Tempo {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new_with(value)
    }
}
impl From<Tempo> for f64 {
    fn from(value: Tempo) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_intervals() {
        assert_eq!(Tempo::default().bpm(), 120.0);
        assert_eq!(Tempo::default().interval(), Duration::from_millis(500));
        assert_eq!(
            Tempo::new_with(60.0).unwrap().interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(
            Tempo::new_with(240.0).unwrap().interval(),
            Duration::from_millis(250)
        );
        assert_eq!(Tempo::new_with(90.0).unwrap().bps(), 1.5);
    }

    #[test]
    fn invalid_tempos() {
        for bpm in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-300, f64::MIN_POSITIVE, 1e300] {
            assert!(
                matches!(Tempo::new_with(bpm), Err(Error::InvalidBpm(_))),
                "{bpm} should be rejected"
            );
        }
    }

    #[test]
    fn extreme_but_valid_tempos() {
        let slow = Tempo::new_with(0.0625).unwrap();
        assert_eq!(slow.interval(), Duration::from_secs(960));
        let fast = Tempo::new_with(60_000_000.0).unwrap();
        assert!(!fast.interval().is_zero());
        assert!(fast.interval() < Duration::from_millis(1));
        assert!(serde_json::from_str::<Tempo>("1e-300").is_err());
    }

    #[test]
    fn tempo_serde() {
        let t = Tempo::new_with(98.5).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "98.5");
        assert_eq!(serde_json::from_str::<Tempo>(&json).unwrap(), t);
        assert!(serde_json::from_str::<Tempo>("0.0").is_err());
        assert_eq!(format!("{t}"), "98.50 BPM");
    }
}
