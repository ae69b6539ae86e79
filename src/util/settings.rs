// Copyright (c) 2024 Mike Tsao

//! Structs that hold configuration information about various parts of the
//! system. Intended to be serialized.

use crate::{error::Result, prelude::*};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// Persistent clock settings.
#[derive(Clone, Debug, Derivative, Serialize, Deserialize)]
#[derivative(Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TickerSettings {
    tempo: Tempo,

    /// Whether the ticker should start as soon as it's created.
    #[serde(default)]
    start_immediately: bool,

    #[serde(skip)]
    #[derivative(PartialEq = "ignore")]
    has_been_saved: bool,
}
impl HasSettings for TickerSettings {
    fn has_been_saved(&self) -> bool {
        self.has_been_saved
    }

    fn needs_save(&mut self) {
        self.has_been_saved = false;
    }

    fn mark_clean(&mut self) {
        self.has_been_saved = true;
    }
}
impl TickerSettings {
    #[allow(missing_docs)]
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_tempo(&mut self, tempo: Tempo) {
        if tempo != self.tempo {
            self.tempo = tempo;
            self.needs_save();
        }
    }

    #[allow(missing_docs)]
    pub fn start_immediately(&self) -> bool {
        self.start_immediately
    }

    /// Updates the field and marks the struct eligible to save.
    pub fn set_start_immediately(&mut self, start_immediately: bool) {
        if start_immediately != self.start_immediately {
            self.start_immediately = start_immediately;
            self.needs_save();
        }
    }

    /// Serializes the settings and marks them clean.
    pub fn save_to_json(&mut self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        self.mark_clean();
        Ok(json)
    }

    /// Reads settings saved by [TickerSettings::save_to_json()]. Rejects an
    /// invalid tempo.
    pub fn load_from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.mark_clean();
        Ok(settings)
    }
}
