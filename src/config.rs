//! Configuration management for decomposition parameters
//!
//! This module provides runtime configuration loading from JSON files so
//! the pass band and per-cycle statistics can be changed without
//! recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::filter_design::FrequencyBand;
use crate::analysis::statistic::Statistic;

/// Default config location relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "assets/whisk_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub envelope: EnvelopeConfig,
}

/// Band-pass filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Lower pass-band edge in Hz
    pub band_low_hz: f64,
    /// Upper pass-band edge in Hz
    pub band_high_hz: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let band = FrequencyBand::default();
        Self {
            band_low_hz: band.low_hz,
            band_high_hz: band.high_hz,
        }
    }
}

impl FilterConfig {
    pub fn band(&self) -> FrequencyBand {
        FrequencyBand::new(self.band_low_hz, self.band_high_hz)
    }
}

/// Per-cycle statistics used for the slow variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Statistic for the amplitude envelope
    pub amplitude: Statistic,
    /// Statistic for the set-point (offset) envelope
    pub offset: Statistic,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            amplitude: Statistic::PeakToPeak,
            offset: Statistic::Midpoint,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }
}
