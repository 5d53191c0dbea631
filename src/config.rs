// src/config.rs
use crate::error::{DeltaTError, Result};
use crate::swath::SwathOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Processing settings for a DeltaT log.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "sound_speed_correction": true, "timestamp_increment_ms": -250 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub sound_speed_correction: bool,
    /// degrees
    pub roll_bias_degrees: f64,
    /// Added to ping times before asking for a navigation pose
    pub timestamp_increment_ms: i64,
    /// Write `mra/deltaT-process.txt` while building the summary
    pub generate_process_report: bool,
}

impl ParserConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: ParserConfig = serde_json::from_str(&text)
            .map_err(|e| DeltaTError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.roll_bias_degrees.is_finite() {
            return Err(DeltaTError::Config(format!(
                "roll_bias_degrees must be finite, got {}",
                self.roll_bias_degrees
            )));
        }
        Ok(())
    }

    pub fn swath_options(&self) -> SwathOptions {
        SwathOptions {
            sound_speed_correction: self.sound_speed_correction,
            roll_bias_degrees: self.roll_bias_degrees,
        }
    }
}
