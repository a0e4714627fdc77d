//! Editor configuration.

use crate::model::{ColorId, INHERITED_COLOR, PartMetadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or has wrongly typed fields.
    #[error("invalid editor configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The rotation step must be a finite, non-zero angle.
    #[error("rotation step must be finite and non-zero, got {0}")]
    InvalidRotationStep(f64),

    /// The extension used for generated part IDs must not be empty.
    #[error("part ID extension must not be empty")]
    EmptyExtension,
}

/// Tunables of the step editor. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Extension of generated part IDs (`"<base36>.<extension>"`).
    pub part_id_extension: String,
    /// Angle in degrees applied by one rotation nudge.
    pub rotation_step_degrees: f64,
    /// Author recorded on parts created by extraction.
    pub new_part_author: String,
    /// License recorded on parts created by extraction.
    pub new_part_license: String,
    /// Colour of the placement inserted in place of an extracted step.
    pub drop_color: ColorId,
    /// Most recent commands kept by the executor history. `0` disables the history.
    pub command_history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            part_id_extension: "ldr".to_string(),
            rotation_step_degrees: 90.0,
            new_part_author: "StepEditor".to_string(),
            new_part_license: "Redistributable under CCAL version 2.0 : see CAreadme.txt"
                .to_string(),
            drop_color: INHERITED_COLOR,
            command_history_limit: 1000,
        }
    }
}

impl EditorConfig {
    /// Load a configuration from JSON.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rotation_step_degrees.is_finite() || self.rotation_step_degrees == 0.0 {
            return Err(ConfigError::InvalidRotationStep(self.rotation_step_degrees));
        }
        if self.part_id_extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        Ok(())
    }

    /// Metadata for a part created by extraction.
    pub fn new_part_metadata(&self, id: &str) -> PartMetadata {
        PartMetadata {
            name: id.to_string(),
            description: id.to_string(),
            author: self.new_part_author.clone(),
            license: self.new_part_license.clone(),
            certified_bfc: true,
            ccw: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "rotation_step_degrees": 45 }"#).unwrap();

        assert_eq!(config.rotation_step_degrees, 45.0);
        assert_eq!(config.part_id_extension, "ldr");
        assert_eq!(config.drop_color, 16);
        assert_eq!(config.command_history_limit, 1000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EditorConfig::from_json_str(r#"{ "rotation_step_degrees": 0 }"#),
            Err(ConfigError::InvalidRotationStep(_))
        ));
        assert!(matches!(
            EditorConfig::from_json_str(r#"{ "part_id_extension": "" }"#),
            Err(ConfigError::EmptyExtension)
        ));
        assert!(matches!(
            EditorConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
