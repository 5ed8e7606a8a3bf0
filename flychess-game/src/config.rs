//! Runtime configuration shared by the engine, persistence and registry.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    COLLISION_REVEAL_MS, DEFAULT_LANGUAGE, DEFAULT_NAMESPACE, DICE_ROLL_MS, MOVE_STEP_MS,
    SAVE_EXPIRY_MS, WHEEL_SPIN_MS, WIN_TASK_OPTIONS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid game config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("win task option count must be at least 1")]
    NoWinOptions,
}

/// Host-tunable settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Prefix for every storage key written by this crate.
    pub namespace: String,
    /// Language tried when the requested task language is unavailable.
    pub default_language: String,
    pub move_step_ms: u32,
    pub dice_roll_ms: u32,
    pub collision_delay_ms: u32,
    pub wheel_spin_ms: u32,
    pub save_expiry_ms: u64,
    pub win_option_count: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            move_step_ms: MOVE_STEP_MS,
            dice_roll_ms: DICE_ROLL_MS,
            collision_delay_ms: COLLISION_REVEAL_MS,
            wheel_spin_ms: WHEEL_SPIN_MS,
            save_expiry_ms: SAVE_EXPIRY_MS,
            win_option_count: WIN_TASK_OPTIONS,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape or
    /// asks for zero win-task options.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.win_option_count == 0 {
            return Err(ConfigError::NoWinOptions);
        }
        Ok(config)
    }

    /// Configuration with every animation delay set to zero.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            move_step_ms: 0,
            dice_roll_ms: 0,
            collision_delay_ms: 0,
            wheel_spin_ms: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "moveStepMs": 120, "namespace": "test" }"#).unwrap();
        assert_eq!(config.move_step_ms, 120);
        assert_eq!(config.namespace, "test");
        assert_eq!(config.dice_roll_ms, DICE_ROLL_MS);
        assert_eq!(config.save_expiry_ms, SAVE_EXPIRY_MS);
    }

    #[test]
    fn rejects_zero_win_options() {
        let err = GameConfig::from_json(r#"{ "winOptionCount": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoWinOptions));
    }

    #[test]
    fn instant_config_has_no_delays() {
        let config = GameConfig::instant();
        assert_eq!(config.move_step_ms, 0);
        assert_eq!(config.wheel_spin_ms, 0);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    }
}
