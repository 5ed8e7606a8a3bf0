//! Built-in task categories plus the user-authored `custom` mode.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    #[default]
    Normal,
    Love,
    Couple,
    Advanced,
    Intimate,
    Mixed,
    Hetero,
    Daily,
    Food,
    Fitness,
    Creative,
    Romantic,
    Game,
    Adult,
    MasterSlaveSex,
    RoleplayOffice,
    RoleplayCampus,
    RoleplayMedical,
    Custom,
}

impl GameMode {
    /// Every mode backed by bundled task content.
    pub const BUILT_IN: [Self; 18] = [
        Self::Normal,
        Self::Love,
        Self::Couple,
        Self::Advanced,
        Self::Intimate,
        Self::Mixed,
        Self::Hetero,
        Self::Daily,
        Self::Food,
        Self::Fitness,
        Self::Creative,
        Self::Romantic,
        Self::Game,
        Self::Adult,
        Self::MasterSlaveSex,
        Self::RoleplayOffice,
        Self::RoleplayCampus,
        Self::RoleplayMedical,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Love => "love",
            Self::Couple => "couple",
            Self::Advanced => "advanced",
            Self::Intimate => "intimate",
            Self::Mixed => "mixed",
            Self::Hetero => "hetero",
            Self::Daily => "daily",
            Self::Food => "food",
            Self::Fitness => "fitness",
            Self::Creative => "creative",
            Self::Romantic => "romantic",
            Self::Game => "game",
            Self::Adult => "adult",
            Self::MasterSlaveSex => "master-slave-sex",
            Self::RoleplayOffice => "roleplay-office",
            Self::RoleplayCampus => "roleplay-campus",
            Self::RoleplayMedical => "roleplay-medical",
            Self::Custom => "custom",
        }
    }

    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::Custom.as_str() {
            return Ok(Self::Custom);
        }
        Self::BUILT_IN
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or(())
    }
}

impl From<GameMode> for String {
    fn from(value: GameMode) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_roundtrip_through_from_str() {
        for mode in GameMode::BUILT_IN {
            assert_eq!(mode.as_str().parse::<GameMode>(), Ok(mode));
        }
        assert_eq!("custom".parse::<GameMode>(), Ok(GameMode::Custom));
        assert!("unknown".parse::<GameMode>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case_names() {
        let json = serde_json::to_string(&GameMode::MasterSlaveSex).unwrap();
        assert_eq!(json, "\"master-slave-sex\"");
        let parsed: GameMode = serde_json::from_str("\"roleplay-office\"").unwrap();
        assert_eq!(parsed, GameMode::RoleplayOffice);
    }

    #[test]
    fn built_in_list_excludes_custom() {
        assert!(!GameMode::BUILT_IN.contains(&GameMode::Custom));
        assert!(GameMode::Custom.is_custom());
    }
}
