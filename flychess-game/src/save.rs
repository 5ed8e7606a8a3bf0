//! Save/resume persistence for board games, one record per mode.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::constants::{CUSTOM_KEY_FRAGMENT, SAVE_KEY_FRAGMENT};
use crate::engine::GamePhase;
use crate::kv::KvStore;
use crate::mode::GameMode;
use crate::player::PlayerColor;
use crate::tasks::{CurrentTask, TaskType, WinTaskOption};

/// Everything needed to put a board game back on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSaveData {
    pub game_state: GamePhase,
    pub game_mode: GameMode,
    pub current_player: PlayerColor,
    pub red_position: usize,
    pub blue_position: usize,
    #[serde(default)]
    pub dice_value: Option<u8>,
    #[serde(default)]
    pub current_task: Option<CurrentTask>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub winner: Option<PlayerColor>,
    #[serde(default)]
    pub win_task_options: Vec<WinTaskOption>,
    #[serde(default)]
    pub selected_win_task: Option<WinTaskOption>,
    /// Milliseconds since the Unix epoch when the record was written.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_mode_id: Option<String>,
}

impl GameSaveData {
    /// Whether either token has left the start cell.
    #[must_use]
    pub const fn has_progress(&self) -> bool {
        self.red_position > 0 || self.blue_position > 0
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
    #[error("save record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage key for a mode's save record.
#[must_use]
pub fn save_key(namespace: &str, mode: GameMode, custom_mode_id: Option<&str>) -> String {
    match (mode, custom_mode_id) {
        (GameMode::Custom, Some(id)) => {
            format!("{namespace}-{SAVE_KEY_FRAGMENT}-{CUSTOM_KEY_FRAGMENT}-{id}")
        }
        _ => format!("{namespace}-{SAVE_KEY_FRAGMENT}-{mode}"),
    }
}

/// Reads and writes [`GameSaveData`] records.
///
/// Storage is a convenience: every failure is logged and reported as "no
/// save" (reads) or ignored (writes).
#[derive(Debug, Clone)]
pub struct SaveStore<K, C> {
    store: K,
    clock: C,
    namespace: String,
    expiry_ms: u64,
}

impl<K: KvStore, C: Clock> SaveStore<K, C> {
    pub fn new(store: K, clock: C, config: &GameConfig) -> Self {
        Self {
            store,
            clock,
            namespace: config.namespace.clone(),
            expiry_ms: config.save_expiry_ms,
        }
    }

    #[must_use]
    pub fn key(&self, mode: GameMode, custom_mode_id: Option<&str>) -> String {
        save_key(&self.namespace, mode, custom_mode_id)
    }

    fn prefix(&self) -> String {
        format!("{}-{SAVE_KEY_FRAGMENT}-", self.namespace)
    }

    /// Write `snapshot` under the key for `(mode, custom_mode_id)`, stamped
    /// with the current time. Returns whether the write succeeded.
    pub fn save(
        &self,
        mode: GameMode,
        custom_mode_id: Option<&str>,
        snapshot: &GameSaveData,
    ) -> bool {
        let key = self.key(mode, custom_mode_id);
        let mut record = snapshot.clone();
        record.timestamp = self.clock.now_millis();
        match self.write(&key, &record) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to save game to {key}: {err}");
                false
            }
        }
    }

    fn write(&self, key: &str, record: &GameSaveData) -> Result<(), SaveError> {
        let json = serde_json::to_string(record)?;
        self.store
            .set(key, &json)
            .map_err(|err| SaveError::Storage(Box::new(err)))
    }

    fn read(&self, key: &str) -> Result<Option<GameSaveData>, SaveError> {
        let Some(json) = self
            .store
            .get(key)
            .map_err(|err| SaveError::Storage(Box::new(err)))?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn is_expired(&self, record: &GameSaveData) -> bool {
        self.clock.now_millis().saturating_sub(record.timestamp) >= self.expiry_ms
    }

    fn remove_key(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            log::warn!("failed to remove save {key}: {err}");
        }
    }

    /// The stored snapshot if present and younger than the expiry window.
    /// Stale records are removed as a side effect.
    #[must_use]
    pub fn load(&self, mode: GameMode, custom_mode_id: Option<&str>) -> Option<GameSaveData> {
        let key = self.key(mode, custom_mode_id);
        self.load_key(&key)
    }

    fn load_key(&self, key: &str) -> Option<GameSaveData> {
        let record = match self.read(key) {
            Ok(record) => record?,
            Err(err) => {
                log::warn!("failed to load save {key}: {err}");
                return None;
            }
        };
        if self.is_expired(&record) {
            log::debug!("save {key} expired, removing");
            self.remove_key(key);
            return None;
        }
        Some(record)
    }

    pub fn clear(&self, mode: GameMode, custom_mode_id: Option<&str>) {
        let key = self.key(mode, custom_mode_id);
        self.remove_key(&key);
    }

    /// Whether a resumable save exists: present, fresh, and at least one
    /// token has moved.
    #[must_use]
    pub fn has_save(&self, mode: GameMode, custom_mode_id: Option<&str>) -> bool {
        self.load(mode, custom_mode_id)
            .is_some_and(|record| record.has_progress())
    }

    /// Every fresh save, newest first.
    #[must_use]
    pub fn list_saves(&self) -> Vec<GameSaveData> {
        let keys = match self.store.keys_with_prefix(&self.prefix()) {
            Ok(keys) => keys,
            Err(err) => {
                log::warn!("failed to enumerate saves: {err}");
                return Vec::new();
            }
        };
        let mut saves: Vec<GameSaveData> = keys.iter().filter_map(|key| self.load_key(key)).collect();
        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        saves
    }

    /// Remove every stale save record, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let keys = match self.store.keys_with_prefix(&self.prefix()) {
            Ok(keys) => keys,
            Err(err) => {
                log::warn!("failed to enumerate saves: {err}");
                return 0;
            }
        };
        keys.iter()
            .filter(|key| {
                matches!(self.read(key), Ok(Some(record)) if self.is_expired(&record))
            })
            .map(|key| self.remove_key(key))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::MemoryStore;

    const DAY_MS: u64 = 24 * 3600 * 1000;

    fn snapshot(mode: GameMode) -> GameSaveData {
        GameSaveData {
            game_state: GamePhase::Task,
            game_mode: mode,
            current_player: PlayerColor::Blue,
            red_position: 4,
            blue_position: 0,
            dice_value: Some(4),
            current_task: Some(CurrentTask {
                description: "hug".to_string(),
                executor: PlayerColor::Red,
                target: PlayerColor::Blue,
                duration_ms: Some(15_000),
            }),
            task_type: Some(TaskType::Star),
            winner: None,
            win_task_options: Vec::new(),
            selected_win_task: None,
            timestamp: 0,
            custom_mode_id: None,
        }
    }

    fn store(clock: &ManualClock) -> (MemoryStore, SaveStore<MemoryStore, ManualClock>) {
        let kv = MemoryStore::new();
        let config = GameConfig {
            namespace: "fc".to_string(),
            ..GameConfig::default()
        };
        let saves = SaveStore::new(kv.clone(), clock.clone(), &config);
        (kv, saves)
    }

    #[test]
    fn key_scheme_matches_mode_and_custom_id() {
        assert_eq!(save_key("fc", GameMode::Love, None), "fc-save-love");
        assert_eq!(
            save_key("fc", GameMode::Custom, Some("custom-17")),
            "fc-save-custom-custom-17"
        );
        assert_eq!(save_key("fc", GameMode::Custom, None), "fc-save-custom");
        assert_eq!(save_key("fc", GameMode::Love, Some("ignored")), "fc-save-love");
    }

    #[test]
    fn load_after_save_roundtrips_modulo_timestamp() {
        let clock = ManualClock::new(5_000);
        let (_kv, saves) = store(&clock);
        let original = snapshot(GameMode::Love);
        assert!(saves.save(GameMode::Love, None, &original));
        let loaded = saves.load(GameMode::Love, None).unwrap();
        assert_eq!(loaded.timestamp, 5_000);
        assert_eq!(GameSaveData { timestamp: 0, ..loaded }, original);
    }

    #[test]
    fn expiry_boundary() {
        let clock = ManualClock::new(1_000);
        let (kv, saves) = store(&clock);
        saves.save(GameMode::Love, None, &snapshot(GameMode::Love));

        clock.set(1_000 + DAY_MS - 1);
        assert!(saves.load(GameMode::Love, None).is_some());

        clock.set(1_000 + DAY_MS + 1);
        assert!(saves.load(GameMode::Love, None).is_none());
        assert!(!kv.contains_key("fc-save-love"));
    }

    #[test]
    fn corrupt_records_read_as_absent() {
        let clock = ManualClock::new(0);
        let (kv, saves) = store(&clock);
        kv.set("fc-save-food", "{ nope").unwrap();
        assert!(saves.load(GameMode::Food, None).is_none());
    }

    #[test]
    fn storage_failures_degrade_quietly() {
        let clock = ManualClock::new(0);
        let (kv, saves) = store(&clock);
        kv.set_failing(true);
        assert!(!saves.save(GameMode::Love, None, &snapshot(GameMode::Love)));
        assert!(saves.load(GameMode::Love, None).is_none());
        assert!(!saves.has_save(GameMode::Love, None));
        saves.clear(GameMode::Love, None);
        assert!(saves.list_saves().is_empty());
    }

    #[test]
    fn has_save_requires_progress() {
        let clock = ManualClock::new(0);
        let (_kv, saves) = store(&clock);
        let mut record = snapshot(GameMode::Daily);
        record.red_position = 0;
        saves.save(GameMode::Daily, None, &record);
        assert!(!saves.has_save(GameMode::Daily, None));
        record.blue_position = 2;
        saves.save(GameMode::Daily, None, &record);
        assert!(saves.has_save(GameMode::Daily, None));
        saves.clear(GameMode::Daily, None);
        assert!(!saves.has_save(GameMode::Daily, None));
    }

    #[test]
    fn list_and_purge_scan_by_prefix() {
        let clock = ManualClock::new(0);
        let (kv, saves) = store(&clock);
        saves.save(GameMode::Love, None, &snapshot(GameMode::Love));
        clock.set(DAY_MS / 2);
        let mut custom = snapshot(GameMode::Custom);
        custom.custom_mode_id = Some("c1".to_string());
        saves.save(GameMode::Custom, Some("c1"), &custom);
        kv.set("fc-time-settings", "{}").unwrap();

        let listed = saves.list_saves();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].game_mode, GameMode::Custom);

        clock.set(DAY_MS + 10);
        assert_eq!(saves.purge_expired(), 1);
        assert!(kv.contains_key("fc-save-custom-c1"));
        assert!(kv.contains_key("fc-time-settings"));
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let json = serde_json::to_value(snapshot(GameMode::Love)).unwrap();
        assert_eq!(json["gameState"], "task");
        assert_eq!(json["redPosition"], 4);
        assert_eq!(json["currentTask"]["durationMs"], 15_000);
        assert!(json.get("customModeId").is_none());
    }
}
