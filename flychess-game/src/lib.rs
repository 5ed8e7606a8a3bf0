//! Flying Chess Game Engine
//!
//! Platform-agnostic core of the Flying Chess party game: a two-player board
//! race where landing on special cells draws truth-or-dare style tasks, plus a
//! spinner-wheel variant. This crate has no UI or browser dependencies; hosts
//! plug in storage, time and task content through the [`KvStore`], [`Clock`]
//! and [`TaskSource`] traits.

pub mod board;
pub mod clock;
pub mod config;
pub mod constants;
pub mod content;
pub mod custom_modes;
pub mod engine;
pub mod kv;
pub mod mode;
pub mod player;
pub mod save;
pub mod tasks;
pub mod timing;

use anyhow::{Context, anyhow};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

// Re-export commonly used types
pub use board::{Board, BoardError, CellType, PathCell, create_board_path};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use content::{CachedTaskSource, ContentError, MemoryTaskSource, TaskDocument, TaskSource};
pub use custom_modes::{
    ConflictPolicy, CustomMode, CustomModeDraft, CustomModeKind, CustomModeRegistry, ImportError,
    ImportOutcome, RegistryError,
};
pub use engine::{
    BoardGame, EngineError, GameEvent, GamePhase, SectionKind, Tally, WheelGame, default_sections,
    resolve_target,
};
pub use kv::{KvStore, MemoryStore, StoreError};
pub use mode::GameMode;
pub use player::PlayerColor;
pub use save::{GameSaveData, SaveError, SaveStore, save_key};
pub use tasks::{CurrentTask, TaskQueue, TaskType, TaskVerdict, WinTaskOption};
pub use timing::{TimeSettings, TimeSettingsStore, TimeSuggestion};

/// Main entry point for hosts: builds games and mirrors them to storage.
pub struct GameEngine<T, K, C>
where
    T: TaskSource,
    K: KvStore + Clone,
    C: Clock + Clone,
{
    tasks: CachedTaskSource<T>,
    saves: SaveStore<K, C>,
    registry: CustomModeRegistry<K, C>,
    time_settings: TimeSettingsStore<K>,
    config: GameConfig,
    board: Board,
}

impl<T, K, C> GameEngine<T, K, C>
where
    T: TaskSource,
    K: KvStore + Clone,
    C: Clock + Clone,
{
    /// Create an engine with the default configuration and standard board.
    pub fn new(tasks: T, store: K, clock: C) -> Self {
        Self::with_config(tasks, store, clock, GameConfig::default())
    }

    pub fn with_config(tasks: T, store: K, clock: C, config: GameConfig) -> Self {
        Self {
            tasks: CachedTaskSource::new(tasks),
            saves: SaveStore::new(store.clone(), clock.clone(), &config),
            registry: CustomModeRegistry::new(store.clone(), clock, &config.namespace),
            time_settings: TimeSettingsStore::new(store, &config.namespace),
            config,
            board: Board::standard(),
        }
    }

    /// Play on `board` instead of the standard track.
    #[must_use]
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn saves(&self) -> &SaveStore<K, C> {
        &self.saves
    }

    #[must_use]
    pub const fn registry(&self) -> &CustomModeRegistry<K, C> {
        &self.registry
    }

    #[must_use]
    pub const fn time_settings(&self) -> &TimeSettingsStore<K> {
        &self.time_settings
    }

    #[must_use]
    pub const fn task_source(&self) -> &CachedTaskSource<T> {
        &self.tasks
    }

    /// Shuffled task queue for a built-in mode or a stored custom mode.
    ///
    /// # Errors
    ///
    /// Returns an error if `mode` is custom and `custom_mode_id` does not name a
    /// stored custom mode. Built-in content failures fall back silently.
    pub fn build_queue(
        &self,
        mode: GameMode,
        custom_mode_id: Option<&str>,
        language: &str,
        rng: &mut ChaCha20Rng,
    ) -> anyhow::Result<TaskQueue> {
        if mode.is_custom() {
            let id = custom_mode_id.ok_or_else(|| anyhow!("custom mode requires an id"))?;
            let custom = self
                .registry
                .get(id)
                .with_context(|| format!("unknown custom mode {id}"))?;
            return Ok(TaskQueue::shuffled(custom.tasks, rng));
        }
        Ok(TaskQueue::load(
            &self.tasks,
            mode,
            language,
            &self.config.default_language,
            rng,
        ))
    }

    /// Start a fresh board game, discarding any save for the same mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the task queue cannot be built.
    pub fn new_game(
        &self,
        mode: GameMode,
        custom_mode_id: Option<&str>,
        language: &str,
        seed: u64,
    ) -> anyhow::Result<BoardGame> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let queue = self.build_queue(mode, custom_mode_id, language, &mut rng)?;
        let mut game = BoardGame::new(mode, self.board.clone(), queue, self.config.clone(), seed)
            .with_time_settings(self.time_settings.load());
        if let Some(id) = custom_mode_id.filter(|_| mode.is_custom()) {
            game = game.with_custom_mode_id(id);
        }
        game.start().context("starting a fresh game")?;
        self.saves.clear(mode, custom_mode_id);
        Ok(game)
    }

    /// Resume the saved board game for `mode`, if a fresh save exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the save names a custom mode that no longer exists.
    pub fn resume(
        &self,
        mode: GameMode,
        custom_mode_id: Option<&str>,
        language: &str,
        seed: u64,
    ) -> anyhow::Result<Option<BoardGame>> {
        let Some(save) = self.saves.load(mode, custom_mode_id) else {
            return Ok(None);
        };
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let queue = self
            .build_queue(mode, save.custom_mode_id.as_deref(), language, &mut rng)
            .context("rebuilding the task queue for a saved game")?;
        let game = BoardGame::restore(save, self.board.clone(), queue, self.config.clone(), seed)
            .with_time_settings(self.time_settings.load());
        Ok(Some(game))
    }

    /// Mirror `game` to storage.
    ///
    /// Nothing is stored before the game leaves the start screen, and the save
    /// is dropped once the winner's task is done. Returns whether a record
    /// was written.
    pub fn sync(&self, game: &BoardGame) -> bool {
        if game.win_task_completed() {
            self.saves.clear(game.mode(), game.custom_mode_id());
            return false;
        }
        if game.phase() == GamePhase::Start {
            return false;
        }
        self.saves
            .save(game.mode(), game.custom_mode_id(), &game.snapshot())
    }

    /// Send `game` back to the start screen and drop its save.
    pub fn restart(&self, game: &mut BoardGame) {
        self.saves.clear(game.mode(), game.custom_mode_id());
        game.restart();
    }

    /// Start a spinner-wheel game. Wheel games are never persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the task queue cannot be built.
    pub fn new_wheel_game(
        &self,
        mode: GameMode,
        custom_mode_id: Option<&str>,
        language: &str,
        seed: u64,
    ) -> anyhow::Result<WheelGame> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let queue = self.build_queue(mode, custom_mode_id, language, &mut rng)?;
        Ok(WheelGame::new(queue, self.config.clone(), seed)
            .with_time_settings(self.time_settings.load()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (MemoryStore, ManualClock, GameEngine<MemoryTaskSource, MemoryStore, ManualClock>) {
        let source = MemoryTaskSource::new();
        source.insert(
            GameMode::Love,
            "zh",
            vec!["拥抱 $time".to_string(), "亲吻".to_string(), "对视 $time".to_string()],
        );
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_000);
        let config = GameConfig {
            namespace: "fc".to_string(),
            ..GameConfig::instant()
        };
        let engine = GameEngine::with_config(source, store.clone(), clock.clone(), config)
            .with_board(Board::linear(10, &[], &[]).unwrap());
        (store, clock, engine)
    }

    #[test]
    fn engine_creates_syncs_and_resumes() {
        let (store, _clock, engine) = engine();
        let mut game = engine.new_game(GameMode::Love, None, "zh", 7).unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.queue().len(), 3);

        game.roll_with(4).unwrap();
        game.run_until_idle();
        assert!(engine.sync(&game));
        assert!(store.contains_key("fc-save-love"));
        assert!(engine.saves().has_save(GameMode::Love, None));

        let resumed = engine.resume(GameMode::Love, None, "zh", 8).unwrap().expect("save exists");
        assert_eq!(resumed.position(PlayerColor::Red), 4);
        assert_eq!(resumed.current_player(), PlayerColor::Blue);
        assert!(engine.resume(GameMode::Food, None, "zh", 8).unwrap().is_none());
    }

    #[test]
    fn new_game_discards_previous_save() {
        let (store, _clock, engine) = engine();
        let mut game = engine.new_game(GameMode::Love, None, "zh", 1).unwrap();
        game.roll_with(2).unwrap();
        game.run_until_idle();
        engine.sync(&game);
        engine.new_game(GameMode::Love, None, "zh", 2).unwrap();
        assert!(!store.contains_key("fc-save-love"));
    }

    #[test]
    fn failed_new_game_keeps_existing_save() {
        let (store, _clock, engine) = engine();
        let mut game = engine.new_game(GameMode::Love, None, "zh", 1).unwrap();
        game.roll_with(2).unwrap();
        game.run_until_idle();
        assert!(engine.saves().save(GameMode::Custom, Some("gone"), &game.snapshot()));

        assert!(engine.new_game(GameMode::Custom, Some("gone"), "zh", 2).is_err());
        assert!(store.contains_key("fc-save-custom-gone"));
    }

    #[test]
    fn custom_mode_games_use_registry_tasks() {
        let (store, _clock, engine) = engine();
        let mode = engine
            .registry()
            .create(&CustomModeDraft::new("Ours", vec!["only task".to_string()]))
            .unwrap();
        let mut game = engine.new_game(GameMode::Custom, Some(&mode.id), "zh", 3).unwrap();
        assert_eq!(game.queue().iter().collect::<Vec<_>>(), vec!["only task"]);
        assert_eq!(game.custom_mode_id(), Some(mode.id.as_str()));

        game.roll_with(1).unwrap();
        game.run_until_idle();
        engine.sync(&game);
        assert!(store.contains_key(&format!("fc-save-custom-{}", mode.id)));

        assert!(engine.new_game(GameMode::Custom, Some("missing"), "zh", 3).is_err());
        assert!(engine.new_game(GameMode::Custom, None, "zh", 3).is_err());
    }

    #[test]
    fn completing_the_win_task_drops_the_save() {
        let (store, _clock, engine) = engine();
        let mut game = engine.new_game(GameMode::Love, None, "zh", 4).unwrap();
        for value in [6, 1, 3] {
            game.roll_with(value).unwrap();
            game.run_until_idle();
            engine.sync(&game);
        }
        assert_eq!(game.winner(), Some(PlayerColor::Red));
        assert!(store.contains_key("fc-save-love"));

        game.select_win_task(1).unwrap();
        game.complete_win_task().unwrap();
        assert!(!engine.sync(&game));
        assert!(!store.contains_key("fc-save-love"));
    }

    #[test]
    fn wheel_games_share_content() {
        let (_store, _clock, engine) = engine();
        let mut wheel = engine.new_wheel_game(GameMode::Love, None, "zh", 5).unwrap();
        wheel.spin_to(0).unwrap();
        wheel.run_until_idle();
        assert!(wheel.current_task().is_some());
    }
}
