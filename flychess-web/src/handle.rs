//! The `FlyingChess` object the page drives.
//!
//! The page owns rendering and timers: after every call it reads `state()`,
//! plays the cues from `drainEvents()`, and when `nextDelay()` returns a value
//! it waits that long and calls `tick()`.
use std::fmt::Display;

use flychess_game::{
    Board, BoardGame, Clock, ConflictPolicy, CurrentTask, CustomMode, CustomModeDraft,
    CustomModeKind, GameConfig, GameEngine, GameMode, GamePhase, GameSaveData, ImportOutcome,
    PlayerColor, SectionKind, Tally, TaskType, TaskVerdict, TimeSettings, WheelGame,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::content::WebTaskSource;
use crate::storage::{BrowserClock, LocalStorageStore};

type WebEngine = GameEngine<WebTaskSource, LocalStorageStore, BrowserClock>;

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn parse_mode(mode: &str) -> Result<GameMode, JsValue> {
    mode.parse()
        .map_err(|()| JsValue::from_str(&format!("unknown game mode {mode}")))
}

fn parse_tasks(tasks: JsValue) -> Result<Vec<String>, JsValue> {
    serde_wasm_bindgen::from_value(tasks).map_err(JsValue::from)
}

const fn verdict(completed: bool) -> TaskVerdict {
    if completed {
        TaskVerdict::Completed
    } else {
        TaskVerdict::Failed
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardView<'a> {
    #[serde(flatten)]
    save: GameSaveData,
    is_rolling: bool,
    is_moving: bool,
    win_task_completed: bool,
    next_delay_ms: Option<u32>,
    board: &'a Board,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WheelView<'a> {
    game_state: GamePhase,
    current_player: PlayerColor,
    is_spinning: bool,
    last_section: Option<usize>,
    current_task: Option<&'a CurrentTask>,
    task_type: Option<TaskType>,
    sections: &'a [SectionKind],
    red: Tally,
    blue: Tally,
    next_delay_ms: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportView<'a> {
    outcome: &'static str,
    mode: &'a CustomMode,
}

#[wasm_bindgen]
pub struct FlyingChess {
    engine: WebEngine,
    language: String,
    board: Option<BoardGame>,
    wheel: Option<WheelGame>,
    synced_revision: Option<u64>,
}

impl FlyingChess {
    fn board_mut(&mut self) -> Result<&mut BoardGame, JsValue> {
        self.board
            .as_mut()
            .ok_or_else(|| JsValue::from_str("no board game in progress"))
    }

    fn wheel_mut(&mut self) -> Result<&mut WheelGame, JsValue> {
        self.wheel
            .as_mut()
            .ok_or_else(|| JsValue::from_str("no wheel game in progress"))
    }

    /// Write the board game to storage if it changed since the last write.
    fn persist(&mut self) {
        if let Some(game) = &self.board {
            if self.synced_revision != Some(game.revision()) {
                self.engine.sync(game);
                self.synced_revision = Some(game.revision());
            }
        }
    }

    fn set_board(&mut self, game: BoardGame) {
        self.wheel = None;
        self.synced_revision = None;
        self.board = Some(game);
        self.persist();
    }
}

#[wasm_bindgen]
impl FlyingChess {
    /// Create the handle, optionally from a partial JSON config.
    ///
    /// # Errors
    /// Returns an error if `config_json` is not a valid config document.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FlyingChess, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(js_error)?,
            None => GameConfig::default(),
        };
        let language = config.default_language.clone();
        let engine =
            GameEngine::with_config(WebTaskSource::new(), LocalStorageStore, BrowserClock, config);
        let purged = engine.saves().purge_expired();
        if purged > 0 {
            log::info!("dropped {purged} expired saves");
        }
        Ok(Self {
            engine,
            language,
            board: None,
            wheel: None,
            synced_revision: None,
        })
    }

    #[wasm_bindgen(js_name = setLanguage)]
    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
        self.engine.task_source().clear();
    }

    /// Register a task document for a built-in mode.
    ///
    /// # Errors
    /// Returns an error for an unknown mode or a malformed document.
    #[wasm_bindgen(js_name = registerTasks)]
    pub fn register_tasks(&self, mode: &str, language: &str, json: &str) -> Result<usize, JsValue> {
        let mode = parse_mode(mode)?;
        let count = self
            .engine
            .task_source()
            .inner()
            .register_json(mode, language, json)
            .map_err(js_error)?;
        self.engine.task_source().clear();
        Ok(count)
    }

    /// # Errors
    /// Returns an error for an unknown mode.
    #[wasm_bindgen(js_name = hasSave)]
    pub fn has_save(&self, mode: &str, custom_mode_id: Option<String>) -> Result<bool, JsValue> {
        let mode = parse_mode(mode)?;
        Ok(self.engine.saves().has_save(mode, custom_mode_id.as_deref()))
    }

    /// # Errors
    /// Returns an error if the saves cannot be serialized.
    #[wasm_bindgen(js_name = listSaves)]
    pub fn list_saves(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.saves().list_saves())
    }

    /// Start a board game, discarding the previous save for this mode.
    ///
    /// # Errors
    /// Returns an error for an unknown mode or a missing custom mode.
    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(
        &mut self,
        mode: &str,
        custom_mode_id: Option<String>,
        seed: u64,
    ) -> Result<(), JsValue> {
        let mode = parse_mode(mode)?;
        let game = self
            .engine
            .new_game(mode, custom_mode_id.as_deref(), &self.language, seed)
            .map_err(js_error)?;
        self.set_board(game);
        Ok(())
    }

    /// Continue the saved game for this mode. Returns `false` without a save.
    ///
    /// # Errors
    /// Returns an error for an unknown mode or a save whose custom mode is gone.
    #[wasm_bindgen(js_name = resumeGame)]
    pub fn resume_game(
        &mut self,
        mode: &str,
        custom_mode_id: Option<String>,
        seed: u64,
    ) -> Result<bool, JsValue> {
        let mode = parse_mode(mode)?;
        let resumed = self
            .engine
            .resume(mode, custom_mode_id.as_deref(), &self.language, seed)
            .map_err(js_error)?;
        let Some(game) = resumed else {
            return Ok(false);
        };
        self.set_board(game);
        Ok(true)
    }

    /// # Errors
    /// Returns an error when it is not time to roll.
    pub fn roll(&mut self) -> Result<u8, JsValue> {
        let value = self.board_mut()?.roll().map_err(js_error)?;
        self.persist();
        Ok(value)
    }

    /// Start a wheel game. Wheel games are not saved.
    ///
    /// # Errors
    /// Returns an error for an unknown mode or a missing custom mode.
    #[wasm_bindgen(js_name = newWheelGame)]
    pub fn new_wheel_game(
        &mut self,
        mode: &str,
        custom_mode_id: Option<String>,
        seed: u64,
    ) -> Result<(), JsValue> {
        let mode = parse_mode(mode)?;
        let wheel = self
            .engine
            .new_wheel_game(mode, custom_mode_id.as_deref(), &self.language, seed)
            .map_err(js_error)?;
        self.board = None;
        self.wheel = Some(wheel);
        Ok(())
    }

    /// # Errors
    /// Returns an error when it is not time to spin.
    pub fn spin(&mut self) -> Result<usize, JsValue> {
        self.wheel_mut()?.spin().map_err(js_error)
    }

    /// Milliseconds until the next `tick()`, or `undefined` when idle.
    #[wasm_bindgen(js_name = nextDelay)]
    #[must_use]
    pub fn next_delay(&self) -> Option<u32> {
        match (&self.board, &self.wheel) {
            (Some(game), _) => game.next_delay_ms(),
            (None, Some(wheel)) => wheel.next_delay_ms(),
            (None, None) => None,
        }
    }

    pub fn tick(&mut self) -> bool {
        let ran = match (&mut self.board, &mut self.wheel) {
            (Some(game), _) => game.tick(),
            (None, Some(wheel)) => wheel.tick(),
            (None, None) => false,
        };
        self.persist();
        ran
    }

    /// Finish the running animation immediately.
    #[wasm_bindgen(js_name = skipAnimation)]
    pub fn skip_animation(&mut self) -> usize {
        let ran = match (&mut self.board, &mut self.wheel) {
            (Some(game), _) => game.run_until_idle(),
            (None, Some(wheel)) => wheel.run_until_idle(),
            (None, None) => 0,
        };
        self.persist();
        ran
    }

    /// # Errors
    /// Returns an error when no task is shown.
    #[wasm_bindgen(js_name = resolveTask)]
    pub fn resolve_task(&mut self, completed: bool) -> Result<(), JsValue> {
        let verdict = verdict(completed);
        if let Some(wheel) = self.wheel.as_mut() {
            return wheel.resolve_task(verdict).map_err(js_error);
        }
        self.board_mut()?.resolve_task(verdict).map_err(js_error)?;
        self.persist();
        Ok(())
    }

    /// # Errors
    /// Returns an error outside the win screen or for an id not offered.
    #[wasm_bindgen(js_name = selectWinTask)]
    pub fn select_win_task(&mut self, id: usize) -> Result<(), JsValue> {
        self.board_mut()?.select_win_task(id).map_err(js_error)?;
        self.persist();
        Ok(())
    }

    /// # Errors
    /// Returns an error unless a win task is shown.
    #[wasm_bindgen(js_name = completeWinTask)]
    pub fn complete_win_task(&mut self) -> Result<(), JsValue> {
        self.board_mut()?.complete_win_task().map_err(js_error)?;
        self.persist();
        Ok(())
    }

    pub fn restart(&mut self) {
        if let Some(game) = self.board.as_mut() {
            self.engine.restart(game);
        }
        self.synced_revision = None;
    }

    /// Everything the page needs to draw the current game.
    ///
    /// # Errors
    /// Returns an error if the state cannot be serialized.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        if let Some(game) = &self.board {
            return to_js(&BoardView {
                save: game.snapshot(),
                is_rolling: game.is_rolling(),
                is_moving: game.is_moving(),
                win_task_completed: game.win_task_completed(),
                next_delay_ms: game.next_delay_ms(),
                board: game.board(),
            });
        }
        if let Some(wheel) = &self.wheel {
            return to_js(&WheelView {
                game_state: wheel.phase(),
                current_player: wheel.current_player(),
                is_spinning: wheel.is_spinning(),
                last_section: wheel.last_section(),
                current_task: wheel.current_task(),
                task_type: wheel.task_type(),
                sections: wheel.sections(),
                red: wheel.tally(PlayerColor::Red),
                blue: wheel.tally(PlayerColor::Blue),
                next_delay_ms: wheel.next_delay_ms(),
            });
        }
        Ok(JsValue::NULL)
    }

    /// # Errors
    /// Returns an error if the events cannot be serialized.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let events = match (&mut self.board, &mut self.wheel) {
            (Some(game), _) => game.drain_events(),
            (None, Some(wheel)) => wheel.drain_events(),
            (None, None) => Vec::new(),
        };
        to_js(&events)
    }

    /// # Errors
    /// Returns an error if the modes cannot be serialized.
    #[wasm_bindgen(js_name = listCustomModes)]
    pub fn list_custom_modes(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.registry().list())
    }

    /// # Errors
    /// Returns an error for an empty name or task list, or a storage failure.
    #[wasm_bindgen(js_name = createCustomMode)]
    pub fn create_custom_mode(
        &self,
        name: String,
        description: String,
        tasks: JsValue,
        ai: bool,
    ) -> Result<JsValue, JsValue> {
        let draft = draft(name, description, parse_tasks(tasks)?, ai);
        let mode = self.engine.registry().create(&draft).map_err(js_error)?;
        to_js(&mode)
    }

    /// Replace a custom mode; a running game on that mode picks up the new tasks.
    ///
    /// # Errors
    /// Returns an error for an invalid draft, an unknown id, or a storage failure.
    #[wasm_bindgen(js_name = updateCustomMode)]
    pub fn update_custom_mode(
        &mut self,
        id: &str,
        name: String,
        description: String,
        tasks: JsValue,
        ai: bool,
    ) -> Result<JsValue, JsValue> {
        let draft = draft(name, description, parse_tasks(tasks)?, ai);
        let mode = self.engine.registry().update(id, &draft).map_err(js_error)?;
        if let Some(game) = self.board.as_mut() {
            if game.custom_mode_id() == Some(id) {
                game.reload_tasks(mode.tasks.clone());
            }
        }
        to_js(&mode)
    }

    /// # Errors
    /// Returns an error for an unknown id or a storage failure.
    #[wasm_bindgen(js_name = deleteCustomMode)]
    pub fn delete_custom_mode(&self, id: &str) -> Result<(), JsValue> {
        let removed = self.engine.registry().delete(id).map_err(js_error)?;
        self.engine.saves().clear(GameMode::Custom, Some(&removed.id));
        Ok(())
    }

    /// # Errors
    /// Returns an error for an unknown id.
    #[wasm_bindgen(js_name = exportCustomMode)]
    pub fn export_custom_mode(&self, id: &str) -> Result<String, JsValue> {
        self.engine.registry().export(id).map_err(js_error)
    }

    /// # Errors
    /// Returns an error for a malformed document or a storage failure.
    #[wasm_bindgen(js_name = importCustomMode)]
    pub fn import_custom_mode(&self, json: &str, overwrite: bool) -> Result<JsValue, JsValue> {
        let policy = if overwrite {
            ConflictPolicy::Overwrite
        } else {
            ConflictPolicy::Skip
        };
        let outcome = self
            .engine
            .registry()
            .import(json, policy)
            .map_err(js_error)?;
        let label = match &outcome {
            ImportOutcome::Created(_) => "created",
            ImportOutcome::Overwritten(_) => "overwritten",
            ImportOutcome::Skipped(_) => "skipped",
        };
        to_js(&ImportView {
            outcome: label,
            mode: outcome.mode(),
        })
    }

    /// # Errors
    /// Returns an error if the settings cannot be serialized.
    #[wasm_bindgen(js_name = timeSettings)]
    pub fn time_settings(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.time_settings().load())
    }

    /// Store new timer settings and apply them to the running game.
    ///
    /// # Errors
    /// Returns an error if `settings` does not have the settings shape.
    #[wasm_bindgen(js_name = saveTimeSettings)]
    pub fn save_time_settings(&mut self, settings: JsValue) -> Result<bool, JsValue> {
        let settings: TimeSettings =
            serde_wasm_bindgen::from_value(settings).map_err(JsValue::from)?;
        let stored = self.engine.time_settings().save(&settings);
        self.apply_time_settings(settings);
        Ok(stored)
    }

    #[wasm_bindgen(js_name = resetTimeSettings)]
    pub fn reset_time_settings(&mut self) {
        self.engine.time_settings().reset();
        self.apply_time_settings(TimeSettings::default());
    }

    /// Preview the countdown the current settings would give `text`.
    ///
    /// # Errors
    /// Returns an error if the suggestion cannot be serialized.
    #[wasm_bindgen(js_name = suggestTime)]
    pub fn suggest_time(&self, text: &str) -> Result<JsValue, JsValue> {
        let mut rng = ChaCha20Rng::seed_from_u64(BrowserClock.now_millis());
        to_js(&self.engine.time_settings().load().suggest(text, &mut rng))
    }
}

impl FlyingChess {
    fn apply_time_settings(&mut self, settings: TimeSettings) {
        if let Some(game) = self.board.as_mut() {
            game.set_time_settings(settings.clone());
        }
        if let Some(wheel) = self.wheel.as_mut() {
            wheel.set_time_settings(settings);
        }
    }
}

fn draft(name: String, description: String, tasks: Vec<String>, ai: bool) -> CustomModeDraft {
    let kind = if ai {
        CustomModeKind::Ai
    } else {
        CustomModeKind::Custom
    };
    CustomModeDraft::new(name, tasks)
        .with_description(description)
        .with_kind(kind)
}
