//! The two-player board race.
//!
//! A [`BoardGame`] owns every piece of mutable game state. Player input goes
//! through [`BoardGame::roll`], [`BoardGame::resolve_task`] and the win-task
//! methods; animation progress goes through [`BoardGame::tick`], which the host
//! calls once [`BoardGame::next_delay_ms`] has elapsed.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::board::{Board, CellType};
use crate::config::GameConfig;
use crate::constants::{
    DIE_FACES, MAX_IDLE_TICKS, PENALTY_STEPS_MAX, PENALTY_STEPS_MIN, REWARD_STEPS_MAX,
    REWARD_STEPS_MIN,
};
use crate::engine::movement::{backward_path, forward_path};
use crate::engine::timeline::Timeline;
use crate::engine::{EngineError, GameEvent, GamePhase, Turn, draw_task};
use crate::mode::GameMode;
use crate::player::PlayerColor;
use crate::save::GameSaveData;
use crate::tasks::{CurrentTask, TaskQueue, TaskType, TaskVerdict, WinTaskOption};
use crate::timing::TimeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Roll,
    TaskOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BoardAction {
    SettleRoll,
    Step { player: PlayerColor, position: usize },
    Arrive { player: PlayerColor, walk: Walk },
    RevealCollision { mover: PlayerColor },
}

const fn slot(player: PlayerColor) -> usize {
    match player {
        PlayerColor::Red => 0,
        PlayerColor::Blue => 1,
    }
}

#[derive(Debug, Clone)]
pub struct BoardGame {
    mode: GameMode,
    custom_mode_id: Option<String>,
    board: Board,
    queue: TaskQueue,
    settings: TimeSettings,
    config: GameConfig,
    rng: ChaCha20Rng,
    phase: GamePhase,
    turn: Turn,
    positions: [usize; 2],
    is_moving: bool,
    winner: Option<PlayerColor>,
    win_task_options: Vec<WinTaskOption>,
    selected_win_task: Option<WinTaskOption>,
    win_task_completed: bool,
    timeline: Timeline<BoardAction>,
    events: Vec<GameEvent>,
    revision: u64,
}

impl BoardGame {
    /// A fresh game on the start screen with both tokens on cell 0.
    #[must_use]
    pub fn new(
        mode: GameMode,
        board: Board,
        queue: TaskQueue,
        config: GameConfig,
        seed: u64,
    ) -> Self {
        Self {
            mode,
            custom_mode_id: None,
            board,
            queue,
            settings: TimeSettings::default(),
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            phase: GamePhase::Start,
            turn: Turn::default(),
            positions: [0, 0],
            is_moving: false,
            winner: None,
            win_task_options: Vec::new(),
            selected_win_task: None,
            win_task_completed: false,
            timeline: Timeline::default(),
            events: Vec::new(),
            revision: 0,
        }
    }

    #[must_use]
    pub fn with_time_settings(mut self, settings: TimeSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_custom_mode_id(mut self, id: impl Into<String>) -> Self {
        self.custom_mode_id = Some(id.into());
        self
    }

    /// Rebuild a game from a save record.
    ///
    /// Records caught mid-animation come back as the same player's turn to
    /// roll, and records whose fields disagree with their phase are demoted
    /// to the nearest consistent phase.
    #[must_use]
    pub fn restore(
        save: GameSaveData,
        board: Board,
        queue: TaskQueue,
        config: GameConfig,
        seed: u64,
    ) -> Self {
        let mut game = Self::new(save.game_mode, board, queue, config, seed);
        let last = game.board.last_index();
        game.custom_mode_id = save.custom_mode_id;
        game.positions = [save.red_position.min(last), save.blue_position.min(last)];
        game.turn.current = save.current_player;
        game.phase = save.game_state;

        match save.game_state {
            GamePhase::Task => match (save.current_task, save.task_type) {
                (Some(task), Some(task_type)) => {
                    game.turn.dice_value = save.dice_value;
                    game.turn.current_task = Some(task);
                    game.turn.task_type = Some(task_type);
                }
                _ => {
                    log::debug!("save in task state without a task, resuming as playing");
                    game.phase = GamePhase::Playing;
                }
            },
            GamePhase::Win | GamePhase::WinTask => {
                if let Some(winner) = save.winner {
                    game.winner = Some(winner);
                    game.win_task_options = save.win_task_options;
                    if game.win_task_options.is_empty() {
                        game.win_task_options = game
                            .queue
                            .generate_win_options(game.config.win_option_count, &mut game.rng);
                    }
                    game.selected_win_task = save.selected_win_task;
                    if game.selected_win_task.is_none() {
                        game.phase = GamePhase::Win;
                    }
                } else {
                    log::debug!("save in win state without a winner, resuming as playing");
                    game.phase = GamePhase::Playing;
                }
            }
            GamePhase::Moving => {
                log::debug!("save caught mid-move, resuming as playing");
                game.phase = GamePhase::Playing;
            }
            GamePhase::Start | GamePhase::Playing => {}
        }
        game
    }

    /// The persisted view of this game. The timestamp is left at zero for the
    /// save store to stamp.
    #[must_use]
    pub fn snapshot(&self) -> GameSaveData {
        GameSaveData {
            game_state: self.phase,
            game_mode: self.mode,
            current_player: self.turn.current,
            red_position: self.positions[slot(PlayerColor::Red)],
            blue_position: self.positions[slot(PlayerColor::Blue)],
            dice_value: self.turn.dice_value,
            current_task: self.turn.current_task.clone(),
            task_type: self.turn.task_type,
            winner: self.winner,
            win_task_options: self.win_task_options.clone(),
            selected_win_task: self.selected_win_task.clone(),
            timestamp: 0,
            custom_mode_id: self.custom_mode_id.clone(),
        }
    }

    fn expect_phase(&self, phase: GamePhase, action: &'static str) -> Result<(), EngineError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(EngineError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Leave the start screen.
    ///
    /// # Errors
    ///
    /// Returns an error unless the game is on the start screen.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.expect_phase(GamePhase::Start, "start")?;
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::Started);
        self.bump();
        Ok(())
    }

    fn check_can_roll(&self) -> Result<(), EngineError> {
        if self.turn.is_rolling || self.is_moving || !self.timeline.is_empty() {
            return Err(EngineError::Busy);
        }
        self.expect_phase(GamePhase::Playing, "roll")
    }

    /// Roll the die for the current player and start the move.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not time to roll.
    pub fn roll(&mut self) -> Result<u8, EngineError> {
        self.check_can_roll()?;
        let value = self.rng.gen_range(1..=DIE_FACES);
        self.roll_with(value)?;
        Ok(value)
    }

    /// Like [`BoardGame::roll`] with a die value chosen by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not time to roll or `value` is not a face
    /// of the die.
    pub fn roll_with(&mut self, value: u8) -> Result<(), EngineError> {
        self.check_can_roll()?;
        if !(1..=DIE_FACES).contains(&value) {
            return Err(EngineError::InvalidRoll(value));
        }
        let player = self.turn.current;
        self.turn.dice_value = Some(value);
        self.turn.is_rolling = true;
        self.phase = GamePhase::Moving;
        self.events.push(GameEvent::Rolled { player, value });
        self.timeline
            .schedule(self.config.dice_roll_ms, BoardAction::SettleRoll);
        self.bump();
        Ok(())
    }

    /// Milliseconds the host should wait before the next [`BoardGame::tick`],
    /// or `None` when nothing is animating.
    #[must_use]
    pub fn next_delay_ms(&self) -> Option<u32> {
        self.timeline.next_delay_ms()
    }

    /// Run the next pending animation action. Returns whether one ran.
    pub fn tick(&mut self) -> bool {
        let Some(action) = self.timeline.pop() else {
            return false;
        };
        match action {
            BoardAction::SettleRoll => {
                self.turn.is_rolling = false;
                let player = self.turn.current;
                let steps = usize::from(self.turn.dice_value.unwrap_or(0));
                let path = forward_path(self.position(player), steps, self.board.last_index());
                self.walk(player, path, Walk::Roll);
            }
            BoardAction::Step { player, position } => self.step(player, position),
            BoardAction::Arrive { player, walk } => {
                self.is_moving = false;
                match walk {
                    Walk::Roll => self.land(player),
                    Walk::TaskOutcome if self.position(player) == self.board.last_index() => {
                        self.declare_winner(player);
                    }
                    Walk::TaskOutcome => self.end_turn(),
                }
            }
            BoardAction::RevealCollision { mover } => self.assign_task(TaskType::Collision, mover),
        }
        self.bump();
        true
    }

    /// Run every pending action without waiting, returning how many ran.
    ///
    /// Hosts use this to skip an animation; tests and simulations use it to
    /// play without delays.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        while ticks < MAX_IDLE_TICKS && self.tick() {
            ticks += 1;
        }
        if !self.timeline.is_empty() {
            log::warn!(
                "timeline still has {} actions after {ticks} ticks",
                self.timeline.len()
            );
        }
        ticks
    }

    fn walk(&mut self, player: PlayerColor, path: Vec<usize>, walk: Walk) {
        self.is_moving = true;
        self.phase = GamePhase::Moving;
        for position in path {
            self.timeline
                .schedule(self.config.move_step_ms, BoardAction::Step { player, position });
        }
        self.timeline.schedule(0, BoardAction::Arrive { player, walk });
    }

    fn step(&mut self, player: PlayerColor, position: usize) {
        let last = self.board.last_index();
        let previous = self.positions[slot(player)];
        self.positions[slot(player)] = position;
        self.events.push(GameEvent::Stepped { player, position });
        if previous == last && position < last {
            self.events.push(GameEvent::Bounced { player });
        }
    }

    // Collision beats victory beats star beats trap beats plain.
    fn land(&mut self, player: PlayerColor) {
        let position = self.position(player);
        if self.board.is_interior(position) && self.position(player.opponent()) == position {
            log::debug!("{player} collided at cell {position}");
            self.events.push(GameEvent::Collision {
                mover: player,
                position,
            });
            self.timeline.schedule(
                self.config.collision_delay_ms,
                BoardAction::RevealCollision { mover: player },
            );
            return;
        }
        if position == self.board.last_index() {
            self.declare_winner(player);
            return;
        }
        match self.board.cell_type(position) {
            Some(CellType::Star) => self.assign_task(TaskType::Star, player),
            Some(CellType::Trap) => self.assign_task(TaskType::Trap, player),
            _ => self.end_turn(),
        }
    }

    fn assign_task(&mut self, task_type: TaskType, trigger: PlayerColor) {
        let task = draw_task(
            &mut self.queue,
            &self.settings,
            &mut self.rng,
            task_type,
            trigger,
        );
        self.events.push(GameEvent::TaskAssigned {
            task_type,
            executor: task.executor,
            target: task.target,
        });
        self.turn.current_task = Some(task);
        self.turn.task_type = Some(task_type);
        self.phase = GamePhase::Task;
    }

    fn end_turn(&mut self) {
        let player = self.turn.switch();
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::TurnSwitched { player });
    }

    fn declare_winner(&mut self, player: PlayerColor) {
        log::info!("{player} reached the end of the board");
        self.winner = Some(player);
        self.win_task_options = self
            .queue
            .generate_win_options(self.config.win_option_count, &mut self.rng);
        self.selected_win_task = None;
        self.win_task_completed = false;
        self.turn.is_rolling = false;
        self.turn.current_task = None;
        self.turn.task_type = None;
        self.is_moving = false;
        self.phase = GamePhase::Win;
        self.events.push(GameEvent::Won { player });
    }

    /// Apply the judgement on the active task.
    ///
    /// Stars and traps move the executor: forward 0 to 3 cells on success
    /// (bouncing off the end), back 3 to 6 cells on failure. A failed
    /// collision sends the executor home. The turn then passes on.
    ///
    /// # Errors
    ///
    /// Returns an error when no task is being shown.
    pub fn resolve_task(&mut self, verdict: TaskVerdict) -> Result<(), EngineError> {
        self.expect_phase(GamePhase::Task, "resolve a task")?;
        let task = self
            .turn
            .current_task
            .take()
            .ok_or(EngineError::NoActiveTask)?;
        let task_type = self.turn.task_type.take().unwrap_or(TaskType::Normal);
        let executor = task.executor;
        let from = self.position(executor);
        let last = self.board.last_index();

        let (steps, path) = match (task_type, verdict) {
            (TaskType::Star | TaskType::Trap, TaskVerdict::Completed) => {
                let steps = self.rng.gen_range(REWARD_STEPS_MIN..=REWARD_STEPS_MAX);
                (steps, forward_path(from, steps, last))
            }
            (TaskType::Star | TaskType::Trap, TaskVerdict::Failed) => {
                let steps = self.rng.gen_range(PENALTY_STEPS_MIN..=PENALTY_STEPS_MAX);
                (steps, backward_path(from, steps))
            }
            (TaskType::Collision, TaskVerdict::Failed) => (from, Vec::new()),
            (TaskType::Collision | TaskType::Normal, _) => (0, Vec::new()),
        };
        self.events.push(GameEvent::TaskResolved {
            task_type,
            executor,
            verdict,
            steps,
        });

        if task_type == TaskType::Collision && verdict == TaskVerdict::Failed {
            self.positions[slot(executor)] = 0;
            self.events.push(GameEvent::SentHome { player: executor });
        }
        if path.is_empty() {
            self.end_turn();
        } else {
            self.walk(executor, path, Walk::TaskOutcome);
        }
        self.bump();
        Ok(())
    }

    /// Pick one of the offered win tasks by id.
    ///
    /// # Errors
    ///
    /// Returns an error outside the win screen, once the win task is done, or
    /// for an id that was not offered.
    pub fn select_win_task(&mut self, id: usize) -> Result<(), EngineError> {
        self.expect_phase(GamePhase::Win, "choose a win task")?;
        if self.win_task_completed {
            return Err(EngineError::WinTaskDone);
        }
        let option = self
            .win_task_options
            .iter()
            .find(|option| option.id == id)
            .cloned()
            .ok_or(EngineError::UnknownWinTask(id))?;
        self.selected_win_task = Some(option);
        self.phase = GamePhase::WinTask;
        self.events.push(GameEvent::WinTaskSelected { id });
        self.bump();
        Ok(())
    }

    /// Mark the chosen win task done and return to the win screen.
    ///
    /// # Errors
    ///
    /// Returns an error unless a win task is being shown.
    pub fn complete_win_task(&mut self) -> Result<(), EngineError> {
        self.expect_phase(GamePhase::WinTask, "complete the win task")?;
        self.win_task_completed = true;
        self.phase = GamePhase::Win;
        self.events.push(GameEvent::WinTaskCompleted);
        self.bump();
        Ok(())
    }

    /// Back to the start screen with both tokens home. Allowed from any phase.
    pub fn restart(&mut self) {
        self.timeline.cancel();
        self.turn = Turn::default();
        self.positions = [0, 0];
        self.is_moving = false;
        self.winner = None;
        self.win_task_options.clear();
        self.selected_win_task = None;
        self.win_task_completed = false;
        self.phase = GamePhase::Start;
        self.events.push(GameEvent::Restarted);
        self.bump();
    }

    /// Replace the task queue with a reshuffled list.
    pub fn reload_tasks(&mut self, tasks: Vec<String>) {
        self.queue.reload(tasks, &mut self.rng);
        self.bump();
    }

    pub fn set_time_settings(&mut self, settings: TimeSettings) {
        self.settings = settings;
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn custom_mode_id(&self) -> Option<&str> {
        self.custom_mode_id.as_deref()
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    #[must_use]
    pub const fn time_settings(&self) -> &TimeSettings {
        &self.settings
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn current_player(&self) -> PlayerColor {
        self.turn.current
    }

    #[must_use]
    pub const fn position(&self, player: PlayerColor) -> usize {
        self.positions[slot(player)]
    }

    #[must_use]
    pub const fn dice_value(&self) -> Option<u8> {
        self.turn.dice_value
    }

    #[must_use]
    pub const fn is_rolling(&self) -> bool {
        self.turn.is_rolling
    }

    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Whether an animation is pending.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.timeline.is_empty()
    }

    #[must_use]
    pub const fn current_task(&self) -> Option<&CurrentTask> {
        self.turn.current_task.as_ref()
    }

    #[must_use]
    pub const fn task_type(&self) -> Option<TaskType> {
        self.turn.task_type
    }

    #[must_use]
    pub const fn winner(&self) -> Option<PlayerColor> {
        self.winner
    }

    #[must_use]
    pub fn win_task_options(&self) -> &[WinTaskOption] {
        &self.win_task_options
    }

    #[must_use]
    pub const fn selected_win_task(&self) -> Option<&WinTaskOption> {
        self.selected_win_task.as_ref()
    }

    #[must_use]
    pub const fn win_task_completed(&self) -> bool {
        self.win_task_completed
    }

    /// Counter bumped on every state change, for hosts that persist lazily.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}
