//! Spinner-wheel variant: no board, every spin draws a task.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::constants::MAX_IDLE_TICKS;
use crate::engine::timeline::Timeline;
use crate::engine::{EngineError, GameEvent, GamePhase, Turn, draw_task};
use crate::player::PlayerColor;
use crate::tasks::{CurrentTask, TaskQueue, TaskType, TaskVerdict};
use crate::timing::TimeSettings;

/// Outcome printed on one wheel section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Normal,
    Star,
    Trap,
}

impl SectionKind {
    #[must_use]
    pub const fn task_type(self) -> TaskType {
        match self {
            Self::Normal => TaskType::Normal,
            Self::Star => TaskType::Star,
            Self::Trap => TaskType::Trap,
        }
    }
}

/// The stock eight-section wheel.
#[must_use]
pub fn default_sections() -> Vec<SectionKind> {
    use SectionKind::{Normal, Star, Trap};
    vec![Normal, Star, Normal, Trap, Normal, Star, Normal, Trap]
}

/// Completed and failed task counts for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub completed: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settle {
    section: usize,
}

#[derive(Debug, Clone)]
pub struct WheelGame {
    sections: Vec<SectionKind>,
    queue: TaskQueue,
    settings: TimeSettings,
    config: GameConfig,
    rng: ChaCha20Rng,
    phase: GamePhase,
    turn: Turn,
    last_section: Option<usize>,
    tallies: [Tally; 2],
    timeline: Timeline<Settle>,
    events: Vec<GameEvent>,
}

const fn slot(player: PlayerColor) -> usize {
    match player {
        PlayerColor::Red => 0,
        PlayerColor::Blue => 1,
    }
}

impl WheelGame {
    /// A game on the default wheel, already past the start screen.
    #[must_use]
    pub fn new(queue: TaskQueue, config: GameConfig, seed: u64) -> Self {
        Self {
            sections: default_sections(),
            queue,
            settings: TimeSettings::default(),
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            phase: GamePhase::Playing,
            turn: Turn::default(),
            last_section: None,
            tallies: [Tally::default(); 2],
            timeline: Timeline::default(),
            events: Vec::new(),
        }
    }

    /// Swap in a custom wheel.
    ///
    /// # Errors
    ///
    /// Returns an error if `sections` is empty.
    pub fn with_sections(mut self, sections: Vec<SectionKind>) -> Result<Self, EngineError> {
        if sections.is_empty() {
            return Err(EngineError::EmptyWheel);
        }
        self.sections = sections;
        Ok(self)
    }

    #[must_use]
    pub fn with_time_settings(mut self, settings: TimeSettings) -> Self {
        self.settings = settings;
        self
    }

    fn check_can_spin(&self) -> Result<(), EngineError> {
        if self.turn.is_rolling || !self.timeline.is_empty() {
            return Err(EngineError::Busy);
        }
        if self.phase == GamePhase::Playing {
            Ok(())
        } else {
            Err(EngineError::InvalidPhase {
                action: "spin",
                phase: self.phase,
            })
        }
    }

    /// Spin to a uniformly random section.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not time to spin.
    pub fn spin(&mut self) -> Result<usize, EngineError> {
        self.check_can_spin()?;
        let section = self.rng.gen_range(0..self.sections.len());
        self.spin_to(section)?;
        Ok(section)
    }

    /// Spin to a caller-chosen section.
    ///
    /// # Errors
    ///
    /// Returns an error if it is not time to spin or `section` does not exist.
    pub fn spin_to(&mut self, section: usize) -> Result<(), EngineError> {
        self.check_can_spin()?;
        let outcome = *self
            .sections
            .get(section)
            .ok_or(EngineError::InvalidSection(section))?;
        let player = self.turn.current;
        self.turn.is_rolling = true;
        self.last_section = Some(section);
        self.phase = GamePhase::Moving;
        self.events.push(GameEvent::Spun {
            player,
            section,
            outcome,
        });
        self.timeline
            .schedule(self.config.wheel_spin_ms, Settle { section });
        Ok(())
    }

    #[must_use]
    pub fn next_delay_ms(&self) -> Option<u32> {
        self.timeline.next_delay_ms()
    }

    /// Stop the wheel and show the drawn task. Returns whether anything ran.
    pub fn tick(&mut self) -> bool {
        let Some(Settle { section }) = self.timeline.pop() else {
            return false;
        };
        self.turn.is_rolling = false;
        let task_type = self
            .sections
            .get(section)
            .map_or(TaskType::Normal, |kind| kind.task_type());
        let trigger = self.turn.current;
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
        true
    }

    pub fn run_until_idle(&mut self) -> usize {
        let mut ticks = 0;
        while ticks < MAX_IDLE_TICKS && self.tick() {
            ticks += 1;
        }
        ticks
    }

    /// Apply the judgement on the drawn task.
    ///
    /// A completed star keeps the turn with the spinner, a failed trap makes
    /// the other player sit out their next turn, and anything else passes the
    /// turn normally.
    ///
    /// # Errors
    ///
    /// Returns an error when no task is being shown.
    pub fn resolve_task(&mut self, verdict: TaskVerdict) -> Result<(), EngineError> {
        if self.phase != GamePhase::Task {
            return Err(EngineError::InvalidPhase {
                action: "resolve a task",
                phase: self.phase,
            });
        }
        let task = self
            .turn
            .current_task
            .take()
            .ok_or(EngineError::NoActiveTask)?;
        let task_type = self.turn.task_type.take().unwrap_or(TaskType::Normal);
        let tally = &mut self.tallies[slot(task.executor)];
        match verdict {
            TaskVerdict::Completed => tally.completed += 1,
            TaskVerdict::Failed => tally.failed += 1,
        }
        self.events.push(GameEvent::TaskResolved {
            task_type,
            executor: task.executor,
            verdict,
            steps: 0,
        });

        match (task_type, verdict) {
            (TaskType::Star, TaskVerdict::Completed) => {
                self.turn.clear();
                self.events.push(GameEvent::ExtraTurn {
                    player: self.turn.current,
                });
            }
            (TaskType::Trap, TaskVerdict::Failed) => {
                let skipped = self.turn.switch();
                self.events.push(GameEvent::TurnSkipped { player: skipped });
                let player = self.turn.switch();
                self.events.push(GameEvent::TurnSwitched { player });
            }
            _ => {
                let player = self.turn.switch();
                self.events.push(GameEvent::TurnSwitched { player });
            }
        }
        self.phase = GamePhase::Playing;
        Ok(())
    }

    pub fn reload_tasks(&mut self, tasks: Vec<String>) {
        self.queue.reload(tasks, &mut self.rng);
    }

    pub fn set_time_settings(&mut self, settings: TimeSettings) {
        self.settings = settings;
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
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
    pub const fn is_spinning(&self) -> bool {
        self.turn.is_rolling
    }

    /// Index of the most recent spin result.
    #[must_use]
    pub const fn last_section(&self) -> Option<usize> {
        self.last_section
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
    pub const fn tally(&self, player: PlayerColor) -> Tally {
        self.tallies[slot(player)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAR: usize = 1;
    const TRAP: usize = 3;
    const NORMAL: usize = 0;

    fn game() -> WheelGame {
        let queue = TaskQueue::from_ordered(vec!["a".to_string(), "b".to_string()]);
        WheelGame::new(queue, GameConfig::instant(), 11)
    }

    fn spin(game: &mut WheelGame, section: usize, verdict: TaskVerdict) {
        game.spin_to(section).unwrap();
        game.run_until_idle();
        game.resolve_task(verdict).unwrap();
    }

    #[test]
    fn default_wheel_layout() {
        let sections = default_sections();
        assert_eq!(sections.len(), 8);
        assert_eq!(sections.iter().filter(|s| **s == SectionKind::Star).count(), 2);
        assert_eq!(sections.iter().filter(|s| **s == SectionKind::Trap).count(), 2);
    }

    #[test]
    fn spin_waits_for_settle() {
        let queue = TaskQueue::from_ordered(vec!["a".to_string()]);
        let mut game = WheelGame::new(queue, GameConfig::default(), 1);
        game.spin_to(TRAP).unwrap();
        assert!(game.is_spinning());
        assert_eq!(game.next_delay_ms(), Some(3000));
        assert_eq!(game.spin(), Err(EngineError::Busy));
        assert!(game.tick());
        assert_eq!(game.phase(), GamePhase::Task);
        assert_eq!(game.task_type(), Some(TaskType::Trap));
    }

    #[test]
    fn executors_follow_section_kind() {
        let mut game = game();
        game.spin_to(STAR).unwrap();
        game.run_until_idle();
        assert_eq!(game.current_task().unwrap().executor, PlayerColor::Blue);
        game.resolve_task(TaskVerdict::Failed).unwrap();

        game.spin_to(NORMAL).unwrap();
        game.run_until_idle();
        assert_eq!(game.current_task().unwrap().executor, PlayerColor::Blue);
    }

    #[test]
    fn completed_star_grants_extra_turn() {
        let mut game = game();
        spin(&mut game, STAR, TaskVerdict::Completed);
        assert_eq!(game.current_player(), PlayerColor::Red);
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.tally(PlayerColor::Blue).completed, 1);
    }

    #[test]
    fn failed_trap_skips_the_next_turn() {
        let mut game = game();
        spin(&mut game, TRAP, TaskVerdict::Failed);
        assert_eq!(game.current_player(), PlayerColor::Red);
        assert_eq!(game.tally(PlayerColor::Red).failed, 1);
        assert!(game.drain_events().contains(&GameEvent::TurnSkipped {
            player: PlayerColor::Blue
        }));
    }

    #[test]
    fn other_outcomes_switch_once() {
        let mut game = game();
        spin(&mut game, NORMAL, TaskVerdict::Completed);
        assert_eq!(game.current_player(), PlayerColor::Blue);
        spin(&mut game, STAR, TaskVerdict::Failed);
        assert_eq!(game.current_player(), PlayerColor::Red);
        spin(&mut game, TRAP, TaskVerdict::Completed);
        assert_eq!(game.current_player(), PlayerColor::Blue);
    }

    #[test]
    fn rejects_bad_sections_and_empty_wheels() {
        let mut game = game();
        assert_eq!(game.spin_to(8), Err(EngineError::InvalidSection(8)));
        assert!(matches!(
            game.clone().with_sections(Vec::new()),
            Err(EngineError::EmptyWheel)
        ));
        assert!(matches!(
            game.resolve_task(TaskVerdict::Completed),
            Err(EngineError::InvalidPhase { .. })
        ));
    }
}
