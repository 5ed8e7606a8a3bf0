use anyhow::{Context, Result, bail};
use flychess_game::{
    GameConfig, GameEngine, GameEvent, GameMode, GamePhase, ManualClock, MemoryStore, PlayerColor,
    TaskType, TaskVerdict,
};
use serde::Serialize;

use crate::content::DirTaskSource;
use crate::logic::policy::VerdictStrategy;

pub type TesterEngine = GameEngine<DirTaskSource, MemoryStore, ManualClock>;

/// Fixed wall-clock start for every simulated session.
pub const SIMULATION_EPOCH_MS: u64 = 1_700_000_000_000;

/// Configuration for a simulated board game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub mode: GameMode,
    pub strategy: VerdictStrategy,
    pub max_rolls: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(mode: GameMode, strategy: VerdictStrategy, seed: u64) -> Self {
        Self {
            seed,
            mode,
            strategy,
            max_rolls: 500,
        }
    }

    #[must_use]
    pub const fn with_max_rolls(mut self, max_rolls: u32) -> Self {
        self.max_rolls = max_rolls;
        self
    }
}

/// What happened over one simulated game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameMetrics {
    pub rolls: u32,
    pub winner: Option<PlayerColor>,
    pub stalled: bool,
    pub collisions: u32,
    pub stars: u32,
    pub traps: u32,
    pub bounces: u32,
    pub sent_home: u32,
    pub tasks_completed: u32,
    pub tasks_failed: u32,
}

impl GameMetrics {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Rolled { .. } => self.rolls += 1,
            GameEvent::Bounced { .. } => self.bounces += 1,
            GameEvent::SentHome { .. } => self.sent_home += 1,
            GameEvent::TaskAssigned { task_type, .. } => match task_type {
                TaskType::Star => self.stars += 1,
                TaskType::Trap => self.traps += 1,
                TaskType::Collision => self.collisions += 1,
                TaskType::Normal => {}
            },
            GameEvent::TaskResolved { verdict, .. } => match verdict {
                TaskVerdict::Completed => self.tasks_completed += 1,
                TaskVerdict::Failed => self.tasks_failed += 1,
            },
            GameEvent::Won { player } => self.winner = Some(*player),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: GameMode,
    pub strategy: VerdictStrategy,
    pub final_positions: [usize; 2],
    pub save_cleared: bool,
    pub metrics: GameMetrics,
}

/// Builds engines over the task directory and plays games through them.
#[derive(Debug, Clone)]
pub struct GameTester {
    tasks: DirTaskSource,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(tasks: DirTaskSource, verbose: bool) -> Self {
        Self { tasks, verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// A fresh engine with instant animations over in-memory storage.
    #[must_use]
    pub fn engine(&self) -> (TesterEngine, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(SIMULATION_EPOCH_MS);
        let engine = GameEngine::with_config(
            self.tasks.clone(),
            store.clone(),
            clock.clone(),
            GameConfig::instant(),
        );
        (engine, store, clock)
    }

    /// Play one game to the end of its win task, or until the roll cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects a move the policy made in a
    /// legal phase, or the game reaches a phase automated play cannot handle.
    pub fn simulate(&self, config: &SimulationConfig) -> Result<SimulationSummary> {
        let (engine, _store, _clock) = self.engine();
        let language = engine.config().default_language.clone();
        let mut game = engine
            .new_game(config.mode, None, &language, config.seed)
            .context("starting simulated game")?;
        let mut policy = config.strategy.create_policy(config.seed);
        let mut metrics = GameMetrics::default();

        while game.winner().is_none() {
            if metrics.rolls >= config.max_rolls {
                metrics.stalled = true;
                log::warn!(
                    "seed {} ({}) hit the {} roll cap",
                    config.seed,
                    policy.name(),
                    config.max_rolls
                );
                break;
            }
            match game.phase() {
                GamePhase::Playing => {
                    game.roll().context("rolling the die")?;
                }
                GamePhase::Task => {
                    let (Some(task_type), Some(task)) = (game.task_type(), game.current_task())
                    else {
                        bail!("task phase without a task");
                    };
                    let verdict = policy.judge(task_type, task);
                    game.resolve_task(verdict).context("resolving task")?;
                }
                other => bail!("automated play reached the {other} state mid-game"),
            }
            game.run_until_idle();
            engine.sync(&game);
            for event in game.drain_events() {
                metrics.record(&event);
            }
        }

        if let Some(option) = game.win_task_options().first().map(|option| option.id) {
            game.select_win_task(option).context("selecting win task")?;
            game.complete_win_task().context("completing win task")?;
            engine.sync(&game);
        }
        for event in game.drain_events() {
            metrics.record(&event);
        }

        Ok(SimulationSummary {
            seed: config.seed,
            mode: config.mode,
            strategy: config.strategy,
            final_positions: [
                game.position(PlayerColor::Red),
                game.position(PlayerColor::Blue),
            ],
            save_cleared: !engine.saves().has_save(config.mode, None),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        GameTester::new(DirTaskSource::bundled(), false)
    }

    #[test]
    fn games_run_to_a_winner() {
        let config = SimulationConfig::new(GameMode::Love, VerdictStrategy::AlwaysComplete, 3);
        let summary = tester().simulate(&config).unwrap();
        let winner = summary.metrics.winner.expect("a winner");
        let slot = match winner {
            PlayerColor::Red => 0,
            PlayerColor::Blue => 1,
        };
        assert_eq!(summary.final_positions[slot], 48);
        assert!(summary.save_cleared);
        assert!(!summary.metrics.stalled);
        assert!(summary.metrics.rolls > 0);
    }

    #[test]
    fn simulations_are_deterministic() {
        let config = SimulationConfig::new(GameMode::Daily, VerdictStrategy::CoinFlip, 99);
        let first = tester().simulate(&config).unwrap();
        let second = tester().simulate(&config).unwrap();
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.final_positions, second.final_positions);
    }

    #[test]
    fn roll_cap_marks_the_game_stalled() {
        let config =
            SimulationConfig::new(GameMode::Love, VerdictStrategy::AlwaysFail, 5).with_max_rolls(2);
        let summary = tester().simulate(&config).unwrap();
        assert!(summary.metrics.stalled);
        assert_eq!(summary.metrics.winner, None);
        assert!(!summary.save_cleared);
    }

    #[test]
    fn metrics_count_task_outcomes() {
        let config = SimulationConfig::new(GameMode::Love, VerdictStrategy::AlwaysFail, 11);
        let metrics = tester().simulate(&config).unwrap().metrics;
        assert_eq!(metrics.tasks_completed, 0);
        assert_eq!(
            metrics.tasks_failed,
            metrics.stars + metrics.traps + metrics.collisions
        );
    }
}
