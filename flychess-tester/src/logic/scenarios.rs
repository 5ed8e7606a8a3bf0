use anyhow::{Context, Result, ensure};
use flychess_game::constants::SAVE_EXPIRY_MS;
use flychess_game::{
    Board, ConflictPolicy, CustomModeDraft, GameEvent, GameMode, GamePhase, ImportOutcome,
    PlayerColor, TaskType, TaskVerdict, TimeSettings,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::logic::policy::VerdictStrategy;
use crate::logic::simulation::{GameTester, SimulationConfig, TesterEngine};

type ScenarioCheck = fn(&GameTester, u64) -> Result<()>;

/// A named logic check run once per seed and iteration.
#[derive(Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    check: ScenarioCheck,
}

impl TestScenario {
    pub(crate) const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        check: ScenarioCheck,
    ) -> Self {
        Self {
            key,
            name,
            description,
            check,
        }
    }

    /// # Errors
    ///
    /// Returns the first violated expectation.
    pub fn run(&self, tester: &GameTester, seed: u64) -> Result<()> {
        (self.check)(tester, seed)
    }
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario").field("key", &self.key).finish()
    }
}

#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "smoke",
            "Smoke",
            "A seeded board game plays through to a completed win task",
            smoke,
        ),
        TestScenario::new(
            "overshoot-bounce",
            "Overshoot Bounce",
            "Rolling past the end bounces back by the excess",
            overshoot_bounce,
        ),
        TestScenario::new(
            "executor-assignment",
            "Executor Assignment",
            "Stars and collisions dare the opponent, traps the mover",
            executor_assignment,
        ),
        TestScenario::new(
            "persistence-resume",
            "Persistence Resume",
            "A synced game resumes with the same positions and turn",
            persistence_resume,
        ),
        TestScenario::new(
            "save-expiry",
            "Save Expiry",
            "Saves older than the expiry window are ignored",
            save_expiry,
        ),
        TestScenario::new(
            "custom-mode-registry",
            "Custom Mode Registry",
            "Custom modes round-trip through create, export and import",
            custom_mode_registry,
        ),
        TestScenario::new(
            "wheel-turn-order",
            "Wheel Turn Order",
            "Wheel verdicts grant extra turns and skips correctly",
            wheel_turn_order,
        ),
        TestScenario::new(
            "time-inference",
            "Time Inference",
            "Timed tasks get the longest matching keyword duration",
            time_inference,
        ),
    ]
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn linear_engine(tester: &GameTester, board: Board) -> TesterEngine {
    tester.engine().0.with_board(board)
}

fn play(game: &mut flychess_game::BoardGame, value: u8) -> Result<()> {
    game.roll_with(value)
        .with_context(|| format!("rolling {value}"))?;
    game.run_until_idle();
    Ok(())
}

fn smoke(tester: &GameTester, seed: u64) -> Result<()> {
    let config = SimulationConfig::new(GameMode::Love, VerdictStrategy::CoinFlip, seed);
    let summary = tester.simulate(&config)?;
    let winner = summary
        .metrics
        .winner
        .context("game finished without a winner")?;
    let winner_pos = match winner {
        PlayerColor::Red => summary.final_positions[0],
        PlayerColor::Blue => summary.final_positions[1],
    };
    ensure!(winner_pos == 48, "winner stopped at {winner_pos}, not the end cell");
    ensure!(summary.save_cleared, "save survived the completed win task");
    Ok(())
}

fn overshoot_bounce(tester: &GameTester, seed: u64) -> Result<()> {
    let engine = linear_engine(tester, Board::linear(10, &[], &[])?);
    let mut game = engine.new_game(GameMode::Love, None, "zh", seed)?;
    play(&mut game, 6)?;
    play(&mut game, 1)?;
    game.drain_events();
    play(&mut game, 6)?;

    ensure!(
        game.position(PlayerColor::Red) == 6,
        "red should bounce back to 6, got {}",
        game.position(PlayerColor::Red)
    );
    ensure!(
        game.drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::Bounced { player: PlayerColor::Red })),
        "no bounce event"
    );
    ensure!(game.winner().is_none(), "a bounce must not win");
    ensure!(game.current_player() == PlayerColor::Blue, "turn did not pass");
    Ok(())
}

fn executor_assignment(tester: &GameTester, seed: u64) -> Result<()> {
    let engine = linear_engine(tester, Board::linear(12, &[3], &[5])?);
    let mut game = engine.new_game(GameMode::Love, None, "zh", seed)?;
    play(&mut game, 3)?;
    let task = game.current_task().context("star drew no task")?;
    ensure!(game.task_type() == Some(TaskType::Star), "cell 3 is a star");
    ensure!(task.executor == PlayerColor::Blue, "star task must go to the opponent");
    ensure!(task.target == PlayerColor::Red, "star task targets the mover");

    let mut game = engine.new_game(GameMode::Love, None, "zh", seed)?;
    play(&mut game, 5)?;
    let task = game.current_task().context("trap drew no task")?;
    ensure!(task.executor == PlayerColor::Red, "trap task must go to the mover");

    let mut game = engine.new_game(GameMode::Love, None, "zh", seed)?;
    play(&mut game, 2)?;
    play(&mut game, 2)?;
    ensure!(
        game.task_type() == Some(TaskType::Collision),
        "sharing cell 2 must collide"
    );
    let task = game.current_task().context("collision drew no task")?;
    ensure!(task.executor == PlayerColor::Red, "collision task goes to the opponent");
    game.resolve_task(TaskVerdict::Failed)?;
    game.run_until_idle();
    ensure!(
        game.position(PlayerColor::Red) == 0,
        "failed collision must send the executor home"
    );
    ensure!(game.position(PlayerColor::Blue) == 2, "mover keeps its cell");
    Ok(())
}

fn persistence_resume(tester: &GameTester, seed: u64) -> Result<()> {
    let (engine, _store, clock) = tester.engine();
    let mut game = engine.new_game(GameMode::Daily, None, "zh", seed)?;
    for _ in 0..4 {
        if game.phase() == GamePhase::Task {
            game.resolve_task(TaskVerdict::Completed)?;
        } else {
            game.roll()?;
        }
        game.run_until_idle();
        engine.sync(&game);
        clock.advance(1_000);
    }

    let resumed = engine
        .resume(GameMode::Daily, None, "zh", seed.wrapping_add(1))?
        .context("no save to resume")?;
    for player in [PlayerColor::Red, PlayerColor::Blue] {
        ensure!(
            resumed.position(player) == game.position(player),
            "{player} moved across the save"
        );
    }
    ensure!(resumed.current_player() == game.current_player(), "turn changed across the save");
    ensure!(resumed.phase() == game.phase(), "phase changed across the save");
    ensure!(
        resumed.current_task() == game.current_task(),
        "pending task was not restored"
    );
    Ok(())
}

fn save_expiry(tester: &GameTester, seed: u64) -> Result<()> {
    let (engine, _store, clock) = tester.engine();
    let mut game = engine.new_game(GameMode::Love, None, "zh", seed)?;
    game.roll()?;
    game.run_until_idle();
    ensure!(engine.sync(&game), "sync did not write");

    clock.advance(SAVE_EXPIRY_MS - 1);
    ensure!(engine.saves().has_save(GameMode::Love, None), "save expired early");
    clock.advance(1);
    ensure!(!engine.saves().has_save(GameMode::Love, None), "expired save still counts");
    ensure!(
        engine.resume(GameMode::Love, None, "zh", seed)?.is_none(),
        "expired save resumed"
    );
    Ok(())
}

fn custom_mode_registry(tester: &GameTester, seed: u64) -> Result<()> {
    let (engine, _store, clock) = tester.engine();
    let registry = engine.registry();
    let draft = CustomModeDraft::new(
        format!("Mode {seed}"),
        vec!["dance $time".to_string(), "  ".to_string(), "sing".to_string()],
    );
    let mode = registry.create(&draft)?;
    ensure!(mode.tasks.len() == 2, "blank tasks must be dropped");
    ensure!(
        registry.find_by_name(&mode.name).map(|m| m.id) == Some(mode.id.clone()),
        "lookup by name failed"
    );

    let game = engine.new_game(GameMode::Custom, Some(&mode.id), "zh", seed)?;
    ensure!(game.queue().len() == 2, "custom game uses the custom tasks");

    let exported = registry.export(&mode.id)?;
    clock.advance(5);
    let skipped = registry.import(&exported, ConflictPolicy::Skip)?;
    ensure!(matches!(skipped, ImportOutcome::Skipped(_)), "same name must be skipped");
    let overwritten = registry.import(&exported, ConflictPolicy::Overwrite)?;
    ensure!(
        matches!(&overwritten, ImportOutcome::Overwritten(m) if m.id == mode.id),
        "overwrite must keep the id"
    );

    registry.delete(&mode.id)?;
    let created = registry.import(&exported, ConflictPolicy::Skip)?;
    ensure!(matches!(created, ImportOutcome::Created(_)), "import after delete creates");
    ensure!(registry.list().len() == 1, "registry should hold one mode");
    Ok(())
}

fn wheel_turn_order(tester: &GameTester, seed: u64) -> Result<()> {
    let (engine, _store, _clock) = tester.engine();
    let mut wheel = engine.new_wheel_game(GameMode::Love, None, "zh", seed)?;

    let mut spin = |section: usize, verdict: TaskVerdict| -> Result<PlayerColor> {
        wheel.spin_to(section)?;
        wheel.run_until_idle();
        wheel.resolve_task(verdict)?;
        ensure!(wheel.phase() == GamePhase::Playing, "wheel did not return to play");
        Ok(wheel.current_player())
    };

    ensure!(spin(1, TaskVerdict::Completed)? == PlayerColor::Red, "star success keeps the turn");
    ensure!(spin(3, TaskVerdict::Failed)? == PlayerColor::Red, "trap failure skips the opponent");
    ensure!(spin(0, TaskVerdict::Completed)? == PlayerColor::Blue, "normal tasks pass the turn");
    ensure!(spin(1, TaskVerdict::Failed)? == PlayerColor::Red, "star failure passes the turn");

    // Star tasks are performed by the other player.
    let red = wheel.tally(PlayerColor::Red);
    let blue = wheel.tally(PlayerColor::Blue);
    ensure!(red.completed == 1 && red.failed == 2, "red tally {red:?}");
    ensure!(blue.completed == 1 && blue.failed == 0, "blue tally {blue:?}");
    Ok(())
}

fn time_inference(tester: &GameTester, seed: u64) -> Result<()> {
    let settings = TimeSettings::default();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let suggestion = settings.suggest("给对方按摩肩膀，然后拥抱", &mut rng);
    ensure!(suggestion.time == 120, "longest keyword should win, got {}", suggestion.time);
    ensure!(suggestion.matched_keywords.len() == 2, "both keywords should match");

    let fallback = settings.suggest("说一句情话", &mut rng);
    ensure!(
        (5..=settings.default_task_time).contains(&fallback.time),
        "fallback {} outside the default range",
        fallback.time
    );

    let (engine, _store, _clock) = tester.engine();
    let engine = engine.with_board(Board::linear(8, &[2], &[])?);
    let mode = engine
        .registry()
        .create(&CustomModeDraft::new("Timed", vec!["按摩 $time".to_string()]))?;
    let mut game = engine.new_game(GameMode::Custom, Some(&mode.id), "zh", seed)?;
    play(&mut game, 2)?;
    let task = game.current_task().context("star drew no task")?;
    ensure!(task.description == "按摩", "timer marker left in {:?}", task.description);
    ensure!(task.duration_ms == Some(120_000), "duration was {:?}", task.duration_ms);
    Ok(())
}
