use flychess_game::{
    Board, Clock, GameConfig, GameEngine, GameMode, GamePhase, KvStore, ManualClock,
    MemoryStore, MemoryTaskSource, PlayerColor, TaskDocument, TaskVerdict, TimeSettings,
};

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

type TestEngine = GameEngine<MemoryTaskSource, MemoryStore, ManualClock>;

fn setup() -> (MemoryStore, ManualClock, TestEngine) {
    let source = MemoryTaskSource::new();
    source.insert(
        GameMode::Daily,
        "zh",
        TaskDocument::parse(include_str!("fixtures/daily.json")).unwrap(),
    );
    let store = MemoryStore::new();
    let clock = ManualClock::new(1_700_000_000_000);
    let engine = GameEngine::with_config(source, store.clone(), clock.clone(), GameConfig::instant())
        .with_board(Board::linear(12, &[3], &[5]).unwrap());
    (store, clock, engine)
}

#[test]
fn task_in_progress_survives_a_reload() {
    let (_store, _clock, engine) = setup();
    let mut game = engine.new_game(GameMode::Daily, None, "zh", 10).unwrap();
    game.roll_with(3).unwrap();
    game.run_until_idle();
    assert_eq!(game.phase(), GamePhase::Task);
    assert!(engine.sync(&game));

    let mut resumed = engine
        .resume(GameMode::Daily, None, "zh", 11)
        .unwrap()
        .expect("fresh save");
    assert_eq!(resumed.phase(), GamePhase::Task);
    assert_eq!(resumed.current_task(), game.current_task());
    assert_eq!(resumed.current_task().unwrap().executor, PlayerColor::Blue);

    resumed.resolve_task(TaskVerdict::Completed).unwrap();
    resumed.run_until_idle();
    assert_eq!(resumed.phase(), GamePhase::Playing);
    assert_eq!(resumed.current_player(), PlayerColor::Blue);
}

#[test]
fn saves_expire_after_a_day() {
    let (store, clock, engine) = setup();
    let mut game = engine.new_game(GameMode::Daily, None, "zh", 1).unwrap();
    game.roll_with(2).unwrap();
    game.run_until_idle();
    engine.sync(&game);

    clock.advance(DAY_MS - 1);
    assert!(engine.saves().has_save(GameMode::Daily, None));
    clock.advance(1);
    assert!(engine.resume(GameMode::Daily, None, "zh", 1).unwrap().is_none());
    assert!(store.get("flying-chess-save-daily").unwrap().is_none());
}

#[test]
fn every_sync_overwrites_one_record_with_a_fresh_stamp() {
    let (store, clock, engine) = setup();
    let mut game = engine.new_game(GameMode::Daily, None, "zh", 2).unwrap();
    for value in [2, 1, 2] {
        game.roll_with(value).unwrap();
        game.run_until_idle();
        clock.advance(500);
        engine.sync(&game);
    }
    let saves = engine.saves().list_saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].timestamp, clock.now_millis());
    assert_eq!(saves[0].red_position, 4);
    assert_eq!(saves[0].blue_position, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn start_screen_is_never_saved() {
    let (store, _clock, engine) = setup();
    let mut game = engine.new_game(GameMode::Daily, None, "zh", 3).unwrap();
    engine.restart(&mut game);
    assert_eq!(game.phase(), GamePhase::Start);
    assert!(!engine.sync(&game));
    assert!(store.is_empty());
}

#[test]
fn time_settings_flow_into_new_games() {
    let (store, _clock, engine) = setup();
    let mut settings = TimeSettings::default();
    settings.keyword_times.insert("深蹲".to_string(), 45);
    assert!(engine.time_settings().save(&settings));
    assert!(store.get("flying-chess-time-settings").unwrap().is_some());

    let game = engine.new_game(GameMode::Daily, None, "zh", 4).unwrap();
    assert_eq!(game.time_settings().keyword_times.get("深蹲"), Some(&45));
}

#[test]
fn unavailable_storage_never_blocks_play() {
    let (store, _clock, engine) = setup();
    store.set_failing(true);
    let mut game = engine.new_game(GameMode::Daily, None, "zh", 5).unwrap();
    game.roll_with(4).unwrap();
    game.run_until_idle();
    assert!(!engine.sync(&game));
    assert!(engine.resume(GameMode::Daily, None, "zh", 5).unwrap().is_none());
    assert_eq!(game.time_settings(), &TimeSettings::default());
}
