use flychess_game::{
    ContentError, GameEngine, GameMode, GamePhase, ManualClock, MemoryStore, TaskSource,
};
use flychess_web::WebTaskSource;

#[test]
fn bundled_lists_cover_both_languages() {
    let source = WebTaskSource::new();
    for language in ["zh", "en"] {
        for mode in [GameMode::Love, GameMode::Daily] {
            let tasks = source.fetch_tasks(mode, language).expect("bundled list");
            assert!(!tasks.is_empty(), "{mode} in {language}");
            assert!(tasks.iter().all(|task| !task.trim().is_empty()));
        }
    }
}

#[test]
fn unbundled_modes_report_missing() {
    let source = WebTaskSource::new();
    let err = source.fetch_tasks(GameMode::Food, "zh").unwrap_err();
    assert!(matches!(err, ContentError::Missing { mode: GameMode::Food, .. }));
    assert!(source.fetch_tasks(GameMode::Love, "fr").is_err());
}

#[test]
fn registered_lists_override_bundled_ones() {
    let source = WebTaskSource::new();
    let count = source
        .register_json(GameMode::Love, "zh", r#"{"tasks": ["one", "two"]}"#)
        .expect("valid document");
    assert_eq!(count, 2);
    assert_eq!(
        source.fetch_tasks(GameMode::Love, "zh").unwrap(),
        vec!["one".to_string(), "two".to_string()]
    );

    source
        .register_json(GameMode::Food, "en", r#"["pizza"]"#)
        .expect("bare array");
    assert_eq!(source.fetch_tasks(GameMode::Food, "en").unwrap(), vec!["pizza".to_string()]);
}

#[test]
fn malformed_documents_are_rejected() {
    let source = WebTaskSource::new();
    assert!(source.register_json(GameMode::Love, "zh", "{not json").is_err());
    assert!(!source.fetch_tasks(GameMode::Love, "zh").unwrap().is_empty());
}

#[test]
fn engine_runs_on_bundled_content() {
    let engine = GameEngine::new(WebTaskSource::new(), MemoryStore::new(), ManualClock::new(0));
    let mut game = engine
        .new_game(GameMode::Daily, None, "en", 11)
        .expect("daily content is bundled");
    assert_eq!(game.phase(), GamePhase::Playing);
    assert_eq!(game.queue().len(), 6);

    game.roll().unwrap();
    game.run_until_idle();
    assert!(engine.sync(&game));
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use flychess_game::{KvStore, SaveStore, GameConfig};
    use flychess_web::{BrowserClock, LocalStorageStore};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn local_storage_round_trips_and_scans_prefixes() {
        let store = LocalStorageStore;
        store.set("fc-test-a", "1").unwrap();
        store.set("fc-test-b", "2").unwrap();
        assert_eq!(store.get("fc-test-a").unwrap().as_deref(), Some("1"));

        let mut keys = store.keys_with_prefix("fc-test-").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["fc-test-a".to_string(), "fc-test-b".to_string()]);

        store.remove("fc-test-a").unwrap();
        store.remove("fc-test-b").unwrap();
        assert_eq!(store.get("fc-test-a").unwrap(), None);
    }

    #[wasm_bindgen_test]
    fn browser_clock_is_past_2020() {
        use flychess_game::Clock;
        assert!(BrowserClock.now_millis() > 1_577_836_800_000);
    }

    #[wasm_bindgen_test]
    fn save_store_works_over_local_storage() {
        let saves = SaveStore::new(LocalStorageStore, BrowserClock, &GameConfig::default());
        assert!(saves.list_saves().iter().all(|save| save.timestamp > 0));
    }
}
