//! Integration tests for headless battle execution
//!
//! These tests verify that:
//! - Headless runs play a scripted chat session through to an outcome
//! - Reports are accessible programmatically and round-trip through JSON
//! - Seeded RNG produces deterministic results
//! - The safety cap ends runs that never finish

use chatarena::combat::controller::BattleOutcome;
use chatarena::headless::{
    run_headless_battle, simulate, HeadlessBattleConfig, HeadlessReport, ScriptedChatLine,
};
use chatarena::settings::BattleSettings;

/// Helper to create a config with `viewers` subscribers chatting before a
/// scripted start request
fn create_config(viewers: usize, seed: Option<u64>) -> HeadlessBattleConfig {
    HeadlessBattleConfig {
        chat: (0..viewers)
            .map(|i| ScriptedChatLine::subscriber(0.05 * i as f32, &format!("viewer{}", i), "hi"))
            .collect(),
        start_at_secs: Some(0.05 * viewers as f32),
        max_duration_secs: 120.0,
        random_seed: seed,
        ..Default::default()
    }
}

#[test]
fn test_demo_runs_to_an_outcome() {
    let report = simulate(&HeadlessBattleConfig::demo());

    assert!(report.outcome.is_some(), "demo battle should finish");
    assert!(!report.timed_out);
    assert_eq!(report.participants, 8);
    assert_eq!(report.ranking.len(), 8);
    assert_eq!(report.candidates, 8);
    assert!(report.frames > 0);
    assert!(report.battle_log_entries > 0);
    assert!(report.battle_duration_secs > 0.0);
    assert!(report.battle_duration_secs <= 60.0 + 0.1);

    // Ranks are dense and start at 1
    for (i, stat) in report.ranking.iter().enumerate() {
        assert_eq!(stat.rank, i + 1);
    }

    if let Some(BattleOutcome::Winner(_)) = report.outcome {
        assert!(report.winner_name.is_some());
    }
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let first = simulate(&create_config(6, Some(4242)));
    let second = simulate(&create_config(6, Some(4242)));

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.winner_name, second.winner_name);
    assert_eq!(first.ranking, second.ranking);
    assert_eq!(first.frames, second.frames);
    assert_eq!(first, second);
}

#[test]
fn test_too_few_candidates_ends_without_battle() {
    let report = simulate(&create_config(2, Some(1)));

    assert!(report.outcome.is_none());
    assert!(report.winner_name.is_none());
    assert!(report.ranking.is_empty());
    assert_eq!(report.candidates, 2);
    assert!(!report.timed_out, "nothing left to wait for");
}

#[test]
fn test_only_eligible_viewers_are_drafted() {
    let mut config = create_config(3, Some(1));
    for line in &mut config.chat {
        line.subscriber = false;
    }
    config.chat.push(ScriptedChatLine {
        moderator: true,
        subscriber: false,
        ..ScriptedChatLine::subscriber(0.0, "modguy", "hello")
    });

    let report = simulate(&config);
    assert_eq!(report.candidates, 1, "only the moderator is drafted");
    assert!(report.outcome.is_none());
}

#[test]
fn test_battle_emote_starts_battle_from_chat() {
    let mut settings = BattleSettings::default();
    settings.battle_spawn_chance = 1.0;

    let config = HeadlessBattleConfig {
        chat: vec![
            ScriptedChatLine::subscriber(0.0, "alpha", "Kappa"),
            ScriptedChatLine::subscriber(0.1, "bravo", "PogChamp"),
            ScriptedChatLine::subscriber(0.2, "charlie", "LUL LUL"),
        ],
        start_at_secs: None,
        random_seed: Some(11),
        settings: Some(settings),
        ..Default::default()
    };

    let report = simulate(&config);
    assert!(report.outcome.is_some());
    assert_eq!(report.participants, 3);
}

#[test]
fn test_safety_cap_marks_timed_out() {
    let mut config = HeadlessBattleConfig::demo();
    config.max_duration_secs = 2.0;

    let report = simulate(&config);
    assert!(report.timed_out);
    assert!(report.outcome.is_none());
    assert!(report.simulated_secs >= 2.0);
    assert!(report.simulated_secs < 2.1);
}

#[test]
fn test_report_save_round_trip() {
    let report = simulate(&create_config(4, Some(3)));

    let path = std::env::temp_dir()
        .join(format!("chatarena-{}", std::process::id()))
        .join("report.json");
    let saved = report.save(&path).expect("report should save");

    let contents = std::fs::read_to_string(&saved).unwrap();
    let loaded: HeadlessReport = serde_json::from_str(&contents).unwrap();
    assert_eq!(loaded.outcome, report.outcome);
    assert_eq!(loaded.ranking.len(), report.ranking.len());
    assert_eq!(loaded.random_seed, Some(3));

    let _ = std::fs::remove_dir_all(saved.parent().unwrap());
}

#[test]
fn test_config_file_round_trip() {
    let json = r##"{
        "chat": [
            {"at_secs": 0.0, "username": "a", "subscriber": true, "text": "Kappa"},
            {"at_secs": 0.1, "username": "b", "subscriber": true, "text": "hi"},
            {"at_secs": 0.2, "username": "c", "text": "hi"}
        ],
        "start_at_secs": 0.5,
        "random_seed": 5
    }"##;
    let config: HeadlessBattleConfig = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.chat[2].channel, "#overlay");

    let report = simulate(&config);
    assert_eq!(report.candidates, 2, "plain viewers are not eligible");
    assert!(report.outcome.is_none());
}

/// The only test that builds a Bevy `App`; the global log subscriber can
/// be installed once per process.
#[test]
fn test_app_run_matches_direct_simulation() {
    let config = create_config(5, Some(99));
    let expected = simulate(&config);

    let report = run_headless_battle(config).expect("headless run should produce a report");

    assert_eq!(report.outcome, expected.outcome);
    assert_eq!(report.winner_name, expected.winner_name);
    assert_eq!(report.ranking, expected.ranking);
    assert!(!report.timed_out);
}
