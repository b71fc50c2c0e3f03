//! End-to-end smoke tests driving the `taskloom` binary, grounded on
//! `agtrace-cli`'s `tests/` convention of exercising subcommands through
//! `assert_cmd` against a scratch `TestWorld`.

use taskloom_evolve::Profile;
use taskloom_testing::TestWorld;

#[test]
fn config_show_reports_defaults() {
    let world = TestWorld::new();
    let result = world.run(&["config", "show"]).unwrap();

    assert!(result.success(), "stderr: {}", result.stderr);
    let json = result.json().unwrap();
    assert_eq!(json["config"]["orchestrator"]["max_turns"], 300);
}

#[test]
fn session_list_is_empty_on_a_fresh_world() {
    let world = TestWorld::new();
    let result = world.run(&["session", "list"]).unwrap();

    assert!(result.success(), "stderr: {}", result.stderr);
    assert!(result.stdout.trim().is_empty());
}

#[test]
fn baseline_show_fails_without_a_matching_record() {
    let world = TestWorld::new();
    let path = world.root().join("baselines.json");
    let result = world
        .run(&[
            "baseline",
            "show",
            "--path",
            path.to_str().unwrap(),
            "--model",
            "claude-code",
        ])
        .unwrap();

    assert!(!result.success());
}

#[test]
fn evolve_propose_then_record_writes_back_a_winning_candidate() {
    let world = TestWorld::new();
    let profile_path = world.root().join("profile.json");
    let candidate_path = world.root().join("candidate.json");
    let results_path = world.root().join("results.json");

    Profile::baseline("gen-0").save_to(&profile_path).unwrap();

    let propose = world
        .run(&[
            "evolve",
            "propose",
            "--profile",
            profile_path.to_str().unwrap(),
            "--seed",
            "7",
            "--out",
            candidate_path.to_str().unwrap(),
        ])
        .unwrap();
    assert!(propose.success(), "stderr: {}", propose.stderr);
    assert!(candidate_path.exists());

    let results = taskloom_types::BenchResults {
        meta: taskloom_types::BenchResultsMeta {
            run_id: "r1".to_string(),
            model: "claude-code".to_string(),
            started_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: Some("2026-01-01T00:01:00Z".to_string()),
            project_id: None,
        },
        tasks: vec![],
        summary: taskloom_types::RunSummary {
            total: 1,
            passed: 1,
            failed: 0,
            timed_out: 0,
            errored: 0,
            pass_rate: 1.0,
        },
    };
    std::fs::write(&results_path, serde_json::to_string_pretty(&results).unwrap()).unwrap();

    let record = world
        .run(&[
            "evolve",
            "record",
            "--profile",
            profile_path.to_str().unwrap(),
            "--candidate",
            candidate_path.to_str().unwrap(),
            "--results",
            results_path.to_str().unwrap(),
            "--best-score",
            "0.0",
        ])
        .unwrap();
    assert!(record.success(), "stderr: {}", record.stderr);
    let json = record.json().unwrap();
    assert_eq!(json["accepted"], true);

    let saved = Profile::load_from(&profile_path).unwrap();
    let candidate = Profile::load_from(&candidate_path).unwrap();
    assert_eq!(saved, candidate);
}
