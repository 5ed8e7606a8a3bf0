use std::process::Command;

fn tester() -> Command {
    Command::new(env!("CARGO_BIN_EXE_flychess-tester"))
}

#[test]
fn lists_scenarios() {
    let output = tester().arg("--list-scenarios").output().expect("run tester");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for key in ["smoke", "persistence-resume", "time-inference"] {
        assert!(stdout.contains(key), "missing {key}");
    }
}

#[test]
fn json_report_for_passing_scenarios() {
    let output = tester()
        .args([
            "--scenarios",
            "overshoot-bounce,executor-assignment",
            "--seeds",
            "1,2",
            "--iterations",
            "2",
            "--skip-playability",
            "--report",
            "json",
        ])
        .output()
        .expect("run tester");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("json in output");
    let report: serde_json::Value =
        serde_json::from_str(stdout[json_start..].trim()).expect("valid json");
    let scenarios = report["scenarios"].as_array().expect("scenario list");
    assert_eq!(scenarios.len(), 4);
    assert!(scenarios.iter().all(|s| s["passed"] == true));
}

#[test]
fn unknown_scenario_exits_with_failure() {
    let output = tester()
        .args(["--scenarios", "bogus", "--iterations", "1", "--skip-playability"])
        .output()
        .expect("run tester");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn csv_report_from_playability_sweep() {
    let path = std::env::temp_dir().join(format!("flychess-cli-{}.csv", std::process::id()));
    let status = tester()
        .args(["--scenarios", "smoke", "--iterations", "1", "--mode", "daily", "--report", "csv"])
        .arg("--output")
        .arg(&path)
        .status()
        .expect("run tester");
    assert!(status.success());
    let csv = std::fs::read_to_string(&path).expect("report written");
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().skip(1).all(|line| line.starts_with("daily,")));
}

#[test]
fn rejects_bad_seeds() {
    let output = tester()
        .args(["--seeds", "banana", "--skip-playability"])
        .output()
        .expect("run tester");
    assert!(!output.status.success());
}
