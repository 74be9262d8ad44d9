use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fsrecorder"))
}

#[test]
fn top_level_help_lists_subcommands() {
    let out = bin().arg("--help").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("record"));
    assert!(text.contains("replay"));
    assert!(text.contains("info"));
}

#[test]
fn record_help_mentions_output_and_binary_toggle() {
    let out = bin().args(["record", "--help"]).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
    assert!(text.contains("directory"));
    assert!(text.contains("--output"));
    assert!(text.contains("--skip-binary-content"));
    assert!(text.contains("--force-text-extensions"));
}

#[test]
fn replay_help_mentions_modes() {
    let out = bin().args(["replay", "--help"]).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
    assert!(text.contains("recording"));
    assert!(text.contains("--dev-mode"));
    assert!(text.contains("--fast"));
    assert!(text.contains("--exact"));
}

#[test]
fn timing_modes_are_mutually_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let out = bin()
        .args(["replay", "rec.tar.gz"])
        .arg(dir.path())
        .args(["--dev-mode", "--fast"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn missing_archive_fails_nonzero() {
    let out = bin()
        .args(["info", "definitely-not-there.tar.gz"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn legacy_json_replays_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("legacy.json");
    // sha256("hi")
    let hash = "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4";
    std::fs::write(
        &recording,
        format!(
            r#"{{"metadata": {{"recorded_at": "2023-01-01T00:00:00",
                               "watch_dir": "/w", "total_events": 1}},
                "events": [{{"timestamp": 1.0, "event_type": "initial_file",
                             "src_path": "greeting.txt", "is_directory": false,
                             "content": "hi", "size": 2,
                             "content_hash": "{hash}"}}]}}"#
        ),
    )
    .unwrap();

    let target = dir.path().join("out");
    let out = bin()
        .arg("replay")
        .arg(&recording)
        .arg(&target)
        .arg("--dev-mode")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        std::fs::read_to_string(target.join("greeting.txt")).unwrap(),
        "hi"
    );
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Integrity verification passed"));
}

#[test]
fn info_prints_event_breakdown() {
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("legacy.json");
    std::fs::write(
        &recording,
        r#"{"metadata": {"recorded_at": "2023-01-01T00:00:00",
                         "watch_dir": "/w", "total_events": 2},
            "events": [
              {"timestamp": 1.0, "event_type": "initial_dir",
               "src_path": "d", "is_directory": true},
              {"timestamp": 2.0, "event_type": "deleted",
               "src_path": "d", "is_directory": true}]}"#,
    )
    .unwrap();

    let out = bin().arg("info").arg(&recording).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Total events: 2"));
    assert!(text.contains("Format version: 1.0"));
    assert!(text.contains("initial_dir: 1"));
    assert!(text.contains("deleted: 1"));
}
