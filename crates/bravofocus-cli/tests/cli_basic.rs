//! Basic CLI E2E tests.
//!
//! Each test drives the built binary against its own temporary data
//! directory, so persisted state never leaks between tests.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_bravofocus-cli"))
        .args(args)
        .env("BRAVOFOCUS_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Start a long-running CLI command in the background.
fn spawn_cli(data_dir: &Path, args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_bravofocus-cli"))
        .args(args)
        .env("BRAVOFOCUS_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI command")
}

/// Poll `timer status` until the persisted session reports `state`.
fn wait_for_state(data_dir: &Path, state: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let (stdout, _, _) = run_cli(data_dir, &["timer", "status"]);
        let snapshot = json_documents(&stdout).remove(0);
        if snapshot["state"] == state {
            return snapshot;
        }
        assert!(Instant::now() < deadline, "timer never reached {state}");
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Parse every pretty-printed JSON document on stdout.
fn json_documents(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is not JSON")
}

#[test]
fn test_timer_start_and_status() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "start", "--minutes", "5"]);
    assert_eq!(code, 0);
    let started = &json_documents(&stdout)[0];
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["mode"], "manual");
    assert_eq!(started["duration_ms"], 300_000);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let snapshot = &json_documents(&stdout)[0];
    assert_eq!(snapshot["type"], "StateSnapshot");
    assert_eq!(snapshot["state"], "running");
    assert!(snapshot["remaining_ms"].as_u64().unwrap() <= 300_000);
}

#[test]
fn test_timer_pause_resume_reset() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["timer", "study"]);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    let paused = &json_documents(&stdout)[0];
    assert_eq!(paused["type"], "TimerPaused");
    let remaining = paused["remaining_ms"].as_u64().unwrap();
    assert!(remaining > 0 && remaining <= 25 * 60_000);

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let snapshot = &json_documents(&stdout)[0];
    assert_eq!(snapshot["state"], "paused");
    assert_eq!(snapshot["mode"], "study");
    assert_eq!(snapshot["remaining_ms"].as_u64().unwrap(), remaining);

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "resume"]);
    assert_eq!(code, 0);
    assert_eq!(json_documents(&stdout)[0]["type"], "TimerResumed");

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(code, 0);
    assert_eq!(json_documents(&stdout)[0]["type"], "TimerReset");

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let snapshot = &json_documents(&stdout)[0];
    assert_eq!(snapshot["state"], "idle");
    assert_eq!(snapshot["display"], "00:00");
}

#[test]
fn test_zero_duration_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["timer", "start", "--minutes", "0", "--seconds", "0"],
    );
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(json_documents(&stdout)[0]["state"], "idle");
}

#[test]
fn test_short_timer_completes_once() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["timer", "start", "--seconds", "1", "--follow"],
    );
    assert_eq!(code, 0);

    let events = json_documents(&stdout);
    let types: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(types, ["TimerStarted", "TimerCompleted", "RewardGranted"]);
    assert_eq!(events[2]["exp_gained"], 0);
    // No sound files exist in the temp dir, so the fallback message shows.
    assert!(stderr.contains("Timer completed!"));

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let events = json_documents(&stdout);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["state"], "completed");
}

#[test]
fn test_progress_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["progress", "show"]);
    assert_eq!(code, 0);
    let progress = &json_documents(&stdout)[0];
    assert_eq!(progress["experience"], 0);
    assert_eq!(progress["level"], 1);
    assert_eq!(progress["exp_to_next_level"], 100);
    assert_eq!(progress["stickers"], serde_json::json!([]));

    let (stdout, _, code) = run_cli(dir.path(), &["progress", "today"]);
    assert_eq!(code, 0);
    assert_eq!(json_documents(&stdout)[0]["minutes"], 0);

    let (stdout, _, code) = run_cli(dir.path(), &["progress", "history"]);
    assert_eq!(code, 0);
    assert_eq!(json_documents(&stdout)[0], serde_json::json!([]));
}

#[test]
fn test_prefs_theme_and_sound() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, _) = run_cli(dir.path(), &["prefs", "get"]);
    let prefs = &json_documents(&stdout)[0];
    assert_eq!(prefs["theme"], "blue");
    assert_eq!(prefs["sound"], "basic");

    let (_, _, code) = run_cli(dir.path(), &["prefs", "theme", "purple"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["prefs", "sound", "victory"]);
    assert_eq!(code, 0);
    let (_, stderr, code) = run_cli(dir.path(), &["prefs", "theme", "orange"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli(dir.path(), &["prefs", "get"]);
    let prefs = &json_documents(&stdout)[0];
    assert_eq!(prefs["theme"], "purple");
    assert_eq!(prefs["sound"], "victory");
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.study_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.study_minutes", "50"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "timer.study_minutes"]);
    assert_eq!(stdout.trim(), "50");

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "study"]);
    assert_eq!(json_documents(&stdout)[0]["duration_ms"], 50 * 60_000);

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_new_start_from_another_shell_replaces_followed_timer() {
    let dir = tempfile::tempdir().unwrap();
    let follower = spawn_cli(dir.path(), &["timer", "start", "--seconds", "3", "--follow"]);
    wait_for_state(dir.path(), "running");

    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "--minutes", "10"]);
    assert_eq!(code, 0);

    let output = follower.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let types: Vec<_> = json_documents(&String::from_utf8_lossy(&output.stdout))
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, ["TimerStarted"]);

    let snapshot = wait_for_state(dir.path(), "running");
    assert_eq!(snapshot["duration_ms"], 600_000);

    let (stdout, _, _) = run_cli(dir.path(), &["progress", "show"]);
    assert_eq!(json_documents(&stdout)[0]["experience"], 0);
}

#[test]
fn test_pause_from_another_shell_survives_follower() {
    let dir = tempfile::tempdir().unwrap();
    let follower = spawn_cli(dir.path(), &["timer", "start", "--seconds", "3", "--follow"]);
    wait_for_state(dir.path(), "running");

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 0);
    let paused = json_documents(&stdout).remove(0);
    assert_eq!(paused["type"], "TimerPaused");

    let output = follower.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("TimerCompleted"));

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let snapshot = json_documents(&stdout).remove(0);
    assert_eq!(snapshot["state"], "paused");
    assert_eq!(snapshot["remaining_ms"], paused["remaining_ms"]);
}

#[cfg(unix)]
#[test]
fn test_interrupting_run_pauses_the_timer() {
    use std::io::Read;

    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "--minutes", "10"]);
    assert_eq!(code, 0);

    let mut child = spawn_cli(dir.path(), &["timer", "run"]);
    // Two redraws of the live line mean the loop is up and ticking.
    let mut stderr = child.stderr.take().unwrap();
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while seen.iter().filter(|b| **b == b'\r').count() < 2 {
        let n = stderr.read(&mut buf).unwrap();
        assert!(n > 0, "run exited early");
        seen.extend_from_slice(&buf[..n]);
    }

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    drop(stderr);
    assert_eq!(output.status.code(), Some(0));
    let events = json_documents(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "TimerPaused");

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    let snapshot = json_documents(&stdout).remove(0);
    assert_eq!(snapshot["state"], "paused");
    assert_eq!(snapshot["remaining_ms"], events[0]["remaining_ms"]);
}
