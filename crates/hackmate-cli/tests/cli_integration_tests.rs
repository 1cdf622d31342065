//! CLI integration tests for hackmate
//!
//! Each test runs the binary against its own config directory with no API key
//! in the environment, so nothing reaches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated to `home` with API keys removed
#[allow(deprecated)]
fn hackmate_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hackmate").unwrap();
    cmd.current_dir(home.path());
    cmd.env("HACKMATE_CONFIG_DIR", home.path().join("config"));
    cmd.env_remove("HACKMATE_API_KEY");
    cmd.env_remove("GEMINI_API_KEY");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("save-code"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_config_path_respects_env() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            home.path().join("config").to_string_lossy().as_ref(),
        ));
}

#[test]
fn test_config_list_shows_defaults() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("llm.model = gemini-2.0-flash"))
        .stdout(predicate::str::contains("cache.backend = sqlite"))
        .stdout(predicate::str::contains("cache.agent_ttl_secs = 3600"));
}

#[test]
fn test_config_list_json() {
    let home = TempDir::new().unwrap();
    let output = hackmate_cmd(&home)
        .args(["--format", "json", "config", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["cache.root"], "hackmate");
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "cache.backend", "memory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set cache.backend = memory"));

    hackmate_cmd(&home)
        .args(["config", "get", "cache.backend"])
        .assert()
        .success()
        .stdout(predicate::str::diff("memory\n"));

    assert!(home.path().join("config").join("config.toml").exists());
}

#[test]
fn test_config_set_rejects_bad_values() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "llm.temperature", "9"])
        .assert()
        .failure();

    hackmate_cmd(&home)
        .args(["config", "set", "llm.api_key", "sk-secret"])
        .assert()
        .failure();

    hackmate_cmd(&home)
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_config_reset() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "llm.max_tokens", "2048"])
        .assert()
        .success();
    hackmate_cmd(&home)
        .args(["config", "reset"])
        .assert()
        .success();
    hackmate_cmd(&home)
        .args(["config", "get", "llm.max_tokens"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1024\n"));
}

#[test]
fn test_create_rejects_empty_title() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["create", "--title", "  ", "--brief", "helps find recipes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E800"))
        .stderr(predicate::str::contains("title must not be empty"));
}

#[test]
fn test_create_rejects_zero_hours() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["create", "-t", "Recipe Bot", "-b", "recipes", "--hours", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("time_hours"));
}

#[test]
fn test_create_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args([
            "create",
            "--title",
            "Recipe Bot",
            "--brief",
            "helps find recipes from ingredients",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key found"));
}

#[test]
fn test_show_rejects_malformed_id() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["show", "../../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("8 lowercase hex"));
}

#[test]
fn test_show_unknown_project() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E002"));
}

#[test]
fn test_slides_unknown_project() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["slides", "deadbeef", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(!home.path().join("out").join("deadbeef").exists());
}

#[test]
fn test_show_and_slides_need_persistent_cache() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "cache.backend", "memory"])
        .assert()
        .success();

    hackmate_cmd(&home)
        .args(["show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache.backend is 'memory'"))
        .stderr(predicate::str::contains("config set cache.backend sqlite"));

    hackmate_cmd(&home)
        .args(["slides", "deadbeef", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache.backend is 'memory'"));
}

#[test]
fn test_doctor_warns_on_memory_cache() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "cache.backend", "memory"])
        .assert()
        .success();

    hackmate_cmd(&home)
        .env("HACKMATE_API_KEY", "test-key-5678")
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[--] Cache: In-memory"));
}

#[test]
fn test_config_set_rejects_unbounded_ttl() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "cache.agent_ttl_secs", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agent_ttl_secs must be between"));
}

#[test]
fn test_save_code_from_file() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("snippet.py");
    std::fs::write(&input, "print('hi')\n").unwrap();

    hackmate_cmd(&home)
        .args(["save-code", "deadbeef", "--filename", "../main.py", "--input"])
        .arg(&input)
        .args(["--out", "artifacts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 12 bytes"));

    let saved = home.path().join("artifacts").join("deadbeef").join("..main.py");
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "print('hi')\n");
}

#[test]
fn test_save_code_from_stdin_defaults_name() {
    let home = TempDir::new().unwrap();

    hackmate_cmd(&home)
        .args(["-q", "save-code", "cafebabe"])
        .write_stdin("fn main() {}")
        .assert()
        .success()
        .stdout(predicate::str::contains("code.txt"));

    let saved = home.path().join("artifacts").join("cafebabe").join("code.txt");
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "fn main() {}");
}

#[test]
fn test_doctor_reports_missing_key() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("HackMate Health Check"))
        .stdout(predicate::str::contains("[!!] API Key"))
        .stdout(predicate::str::contains("[OK] Cache"));
}

#[test]
fn test_doctor_passes_with_key() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .env("GEMINI_API_KEY", "test-key-1234")
        .args(["--format", "json", "doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_status\": \"ok\""))
        .stdout(predicate::str::contains("***1234"));
}

#[test]
fn test_doctor_warns_when_cache_disabled() {
    let home = TempDir::new().unwrap();
    hackmate_cmd(&home)
        .args(["config", "set", "cache.backend", "disabled"])
        .assert()
        .success();

    hackmate_cmd(&home)
        .env("HACKMATE_API_KEY", "test-key-5678")
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[--] Cache"))
        .stdout(predicate::str::contains("Overall: warning"));
}
