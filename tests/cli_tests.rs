//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;

fn myavatar_bin() -> Command {
    Command::cargo_bin("myavatar").expect("binary should build")
}

fn with_temp_config(cmd: &mut Command, dir: &tempfile::TempDir) {
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("MYAVATAR_API_TOKEN")
        .env_remove("MYAVATAR_BACKEND_URL");
}

#[test]
fn version_flag_prints_version() {
    myavatar_bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("myavatar"));
}

#[test]
fn help_mentions_subcommands() {
    myavatar_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("avatars"))
        .stdout(predicate::str::contains("videos"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn generate_without_avatar_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("avatar"));
}

#[test]
fn config_get_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "set", "unknown_key", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_duration_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "set", "max_duration", "invalid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duration"));
}

#[test]
fn config_set_invalid_boolean_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "set", "clipboard", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("true"));
}

#[test]
fn config_set_invalid_encoding_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "set", "encodings", "flac,mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("encoding"));
}

#[test]
fn config_set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();

    let mut set_cmd = myavatar_bin();
    with_temp_config(&mut set_cmd, &dir);
    set_cmd
        .args(["config", "set", "avatar_id", "anna"])
        .assert()
        .success();

    let mut get_cmd = myavatar_bin();
    with_temp_config(&mut get_cmd, &dir);
    get_cmd
        .args(["config", "get", "avatar_id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anna"));
}

#[test]
fn config_get_token_is_masked() {
    let dir = tempfile::tempdir().unwrap();

    let mut set_cmd = myavatar_bin();
    with_temp_config(&mut set_cmd, &dir);
    set_cmd
        .args(["config", "set", "api_token", "supersecrettoken"])
        .assert()
        .success();

    let mut get_cmd = myavatar_bin();
    with_temp_config(&mut get_cmd, &dir);
    get_cmd
        .args(["config", "get", "api_token"])
        .assert()
        .success()
        .stdout(predicate::str::contains("supe****"))
        .stdout(predicate::str::contains("supersecrettoken").not());
}

#[test]
fn config_list_works_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend_url"))
        .stdout(predicate::str::contains("not set"));
}

#[test]
fn config_path_prints_location() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("myavatar"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_twice_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = myavatar_bin();
    with_temp_config(&mut first, &dir);
    first.args(["config", "init"]).assert().success();

    let mut second = myavatar_bin();
    with_temp_config(&mut second, &dir);
    second
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn avatars_with_unreachable_backend_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = myavatar_bin();
    with_temp_config(&mut cmd, &dir);

    cmd.args(["--backend-url", "http://127.0.0.1:1", "avatars"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Network")));
}
