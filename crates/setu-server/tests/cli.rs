use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

fn command_output(home: &Path, args: &[&str]) -> Output {
    let db_path = home.join("setu.sqlite3");
    cargo_bin_cmd!("setu")
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("RUST_LOG")
        .args(["--db-path", db_path.to_str().expect("db path")])
        .args(args)
        .output()
        .expect("run command")
}

fn run_cmd(home: &Path, args: &[&str]) -> String {
    let output = command_output(home, args);
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).expect("utf8")
}

fn run_cmd_json(home: &Path, args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = command_output(home, &full);
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

#[test]
fn sos_for_registered_user_falls_back_to_own_phone() {
    let temp = TempDir::new().expect("temp dir");

    let user = run_cmd_json(
        temp.path(),
        &["add-user", "--name", "Meera", "--phone", "9123456789"],
    );
    let user_id = user["id"].as_str().expect("id").to_string();

    let report = run_cmd_json(
        temp.path(),
        &["sos", "--user", &user_id, "--lat", "19.076", "--lng", "72.8777"],
    );
    assert_eq!(report["mapLink"], "https://maps.google.com/?q=19.076,72.8777");
    let notifications = report["notifications"].as_array().expect("array");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["to"], "+919123456789");
    assert_eq!(notifications[0]["status"], "sent");
    assert_eq!(notifications[0]["sid"], "LOG-1");
    assert_eq!(report["sos"]["status"], "dispatched");
}

#[test]
fn sos_with_contacts_keeps_input_order() {
    let temp = TempDir::new().expect("temp dir");

    let report = run_cmd_json(
        temp.path(),
        &[
            "sos",
            "--user",
            "walk-in",
            "--contact",
            "Asha=98765 43210",
            "--contact",
            "Ravi=+14155550100",
            "--lat",
            "-33.8688",
            "--lng",
            "151.2093",
        ],
    );
    let notifications = report["notifications"].as_array().expect("array");
    let targets: Vec<_> = notifications
        .iter()
        .map(|notification| notification["to"].as_str().expect("to"))
        .collect();
    assert_eq!(targets, vec!["+919876543210", "+14155550100"]);
    assert_eq!(
        report["mapLink"],
        "https://maps.google.com/?q=-33.8688,151.2093"
    );
}

#[test]
fn sos_without_location_uses_placeholder() {
    let temp = TempDir::new().expect("temp dir");

    let stdout = run_cmd(temp.path(), &["sos", "--user", "walk-in"]);
    assert!(stdout.contains("no_recipients"), "stdout: {stdout}");
    assert!(stdout.contains("map Location not provided"), "stdout: {stdout}");
    assert!(stdout.contains("no recipients"), "stdout: {stdout}");
}

#[test]
fn send_test_uses_log_backend_by_default() {
    let temp = TempDir::new().expect("temp dir");

    let sent = run_cmd_json(temp.path(), &["send-test", "--to", "9876543210"]);
    assert_eq!(sent["to"], "+919876543210");
    assert_eq!(sent["sid"], "LOG-1");
    assert_eq!(sent["transport"], "log");
}

#[test]
fn malformed_contact_exits_with_invalid_input() {
    let temp = TempDir::new().expect("temp dir");

    let output = command_output(temp.path(), &["sos", "--user", "u", "--contact", "Asha"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("NAME=PHONE"), "stderr: {stderr}");
}

#[test]
fn blank_user_name_exits_with_invalid_input() {
    let temp = TempDir::new().expect("temp dir");

    let output = command_output(temp.path(), &["add-user", "--name", "  "]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn invalid_config_exits_with_invalid_input() {
    let temp = TempDir::new().expect("temp dir");
    let config_path = temp.path().join("bad.toml");
    std::fs::write(&config_path, "default_country_code = \"91\"\n").expect("write config");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))
            .expect("chmod");
    }

    let output = command_output(
        temp.path(),
        &[
            "--config",
            config_path.to_str().expect("config path"),
            "send-test",
            "--to",
            "9876543210",
        ],
    );
    assert_eq!(output.status.code(), Some(3));
}
