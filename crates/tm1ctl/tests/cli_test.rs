//! Integration tests for the `tm1ctl` binary.
//!
//! Every invocation gets its own configuration file in a temp dir; remote
//! calls go to a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const ENV_VARS: &[&str] = &[
    "TM1CTL_CONFIG",
    "TM1CTL_HOST",
    "TM1CTL_INSTANCE",
    "TM1CTL_USER",
    "TM1CTL_PASSWORD",
    "TM1CTL_CLIENT_ID",
    "TM1CTL_CLIENT_SECRET",
    "TM1CTL_OUTPUT",
    "TM1CTL_INSECURE",
    "TM1CTL_CA_CERT",
    "TM1CTL_TIMEOUT",
    "TM1CTL_DATABASE",
    "RUST_LOG",
];

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Sandbox with an existing configuration document.
    fn with_config(config: &Value) -> Self {
        let sandbox = Self::new();
        std::fs::write(sandbox.config_path(), config.to_string()).unwrap();
        sandbox
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    fn config(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(self.config_path()).unwrap()).unwrap()
    }

    /// `tm1ctl` isolated from the user's environment and configuration.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = self.cmd_default_location();
        cmd.arg("--config").arg(self.config_path());
        cmd
    }

    /// Like [`Sandbox::cmd`], but with the config file at its default
    /// location inside the sandbox home.
    fn cmd_default_location(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("tm1ctl");
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env("NO_COLOR", "1");
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Path printed by `config path` for the default location.
    fn default_config_path(&self) -> PathBuf {
        let output = self
            .cmd_default_location()
            .args(["config", "path"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", combined_output(&output));
        PathBuf::from(String::from_utf8(output.stdout).unwrap().trim())
    }
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn remote_config(root: &str) -> Value {
    json!({
        "host": "remote",
        "user": "admin",
        "hosts": {
            "remote": {
                "service_root_url": root,
                "root_client_id": "root",
                "root_client_secret": "s3cret",
                "instance": "dev"
            }
        },
        "users": {
            "admin": { "name": "Admin", "password": "apple" }
        }
    })
}

/// Run a prepared command off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let sandbox = Sandbox::new();
    let output = sandbox.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    Sandbox::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("TM1")
            .and(predicate::str::contains("instance"))
            .and(predicate::str::contains("database"))
            .and(predicate::str::contains("restore")),
    );
}

#[test]
fn version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tm1ctl"));
}

#[test]
fn completions_zsh() {
    Sandbox::new()
        .cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn completions_bash() {
    Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Local configuration ─────────────────────────────────────────────

#[test]
fn first_run_writes_default_document() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd_default_location()
        .args(["config", "list", "host"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"));

    let path = sandbox.default_config_path();
    assert!(path.starts_with(sandbox.dir.path()), "{}", path.display());
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["host"], "local");
    assert_eq!(
        written["hosts"]["local"]["service_root_url"],
        "http://localhost:4444"
    );
}

#[test]
fn existing_home_file_is_the_default_location() {
    let sandbox = Sandbox::new();
    let home_file = sandbox.dir.path().join(".tm1ctl.json");
    std::fs::write(
        &home_file,
        json!({ "host": "legacy", "hosts": { "legacy": { "service_root_url": "http://tm1:8010" } } })
            .to_string(),
    )
    .unwrap();

    assert_eq!(sandbox.default_config_path(), home_file);
    sandbox
        .cmd_default_location()
        .args(["host", "list", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""Name":"legacy""#));
}

#[test]
fn explicit_config_path_is_not_created_by_reads() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["host", "list", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""Name":"local""#))
        .stdout(predicate::str::contains("http://localhost:4444"));
    assert!(!sandbox.config_path().exists());
}

#[test]
fn host_round_trip() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args([
            "host",
            "set",
            "remote",
            "--service-root-url",
            "https://tm1.example.com",
            "--root-client-id",
            "root",
            "--root-client-secret",
            "s3cret",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated host 'remote'."));

    sandbox
        .cmd()
        .args(["host", "list", "remote", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****"))
        .stdout(predicate::str::contains("s3cret").not());

    sandbox.cmd().args(["host", "use", "remote"]).assert().success();
    assert_eq!(sandbox.config()["host"], "remote");

    sandbox
        .cmd()
        .args(["host", "delete", "remote"])
        .assert()
        .success();
    let config = sandbox.config();
    assert!(config["hosts"].get("remote").is_none());
    assert!(config.get("host").is_none());
}

#[test]
fn host_set_rejects_bad_url() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["host", "set", "remote", "--service-root-url", "ftp://tm1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!sandbox.config_path().exists());
}

#[test]
fn using_unknown_host_is_not_found() {
    let sandbox = Sandbox::new();
    let output = sandbox.cmd().args(["host", "use", "nowhere"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("host 'nowhere' is not defined"), "{text}");
}

#[test]
fn user_password_and_variables_are_stored() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args([
            "user",
            "set",
            "admin",
            "--name",
            "Admin",
            "-p",
            "apple",
            "--variables",
            r#"{"region":"EU"}"#,
        ])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["user", "variable", "set", "year", "2024", "-u", "admin"])
        .assert()
        .success();

    let config = sandbox.config();
    assert_eq!(
        config["users"]["admin"],
        json!({
            "name": "Admin",
            "password": "apple",
            "variables": { "region": "EU", "year": 2024 }
        })
    );

    sandbox
        .cmd()
        .args(["user", "list", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apple").not());
}

#[test]
fn session_password_is_never_stored() {
    let sandbox = Sandbox::with_config(&json!({
        "host": "local",
        "hosts": { "local": { "service_root_url": "http://localhost:4444" } },
        "users": { "admin": { "password": "apple" } }
    }));

    sandbox
        .cmd()
        .env("TM1CTL_PASSWORD", "session-only")
        .args(["user", "set", "bob", "--name", "Bob"])
        .assert()
        .success();
    sandbox
        .cmd()
        .env("TM1CTL_PASSWORD", "session-only")
        .args(["user", "set", "admin", "--name", "Admin"])
        .assert()
        .success();

    let config = sandbox.config();
    assert_eq!(config["users"]["bob"], json!({ "name": "Bob" }));
    assert_eq!(
        config["users"]["admin"],
        json!({ "name": "Admin", "password": "apple" })
    );
}

#[test]
fn instance_use_sets_and_clears_host_instance() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["instance", "use", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Set active instance on host 'local' to 'dev'.",
        ));
    assert_eq!(sandbox.config()["hosts"]["local"]["instance"], "dev");

    sandbox
        .cmd()
        .args(["instance", "use"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset active instance on host 'local'."));
}

#[test]
fn config_set_and_list_output_format() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "set", "output-format", "json"])
        .assert()
        .success();
    assert_eq!(sandbox.config()["output-format"], "json");

    sandbox
        .cmd()
        .args(["config", "list", "output-format"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""Value": "json""#));

    let output = sandbox
        .cmd()
        .args(["config", "set", "output-format", "xml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn config_path_prints_the_file_in_use() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            sandbox.config_path().display().to_string(),
        ));
}

// ── Remote commands ─────────────────────────────────────────────────

#[test]
fn database_list_without_instance_is_config_error() {
    let mut config = remote_config("http://127.0.0.1:9");
    config["hosts"]["remote"]
        .as_object_mut()
        .unwrap()
        .remove("instance");
    let sandbox = Sandbox::with_config(&config);

    let output = sandbox.cmd().args(["database", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    let text = combined_output(&output);
    assert!(text.contains("no instance specified for host 'remote'"), "{text}");
}

#[test]
fn restore_with_missing_file_is_local_error() {
    let sandbox = Sandbox::with_config(&remote_config("http://127.0.0.1:9"));
    let missing = sandbox.dir.path().join("missing.zip");

    let output = sandbox
        .cmd()
        .args(["restore", "-d", "Sales"])
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    assert!(combined_output(&output).contains("missing.zip"));
}

#[test]
fn database_delete_needs_yes_when_not_interactive() {
    let sandbox = Sandbox::with_config(&remote_config("http://127.0.0.1:9"));
    let output = sandbox
        .cmd()
        .args(["database", "delete", "Sales"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn instance_list_uses_root_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manage/v1/Instances"))
        .and(header("authorization", "Basic cm9vdDpzM2NyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "$metadata#Instances",
            "value": [{ "Name": "dev" }, { "Name": "prod" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::with_config(&remote_config(&server.uri()));
    let mut cmd = sandbox.cmd();
    cmd.args(["instance", "list", "-o", "json-compact"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed, json!([{ "Name": "dev" }, { "Name": "prod" }]));
}

#[tokio::test(flavor = "multi_thread")]
async fn database_get_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dev/api/v1/Databases('Nope')"))
        .and(header("authorization", "Basic QWRtaW46YXBwbGU="))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::with_config(&remote_config(&server.uri()));
    let mut cmd = sandbox.cmd();
    cmd.args(["database", "get", "Nope"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("not here"));
}

#[tokio::test(flavor = "multi_thread")]
async fn restore_end_to_end() {
    let server = MockServer::start().await;
    let db = "/dev/api/v1/Databases('Sales')";
    let folder = format!("{db}/Contents('Files')/Contents('.backupsets')");

    Mock::given(method("GET"))
        .and(path(folder.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Name": ".backupsets" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{folder}/Contents").as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "Name": "x" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{db}/tm1s.Restore").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let sandbox = Sandbox::with_config(&remote_config(&server.uri()));
    let backup = sandbox.dir.path().join("backup.zip");
    std::fs::write(&backup, b"0123456789").unwrap();

    let mut cmd = sandbox.cmd();
    cmd.args(["restore", "--database", "Sales"]).arg(&backup);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("10 bytes uploaded"),
        "{}",
        combined_output(&output)
    );
    let methods: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.method.to_string())
        .collect();
    assert_eq!(methods, ["GET", "POST", "PUT", "POST", "DELETE"]);
}
