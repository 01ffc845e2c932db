use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn pawforge() -> Command {
    let mut cmd = Command::cargo_bin("pawforge").unwrap();
    for var in [
        "PAWFORGE_LOG_LEVEL",
        "PAWFORGE_LOG_FORMAT",
        "PAWFORGE_PORT",
        "PAWFORGE_PER_ADDRESS_PER_HOUR",
        "PAWFORGE_PER_ADDRESS_PER_DAY",
        "PAWFORGE_PER_SESSION_PER_DAY",
        "PAWFORGE_GENERATOR_MODEL",
        "REPLICATE_API_TOKEN",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_version() {
    pawforge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pawforge 0.1.0"));
}

#[test]
fn test_help_lists_subcommands() {
    pawforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Rate-limited gateway for AI pet image generation",
        ))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_check_config_prints_effective_limits() {
    let file = config_file(
        r#"
[server]
port = 8080

[rate_limit]
per_address_per_hour = 3
"#,
    );

    pawforge()
        .args(["check-config", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"))
        .stdout(predicate::str::contains("port = 8080"))
        .stdout(predicate::str::contains("per_address_per_hour = 3"));
}

#[test]
fn test_check_config_redacts_token() {
    let file = config_file("[server]\nport = 8080\n");

    pawforge()
        .args(["check-config", "--config"])
        .arg(file.path())
        .env("REPLICATE_API_TOKEN", "r8_super_secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("r8_super_secret").not());
}

#[test]
fn test_check_config_rejects_invalid_limits() {
    let file = config_file("[rate_limit]\nper_address_per_hour = 0\n");

    pawforge()
        .args(["check-config", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}
