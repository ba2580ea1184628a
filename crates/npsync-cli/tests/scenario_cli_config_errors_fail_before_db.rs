//! Config problems surface before any connection attempt.
//!
//! GREEN when:
//! - a missing database URL is reported by its configured variable name
//! - secret literals and invalid settings are refused
//! - `db` commands resolve the URL through the same config layers

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn config_file(yaml: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(yaml.as_bytes()).unwrap();
    f
}

#[test]
fn missing_database_url_names_the_variable() {
    let cfg = config_file("database:\n  url_env: \"NPSYNC_SENTINEL_CLI_URL_UNSET_C3\"\n");

    Command::cargo_bin("npsync")
        .unwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["subscenarios", "--user-id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRETS_MISSING"))
        .stderr(predicate::str::contains("NPSYNC_SENTINEL_CLI_URL_UNSET_C3"));
}

#[test]
fn secret_literal_in_config_is_refused() {
    let cfg = config_file("database:\n  url_env: \"postgres://u:s3cret@db/npps4\"\n");

    Command::cargo_bin("npsync")
        .unwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["album", "--invite-code", "XYZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("s3cret").not());
}

#[test]
fn invalid_reward_amount_is_refused() {
    let cfg = config_file("rewards:\n  soft_currency_amount: 0\n");

    Command::cargo_bin("npsync")
        .unwrap()
        .arg("--config")
        .arg(cfg.path())
        .args(["subscenarios", "--user-id", "1", "--with-rewards"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_INVALID"));
}

#[test]
fn config_hash_reflects_layers() {
    let cfg = config_file("rewards:\n  soft_currency_amount: 30000\n");

    Command::cargo_bin("npsync")
        .unwrap()
        .arg("--config")
        .arg(cfg.path())
        .arg("config-hash")
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains("\"soft_currency_amount\":30000"));
}

#[test]
fn db_status_uses_configured_url_variable() {
    let cfg = config_file("database:\n  url_env: \"NPSYNC_SENTINEL_CLI_DB_UNSET_D4\"\n");

    Command::cargo_bin("npsync")
        .unwrap()
        .env("NPSYNC_DATABASE_URL", "postgres://localhost:1/never_used")
        .arg("--config")
        .arg(cfg.path())
        .args(["db", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRETS_MISSING"))
        .stderr(predicate::str::contains("NPSYNC_SENTINEL_CLI_DB_UNSET_D4"));
}
