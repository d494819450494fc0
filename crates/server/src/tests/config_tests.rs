use super::{normalize_database_url, prepare_database_url, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_match_local_development() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
    assert_eq!(settings.database_url, "sqlite://./data/liftbot.db");
    assert_eq!(settings.slack_api_base_url, "https://slack.com/api");
    assert_eq!(settings.ack_deadline_ms, 2500);
    assert!(settings.admin_override_user_id.is_none());
    assert!(settings.slack_signing_secret.is_empty());
}

#[test]
fn file_values_overlay_defaults() {
    let mut settings = Settings::default();
    settings.apply_file(
        r#"
bind_addr = "0.0.0.0:8080"
database_url = "sqlite://./var/lifts.db"
admin_override_user_id = "U03MT066GJU"
ack_deadline_ms = 1500
strict_contracts = false
"#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.database_url, "sqlite://./var/lifts.db");
    assert_eq!(
        settings.admin_override_user_id.as_deref(),
        Some("U03MT066GJU")
    );
    assert_eq!(settings.ack_deadline_ms, 1500);
    assert!(!settings.strict_contracts);
}

#[test]
fn unparsable_file_changes_nothing() {
    let mut settings = Settings::default();
    settings.apply_file("bind_addr = ");
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    settings.apply_env(env_from(&[
        ("SERVER_BIND", "127.0.0.1:1"),
        ("APP__BIND_ADDR", "127.0.0.1:2"),
        ("LIFTBOT_ADMIN_OVERRIDE", "UPLAIN"),
        ("APP__ADMIN_OVERRIDE_USER_ID", "UPREFIXED"),
    ]));
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.admin_override_user_id.as_deref(), Some("UPREFIXED"));
}

#[test]
fn secrets_come_from_env() {
    let mut settings = Settings::default();
    settings.apply_env(env_from(&[
        ("SLACK_BOT_TOKEN", "xoxb-test"),
        ("SLACK_SIGNING_SECRET", "shh"),
        ("APP__STRICT_CONTRACTS", "TRUE"),
    ]));
    assert_eq!(settings.slack_bot_token, "xoxb-test");
    assert_eq!(settings.slack_signing_secret, "shh");
    assert!(settings.strict_contracts);
}

#[test]
fn bad_numbers_and_blank_override_are_ignored() {
    let mut settings = Settings::default();
    settings.apply_env(env_from(&[
        ("APP__ACK_DEADLINE_MS", "soon"),
        ("LIFTBOT_ADMIN_OVERRIDE", "   "),
    ]));
    assert_eq!(settings.ack_deadline_ms, 2500);
    assert!(settings.admin_override_user_id.is_none());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_database_url("  "), "sqlite://./data/liftbot.db");
}

#[test]
fn creates_parent_dir_for_relative_sqlite_url() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("liftbot_server_test_{suffix}"));
    let db_path = temp_root.join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("liftbot_server_open_test_{suffix}"));
    let db_path = temp_root.join("nested").join("liftbot.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}
