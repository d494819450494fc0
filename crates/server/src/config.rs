use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use slack_integration::web_api::DEFAULT_API_BASE_URL;
use tracing::warn;

const SETTINGS_FILE: &str = "liftbot.toml";

pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    pub slack_api_base_url: String,
    pub admin_override_user_id: Option<String>,
    pub ack_deadline_ms: u64,
    pub strict_contracts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: "sqlite://./data/liftbot.db".into(),
            slack_bot_token: String::new(),
            slack_signing_secret: String::new(),
            slack_api_base_url: DEFAULT_API_BASE_URL.into(),
            admin_override_user_id: None,
            ack_deadline_ms: 2500,
            strict_contracts: cfg!(debug_assertions),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        settings.apply_file(&raw);
    }
    settings.apply_env(|key| std::env::var(key).ok());

    settings
}

impl Settings {
    /// Overlays values from a flat `key = value` TOML document. Unknown keys
    /// are ignored; a document that fails to parse changes nothing.
    pub fn apply_file(&mut self, raw: &str) {
        let table = match toml::from_str::<toml::Table>(raw) {
            Ok(table) => table,
            Err(error) => {
                warn!(file = SETTINGS_FILE, %error, "ignoring unreadable settings file");
                return;
            }
        };
        let value = |key: &str| table.get(key).and_then(scalar_to_string);

        if let Some(v) = value("bind_addr") {
            self.server_bind = v;
        }
        if let Some(v) = value("database_url") {
            self.database_url = v;
        }
        if let Some(v) = value("slack_api_base_url") {
            self.slack_api_base_url = v;
        }
        if let Some(v) = value("admin_override_user_id") {
            self.set_admin_override(v);
        }
        if let Some(v) = value("ack_deadline_ms") {
            self.set_ack_deadline(&v);
        }
        if let Some(v) = value("strict_contracts") {
            self.set_strict_contracts(&v);
        }
    }

    /// Overlays environment variables. The `APP__` form wins over the plain
    /// one when both are set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SERVER_BIND") {
            self.server_bind = v;
        }
        if let Some(v) = lookup("APP__BIND_ADDR") {
            self.server_bind = v;
        }

        if let Some(v) = lookup("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("APP__DATABASE_URL") {
            self.database_url = v;
        }

        if let Some(v) = lookup("SLACK_BOT_TOKEN") {
            self.slack_bot_token = v;
        }
        if let Some(v) = lookup("SLACK_SIGNING_SECRET") {
            self.slack_signing_secret = v;
        }

        if let Some(v) = lookup("APP__SLACK_API_BASE_URL") {
            self.slack_api_base_url = v;
        }

        if let Some(v) = lookup("LIFTBOT_ADMIN_OVERRIDE") {
            self.set_admin_override(v);
        }
        if let Some(v) = lookup("APP__ADMIN_OVERRIDE_USER_ID") {
            self.set_admin_override(v);
        }

        if let Some(v) = lookup("APP__ACK_DEADLINE_MS") {
            self.set_ack_deadline(&v);
        }
        if let Some(v) = lookup("APP__STRICT_CONTRACTS") {
            self.set_strict_contracts(&v);
        }
    }

    fn set_admin_override(&mut self, raw: String) {
        let raw = raw.trim();
        self.admin_override_user_id = (!raw.is_empty()).then(|| raw.to_string());
    }

    fn set_ack_deadline(&mut self, raw: &str) {
        match raw.trim().parse::<u64>() {
            Ok(parsed) => self.ack_deadline_ms = parsed,
            Err(_) => warn!(value = raw, "ignoring non-integer ack_deadline_ms"),
        }
    }

    fn set_strict_contracts(&mut self, raw: &str) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => self.strict_contracts = true,
            "0" | "false" | "no" => self.strict_contracts = false,
            _ => warn!(value = raw, "ignoring unrecognised strict_contracts value"),
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
