use std::env;
use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use role_common::database::DatabaseSettings;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    pub schema_config_path: String,
    pub storage: StorageSettings,
    /// required when `storage.backend` is `postgres`
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub slug: SlugSettings,
    #[serde(default)]
    pub autosave: AutosaveSettings,
    #[serde(default)]
    pub editor: EditorSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlugSettings {
    pub max_suggestion_attempts: u32,
}

impl Default for SlugSettings {
    fn default() -> Self {
        Self {
            max_suggestion_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutosaveSettings {
    /// used for kinds whose schema has no delay of its own
    pub default_delay_ms: u64,
}

impl AutosaveSettings {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            default_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorSettings {
    /// sessions untouched for this long are closed
    pub idle_timeout_secs: u64,
    pub eviction_interval_secs: u64,
}

impl EditorSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs.max(1))
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            eviction_interval_secs: 60,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            // APP_SERVER_PORT, APP_DATABASE__CREDENTIALS__PASSWORD
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }

    pub fn database(&self) -> anyhow::Result<&DatabaseSettings> {
        self.database
            .as_ref()
            .with_context(|| "postgres storage selected but no database settings found")
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let yaml = r#"
server_port: "3000"
schema_config_path: "./schemas"
storage:
  backend: memory
"#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert!(settings.database.is_none());
        assert!(settings.database().is_err());
        assert_eq!(settings.slug.max_suggestion_attempts, 20);
        assert_eq!(settings.autosave.default_delay(), Duration::from_secs(3));
        assert_eq!(settings.editor.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(settings.editor.eviction_interval(), Duration::from_secs(60));
    }
}
