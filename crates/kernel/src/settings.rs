use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSHELF_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSHELF";
const REDACTED: &str = "***";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration from `.env`, the base file, the environment overlay,
    /// the legacy deployment variables and finally `BOOKSHELF_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment: Environment = std::env::var(ENV_VAR_NAME)
            .unwrap_or_else(|_| DEFAULT_ENV.to_string())
            .parse()?;
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let legacy = legacy_overrides(|name| std::env::var(name).ok());
        let mut settings = layered(&config_dir, &environment, legacy)?;
        settings.environment = environment;

        Ok(settings)
    }

    /// Address the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Copy of the settings with every API key masked, safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        redact(&mut settings.store.api_key);
        redact(&mut settings.identity.api_key);
        settings
    }
}

fn environment_name(environment: &Environment) -> &'static str {
    match environment {
        Environment::Local => "local",
        Environment::Staging => "staging",
        Environment::Production => "production",
    }
}

fn redact(secret: &mut String) {
    if !secret.is_empty() {
        *secret = REDACTED.to_string();
    }
}

/// Builds settings from the config files in `config_dir`, then `legacy`, then
/// `BOOKSHELF_*` variables, each layer overriding the previous one.
fn layered(
    config_dir: &Path,
    environment: &Environment,
    legacy: Vec<(&'static str, String)>,
) -> anyhow::Result<Settings> {
    let base_path = config_dir.join("base.toml");
    let environment_path = config_dir.join(format!("{}.toml", environment_name(environment)));

    let cfg = config::Config::builder()
        .add_source(config::File::from(base_path).required(false))
        .add_source(config::File::from(environment_path).required(false))
        .add_source(LegacyVariables(legacy))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .with_context(|| "failed to build configuration")?;

    cfg.try_deserialize()
        .with_context(|| "failed to deserialize configuration")
}

/// Maps the variables the service was historically deployed with onto
/// settings keys.
fn legacy_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    let mut overrides = Vec::new();

    if let Some(port) = lookup("PORT") {
        overrides.push(("server.port", port));
    }
    if let Some(url) = lookup("SUPABASE_URL") {
        overrides.push(("store.endpoint", url.clone()));
        overrides.push(("identity.endpoint", url));
    }
    if let Some(key) = lookup("SUPABASE_ANON_KEY") {
        overrides.push(("store.api_key", key.clone()));
        overrides.push(("identity.api_key", key));
    }

    overrides
}

/// Legacy deployment variables as a configuration layer. They outrank the
/// config files and are outranked by `BOOKSHELF_*`.
#[derive(Debug, Clone)]
struct LegacyVariables(Vec<(&'static str, String)>);

impl config::Source for LegacyVariables {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let origin = "legacy environment".to_string();
        Ok(self
            .0
            .iter()
            .map(|(key, value)| {
                (
                    key.to_string(),
                    config::Value::new(Some(&origin), value.as_str()),
                )
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    /// No timeout is applied when unset.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: None,
        }
    }
}

/// PostgREST-compatible table store holding the books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "StoreSettings::default_table")]
    pub table: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl StoreSettings {
    fn default_table() -> String {
        "books".to_string()
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            table: Self::default_table(),
            timeout_ms: None,
        }
    }
}

/// GoTrue-compatible identity provider resolving bearer tokens to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_ms: None,
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:54321".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `tracing_subscriber` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
