use crate::application::dashboard_service::DashboardSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default)]
    pub backend: CacheBackend,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            dir: default_cache_dir(),
            backend: CacheBackend::default(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_ending_soon_days")]
    pub ending_soon_days: i64,
    #[serde(default = "default_recent_reports")]
    pub recent_reports: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ending_soon_days: default_ending_soon_days(),
            recent_reports: default_recent_reports(),
        }
    }
}

impl From<&DashboardConfig> for DashboardSettings {
    fn from(config: &DashboardConfig) -> Self {
        DashboardSettings {
            ending_soon_days: config.ending_soon_days,
            recent_reports: config.recent_reports,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    8_000
}

fn default_ttl_secs() -> u64 {
    120
}

fn default_cache_dir() -> String {
    ".cache/dashboards".to_string()
}

fn default_ending_soon_days() -> i64 {
    30
}

fn default_recent_reports() -> usize {
    6
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// `config/dashboard.{toml,yaml,json}` if present, overridden by
/// `DASHBOARD__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from("config/dashboard")
}

pub fn load_app_config_from(file: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    anyhow::ensure!(
        config.dashboard.ending_soon_days >= 0,
        "dashboard.ending_soon_days must not be negative"
    );
    Ok(config)
}
