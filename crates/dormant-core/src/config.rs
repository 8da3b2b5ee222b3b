use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Upper bound on courses in one generation request.
pub const DEFAULT_MAX_COURSES: usize = 7;
/// Emission cap: generation stops after this many valid schedules.
pub const DEFAULT_MAX_RESULTS: usize = 500;
/// Wall-clock budget for one backtracking search.
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 7;

/// Top-level config (dormant.toml + DORMANT_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DormantConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origin for the web frontend. `None` disables CORS headers.
    #[serde(default)]
    pub frontend_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            frontend_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Limits applied by the schedule generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_max_courses")]
    pub max_courses: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
    /// Hand generated schedules to the store after responding.
    #[serde(default)]
    pub persist_generated: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_courses: DEFAULT_MAX_COURSES,
            max_results: DEFAULT_MAX_RESULTS,
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            persist_generated: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Shorter queries return an empty list without touching the cache.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_max_courses() -> usize {
    DEFAULT_MAX_COURSES
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_search_timeout_ms() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_MS
}
fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}
fn default_min_query_len() -> usize {
    DEFAULT_MIN_QUERY_LEN
}
fn default_session_ttl_hours() -> u64 {
    DEFAULT_SESSION_TTL_HOURS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.dormant/dormant.db", home)
}

impl DormantConfig {
    /// Load config from a TOML file with DORMANT_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.dormant/dormant.toml
    ///
    /// A missing file is not an error: defaults plus env overrides apply.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::DormantError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(DormantConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("DORMANT_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.dormant/dormant.toml", home)
}
