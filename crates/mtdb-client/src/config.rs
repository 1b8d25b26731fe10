//! Client configuration with environment and YAML support

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Environment variable names read by [`ClientConfig::from_env`]
pub mod env {
    pub const HOST: &str = "MTDB_HOST";
    pub const USERNAME: &str = "MTDB_USERNAME";
    pub const PASSWORD: &str = "MTDB_PASSWORD";
    pub const BASE_PATH: &str = "MTDB_BASE_PATH";
    pub const API_VERSION: &str = "MTDB_API_VERSION";
    pub const ADMIN_KEY: &str = "MTDB_ADMIN_KEY";
    pub const LOG_LEVEL: &str = "MTDB_LOG_LEVEL";
    pub const MAX_RETRIES: &str = "MTDB_MAX_RETRIES";
    pub const BACKOFF_FACTOR: &str = "MTDB_BACKOFF_FACTOR";
    pub const CACHE_DIR: &str = "MTDB_CACHE_DIR";
    pub const CACHE_NAME: &str = "MTDB_CACHE_NAME";
    pub const CACHE_TTL_SECS: &str = "MTDB_CACHE_TTL_SECS";
}

/// Client configuration
///
/// Can be loaded from the environment, from YAML, or constructed
/// programmatically with [`ClientConfig::builder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection and credential settings
    pub connection: ConnectionConfig,

    /// Retry/backoff for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Data-point cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// What name/number lookups do when several records match
    #[serde(default)]
    pub match_policy: MatchPolicy,

    /// Default log filter for front ends (e.g. "info", "mtdb_client=debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Connection configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Scheme and authority of the server (e.g. "https://mtdb.example.org")
    pub host: String,

    /// Path prefix in front of the API version
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    pub username: String,

    pub password: String,

    /// Administrative key allowing writes to read-only records
    #[serde(default)]
    pub admin_key: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("base_path", &self.base_path)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_base_path() -> String {
    "api".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sleep before retry n is `backoff_factor * 2^(n-1)` seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single backoff sleep in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// HTTP statuses treated as transient
    #[serde(default = "default_status_forcelist")]
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            max_backoff_ms: default_max_backoff(),
            status_forcelist: default_status_forcelist(),
        }
    }
}

impl RetryConfig {
    /// Sleep before the given retry (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        if self.backoff_factor <= 0.0 || retry == 0 {
            return Duration::ZERO;
        }
        let secs = self.backoff_factor * 2f64.powi(retry.saturating_sub(1).min(30) as i32);
        let max = Duration::from_millis(self.max_backoff_ms);
        Duration::try_from_secs_f64(secs).map_or(max, |d| d.min(max))
    }

    /// Whether a response status should be retried
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_max_backoff() -> u64 {
    120_000 // 2 minutes
}

fn default_status_forcelist() -> Vec<u16> {
    vec![502, 503, 504]
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// General request timeout in milliseconds (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,

    /// Connect timeout in milliseconds (default: 10s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_timeout(),
            connect_ms: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_connect_timeout() -> u64 {
    10_000 // 10 seconds
}

/// Data-point cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache reads of data/statistics endpoints
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Keep the cache in a file between runs
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Store name (file stem)
    #[serde(default = "default_cache_name")]
    pub name: String,

    /// Store directory (default: platform cache dir + "/mtdb")
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Entry lifetime in seconds (default: 7 days)
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            persist: true,
            name: default_cache_name(),
            dir: None,
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Directory the store lives in
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Full path of the persisted store
    pub fn path(&self) -> PathBuf {
        store_path(&self.resolved_dir(), &self.name)
    }
}

/// File a cache store named `name` uses inside `dir`
pub fn store_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

/// Platform cache directory for mtdb
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mtdb")
}

fn default_true() -> bool {
    true
}

fn default_cache_name() -> String {
    "mtdb_cache".to_string()
}

fn default_cache_ttl() -> u64 {
    7 * 24 * 60 * 60
}

/// Behavior of name/number lookups that match several records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Log a warning and use the first record in server order
    #[default]
    WarnFirst,
    /// Fail with [`ClientError::Ambiguous`]
    Strict,
}

impl FromStr for MatchPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "warn_first" | "warn" => Ok(Self::WarnFirst),
            "strict" => Ok(Self::Strict),
            other => Err(ClientError::Config(format!("unknown match policy '{}'", other))),
        }
    }
}

impl ClientConfig {
    /// Resolve configuration from `MTDB_*` environment variables
    ///
    /// Fails if host, username or password is missing.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder(required(env::HOST)?)
            .credentials(required(env::USERNAME)?, required(env::PASSWORD)?);

        if let Some(base_path) = optional(env::BASE_PATH) {
            builder = builder.base_path(base_path);
        }
        if let Some(version) = optional(env::API_VERSION) {
            builder = builder.api_version(version);
        }
        if let Some(key) = optional(env::ADMIN_KEY) {
            builder = builder.admin_key(key);
        }
        if let Some(level) = optional(env::LOG_LEVEL) {
            builder = builder.log_level(level);
        }
        if let Some(retries) = parsed::<u32>(env::MAX_RETRIES)? {
            builder = builder.max_retries(retries);
        }
        if let Some(factor) = parsed::<f64>(env::BACKOFF_FACTOR)? {
            builder = builder.backoff_factor(factor);
        }
        if let Some(dir) = optional(env::CACHE_DIR) {
            builder = builder.cache_dir(dir);
        }
        if let Some(name) = optional(env::CACHE_NAME) {
            builder = builder.cache_name(name);
        }
        if let Some(ttl) = parsed::<u64>(env::CACHE_TTL_SECS)? {
            builder = builder.cache_ttl(Duration::from_secs(ttl));
        }

        Ok(builder.build())
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Create a builder for programmatic configuration
    pub fn builder(host: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(host)
    }

    /// `host/base_path/version/`
    pub fn api_root(&self) -> String {
        format!("{}/", self.join_segments(&[&self.connection.api_version]))
    }

    /// `host/base_path/auth/token`
    pub fn auth_url(&self) -> String {
        self.join_segments(&["auth", "token"])
    }

    fn join_segments(&self, tail: &[&str]) -> String {
        let mut url = self.connection.host.trim_end_matches('/').to_string();
        let base = self.connection.base_path.trim_matches('/');
        for segment in std::iter::once(base).chain(tail.iter().map(|s| s.trim_matches('/'))) {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String> {
    optional(name).ok_or_else(|| {
        ClientError::Config(format!("required environment variable {} is not set", name))
    })
}

fn parsed<T: FromStr>(name: &'static str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    optional(name)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|e| ClientError::Config(format!("invalid {}='{}': {}", name, v, e)))
        })
        .transpose()
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                connection: ConnectionConfig {
                    host: host.into(),
                    base_path: default_base_path(),
                    api_version: default_api_version(),
                    username: String::new(),
                    password: String::new(),
                    admin_key: None,
                },
                retry: RetryConfig::default(),
                timeouts: TimeoutsConfig::default(),
                cache: CacheConfig::default(),
                match_policy: MatchPolicy::default(),
                log_level: None,
            },
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.connection.username = username.into();
        self.config.connection.password = password.into();
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.connection.base_path = base_path.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.connection.api_version = version.into();
        self
    }

    pub fn admin_key(mut self, key: impl Into<String>) -> Self {
        self.config.connection.admin_key = Some(key.into());
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.config.retry.backoff_factor = factor;
        self
    }

    pub fn retry_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.config.retry.status_forcelist = statuses.into();
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.dir = Some(dir.into());
        self
    }

    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.config.cache.name = name.into();
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.ttl_secs = ttl.as_secs();
        self
    }

    /// Persist the cache in `dir` between runs
    pub fn persistent_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.persist = true;
        self.config.cache.dir = Some(dir.into());
        self
    }

    /// Keep cached entries in memory only
    pub fn in_memory_cache(mut self) -> Self {
        self.config.cache.persist = false;
        self
    }

    /// Disable the data-point cache entirely
    pub fn no_cache(mut self) -> Self {
        self.config.cache.enabled = false;
        self
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.config.match_policy = policy;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = Some(level.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
