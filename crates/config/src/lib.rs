//! Configuration loading, validation, and management for Vouch.
//!
//! Loads configuration from `~/.vouch/config.toml` with environment
//! variable overrides. Validates all settings at startup; the result is
//! read once and shared immutably for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vouch/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Kill-switch for every model-backed route
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upstream API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upstream model provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Daily token budget
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Per-caller and per-session request limits
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where portfolio content is loaded from
    #[serde(default)]
    pub content: ContentConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("budget", &self.budget)
            .field("rate_limit", &self.rate_limit)
            .field("gateway", &self.gateway)
            .field("content", &self.content)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider label used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// OpenAI-compatible base URL (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upstream request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_provider_name() -> String {
    "groq".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum tokens consumed per UTC day (minimum 1)
    #[serde(default = "default_daily_token_budget")]
    pub daily_token_budget: u64,
}

fn default_daily_token_budget() -> u64 {
    120_000
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_token_budget: default_daily_token_budget(),
        }
    }
}

/// Upper bound for every rate-limit duration: 30 days.
pub const MAX_RATE_LIMIT_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sliding window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Requests allowed per identity within one window
    #[serde(default = "default_window_limit")]
    pub window_limit: u32,

    /// Requests allowed per session within one session lifetime
    #[serde(default = "default_session_limit")]
    pub session_limit: u32,

    #[serde(default = "default_session_lifetime_secs")]
    pub session_lifetime_secs: u64,

    /// Penalty applied when an identity exceeds the window limit
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Key for hashing caller network identities
    #[serde(default = "default_salt")]
    pub salt: String,
}

fn default_window_secs() -> u64 {
    600
}
fn default_window_limit() -> u32 {
    8
}
fn default_session_limit() -> u32 {
    20
}
fn default_session_lifetime_secs() -> u64 {
    86_400
}
fn default_cooldown_secs() -> u64 {
    60
}
fn default_salt() -> String {
    "vouch-default-salt".into()
}

impl std::fmt::Debug for RateLimitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitConfig")
            .field("window_secs", &self.window_secs)
            .field("window_limit", &self.window_limit)
            .field("session_limit", &self.session_limit)
            .field("session_lifetime_secs", &self.session_lifetime_secs)
            .field("cooldown_secs", &self.cooldown_secs)
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            window_limit: default_window_limit(),
            session_limit: default_session_limit(),
            session_lifetime_secs: default_session_lifetime_secs(),
            cooldown_secs: default_cooldown_secs(),
            salt: default_salt(),
        }
    }
}

impl RateLimitConfig {
    /// True when the hashing salt is still the shipped default.
    pub fn uses_default_salt(&self) -> bool {
        self.salt == default_salt()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content root; defaults to `~/.vouch/content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl ContentConfig {
    /// The effective content root.
    pub fn root_dir(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("content"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.vouch/config.toml).
    ///
    /// Environment variables override the file:
    /// - `VOUCH_ENABLED` (`0`/`false`/`off` disable)
    /// - `VOUCH_API_KEY`, then `GROQ_API_KEY`
    /// - `VOUCH_MODEL`
    /// - `VOUCH_DAILY_TOKEN_BUDGET`
    /// - `VOUCH_REQUEST_TIMEOUT_MS`
    /// - `VOUCH_RATE_LIMIT_SALT`
    /// - `VOUCH_CONTENT_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Unparseable numeric values are ignored with a warning; budgets and
    /// timeouts below 1 are raised to 1.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("VOUCH_ENABLED") {
            self.enabled = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }

        if let Some(key) = lookup("VOUCH_API_KEY").or_else(|| lookup("GROQ_API_KEY")) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Some(model) = lookup("VOUCH_MODEL") {
            let model = model.trim();
            if !model.is_empty() {
                self.provider.model = model.to_string();
            }
        }

        if let Some(raw) = lookup("VOUCH_DAILY_TOKEN_BUDGET") {
            match raw.trim().parse::<i64>() {
                Ok(v) => self.budget.daily_token_budget = v.max(1) as u64,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid VOUCH_DAILY_TOKEN_BUDGET"),
            }
        }

        if let Some(raw) = lookup("VOUCH_REQUEST_TIMEOUT_MS") {
            match raw.trim().parse::<i64>() {
                Ok(v) => self.provider.request_timeout_ms = v.max(1) as u64,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid VOUCH_REQUEST_TIMEOUT_MS"),
            }
        }

        if let Some(salt) = lookup("VOUCH_RATE_LIMIT_SALT") {
            if !salt.is_empty() {
                self.rate_limit.salt = salt;
            }
        }

        if let Some(dir) = lookup("VOUCH_CONTENT_DIR") {
            if !dir.trim().is_empty() {
                self.content.root = Some(PathBuf::from(dir.trim()));
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vouch")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.daily_token_budget < 1 {
            return Err(ConfigError::ValidationError(
                "budget.daily_token_budget must be at least 1".into(),
            ));
        }

        if self.provider.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_ms must be > 0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let limits = &self.rate_limit;
        if limits.window_secs == 0
            || limits.window_limit == 0
            || limits.session_limit == 0
            || limits.session_lifetime_secs == 0
        {
            return Err(ConfigError::ValidationError(
                "rate_limit windows and limits must be > 0".into(),
            ));
        }

        if limits.cooldown_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.cooldown_secs must be > 0".into(),
            ));
        }

        for (field, secs) in [
            ("window_secs", limits.window_secs),
            ("session_lifetime_secs", limits.session_lifetime_secs),
            ("cooldown_secs", limits.cooldown_secs),
        ] {
            if secs > MAX_RATE_LIMIT_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "rate_limit.{field} must be at most {MAX_RATE_LIMIT_SECS}"
                )));
            }
        }

        if limits.salt.is_empty() {
            return Err(ConfigError::ValidationError(
                "rate_limit.salt must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an upstream API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            provider: ProviderSettings::default(),
            budget: BudgetConfig::default(),
            rate_limit: RateLimitConfig::default(),
            gateway: GatewayConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.enabled);
        assert_eq!(config.budget.daily_token_budget, 120_000);
        assert_eq!(config.rate_limit.window_limit, 8);
        assert_eq!(config.rate_limit.session_limit, 20);
        assert_eq!(config.provider.model, "llama-3.1-8b-instant");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("gsk_live_secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("gsk_live_secret"));
        assert!(!debug.contains("vouch-default-salt"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gateway.port, 42618);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "enabled = false\n[budget]\ndaily_token_budget = 5000\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.budget.daily_token_budget, 5000);
        assert_eq!(config.rate_limit.cooldown_secs, 60);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "enabled = \"maybe\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn zero_budget_rejected() {
        let mut config = AppConfig::default();
        config.budget.daily_token_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rate_limit_durations_bounded() {
        let mut config = AppConfig::default();
        config.rate_limit.session_lifetime_secs = MAX_RATE_LIMIT_SECS;
        assert!(config.validate().is_ok());

        config.rate_limit.session_lifetime_secs = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session_lifetime_secs"));

        let mut config = AppConfig::default();
        config.rate_limit.window_secs = MAX_RATE_LIMIT_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rate_limit.cooldown_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cooldown_secs"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("VOUCH_ENABLED", "false"),
            ("GROQ_API_KEY", "gsk_test"),
            ("VOUCH_MODEL", "llama-3.3-70b-versatile"),
            ("VOUCH_DAILY_TOKEN_BUDGET", "-5"),
            ("VOUCH_REQUEST_TIMEOUT_MS", "8000"),
            ("VOUCH_RATE_LIMIT_SALT", "pepper"),
            ("VOUCH_CONTENT_DIR", "/srv/content"),
        ]));

        assert!(!config.enabled);
        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.provider.model, "llama-3.3-70b-versatile");
        assert_eq!(config.budget.daily_token_budget, 1);
        assert_eq!(config.provider.request_timeout_ms, 8000);
        assert_eq!(config.rate_limit.salt, "pepper");
        assert_eq!(config.content.root_dir(), PathBuf::from("/srv/content"));
    }

    #[test]
    fn vouch_key_wins_over_groq_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("VOUCH_API_KEY", "primary"), ("GROQ_API_KEY", "secondary")]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn invalid_numeric_env_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("VOUCH_DAILY_TOKEN_BUDGET", "lots")]));
        assert_eq!(config.budget.daily_token_budget, 120_000);
    }

    #[test]
    fn blank_api_key_is_not_a_key() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama-3.1-8b-instant"));
        assert!(toml_str.contains("120000"));
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, 42618);
    }
}
