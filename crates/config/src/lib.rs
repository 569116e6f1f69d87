//! Configuration loading, validation, and management for Steward.
//!
//! Loads configuration from `~/.steward/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Every hand-tuned pipeline constant (classifier bonuses, ambiguity
//! thresholds, cache TTL, pruning caps) lives here rather than in code.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use steward_core::request::{Depth, StyleFamily};

/// The root configuration structure.
///
/// Maps directly to `~/.steward/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Deployment environment; production suppresses fault detail
    #[serde(default)]
    pub environment: Environment,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Data store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Request pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    1024
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
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("environment", &self.environment)
            .field("providers", &self.providers)
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" or "sqlite"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "memory".into()
}
fn default_store_path() -> String {
    "steward.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

/// Tuning for every pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub prune: PruneConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub persona: PersonaConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default)]
    pub invoke: InvokeConfig,
}

/// Classifier weights and thresholds.
///
/// The defaults are hand-tuned and carry no documented derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Bonus for intents in the category implied by the current route
    #[serde(default = "default_route_bonus")]
    pub route_bonus: f64,

    /// Bonus for email-tagged intents when a thread/account id is present
    #[serde(default = "default_continuity_bonus")]
    pub continuity_bonus: f64,

    /// Max gap between top and runner-up that still counts as ambiguous
    #[serde(default = "default_ambiguity_gap")]
    pub ambiguity_gap: f64,

    /// Runner-up must score at least this for ambiguity to apply
    #[serde(default = "default_ambiguity_floor")]
    pub ambiguity_floor: f64,

    /// Top score at or below this falls through to the first-match scan
    #[serde(default)]
    pub resolve_floor: f64,

    /// Intent used when nothing matches
    #[serde(default = "default_fallback_intent")]
    pub fallback_intent: String,

    /// Route category table (path fragment → intent set)
    #[serde(default = "default_route_categories")]
    pub categories: Vec<RouteCategory>,
}

fn default_route_bonus() -> f64 {
    0.35
}
fn default_continuity_bonus() -> f64 {
    0.3
}
fn default_ambiguity_gap() -> f64 {
    0.15
}
fn default_ambiguity_floor() -> f64 {
    0.8
}
fn default_fallback_intent() -> String {
    "general".into()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            route_bonus: default_route_bonus(),
            continuity_bonus: default_continuity_bonus(),
            ambiguity_gap: default_ambiguity_gap(),
            ambiguity_floor: default_ambiguity_floor(),
            resolve_floor: 0.0,
            fallback_intent: default_fallback_intent(),
            categories: default_route_categories(),
        }
    }
}

/// One row of the route category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCategory {
    /// Category name, doubling as the persona module key
    pub name: String,

    /// A route containing any of these fragments belongs to the category
    pub path_fragments: Vec<String>,

    /// Intent keys that receive the route bonus
    pub intents: Vec<String>,
}

impl RouteCategory {
    fn new(name: &str, fragments: &[&str], intents: &[&str]) -> Self {
        Self {
            name: name.into(),
            path_fragments: fragments.iter().map(|s| s.to_string()).collect(),
            intents: intents.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether a route path belongs to this category.
    pub fn matches_route(&self, route: &str) -> bool {
        let route = route.to_ascii_lowercase();
        self.path_fragments
            .iter()
            .any(|f| route.contains(&f.to_ascii_lowercase()))
    }
}

fn default_route_categories() -> Vec<RouteCategory> {
    vec![
        RouteCategory::new(
            "finance",
            &["/finance", "/invoices", "/receivables", "/banking", "/cash"],
            &["ar_aging", "cash_flow", "revenue_summary", "expense_breakdown"],
        ),
        RouteCategory::new(
            "marketing",
            &["/marketing", "/campaigns"],
            &["campaign_performance"],
        ),
        RouteCategory::new("tax", &["/tax"], &["tax_deadlines"]),
        RouteCategory::new(
            "calendar",
            &["/calendar", "/schedule"],
            &["schedule_meeting"],
        ),
        RouteCategory::new(
            "inbox",
            &["/inbox", "/email", "/mail"],
            &["email_triage", "email_reply"],
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl() -> u64 {
    60
}
fn default_cache_entries() -> usize {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneConfig {
    /// Strings longer than this (in chars) are cut, ellipsis included
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,

    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_string_len() -> usize {
    1200
}
fn default_max_array_len() -> usize {
    40
}
fn default_max_depth() -> usize {
    8
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            max_string_len: default_max_string_len(),
            max_array_len: default_max_array_len(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Most recent N messages included in the baseline context
    #[serde(default = "default_history_window")]
    pub window: usize,

    /// Store collection holding conversation messages
    #[serde(default = "default_history_collection")]
    pub collection: String,
}

fn default_history_window() -> usize {
    12
}
fn default_history_collection() -> String {
    "messages".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window: default_history_window(),
            collection: default_history_collection(),
        }
    }
}

/// Default persona dial positions (each clamped to 0..=10 at use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_dial")]
    pub humor: i32,
    #[serde(default = "default_dial")]
    pub energy: i32,
    #[serde(default = "default_dial")]
    pub brevity: i32,
    #[serde(default = "default_dial")]
    pub optimism: i32,
}

fn default_dial() -> i32 {
    5
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            humor: default_dial(),
            energy: default_dial(),
            brevity: default_dial(),
            optimism: default_dial(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub default_depth: Depth,

    #[serde(default)]
    pub default_family: StyleFamily,

    /// Surface tag → style family
    #[serde(default = "default_surfaces")]
    pub surfaces: HashMap<String, StyleFamily>,
}

fn default_surfaces() -> HashMap<String, StyleFamily> {
    HashMap::from([
        ("chat-widget".to_string(), StyleFamily::Conversational),
        ("dashboard".to_string(), StyleFamily::Structured),
    ])
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            default_depth: Depth::default(),
            default_family: StyleFamily::default(),
            surfaces: default_surfaces(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeConfig {
    /// Upper bound on a single completion call
    #[serde(default = "default_invoke_timeout")]
    pub timeout_secs: u64,

    /// Inbound messages longer than this are cut before classification
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_invoke_timeout() -> u64 {
    60
}
fn default_max_message_chars() -> usize {
    4000
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_invoke_timeout(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.steward/config.toml).
    ///
    /// Also checks environment variables:
    /// - `STEWARD_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `STEWARD_PROVIDER`, `STEWARD_MODEL`
    /// - `STEWARD_ENV` (`production` / `development`)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("STEWARD_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("STEWARD_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("STEWARD_MODEL") {
            config.default_model = model;
        }

        if let Ok(env) = std::env::var("STEWARD_ENV") {
            config.environment = match env.to_ascii_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                _ => Environment::Development,
            };
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".steward")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let classifier = &self.pipeline.classifier;
        if !(0.0..=1.0).contains(&classifier.ambiguity_gap) {
            return Err(ConfigError::ValidationError(
                "pipeline.classifier.ambiguity_gap must be between 0.0 and 1.0".into(),
            ));
        }
        if [
            classifier.ambiguity_floor,
            classifier.route_bonus,
            classifier.continuity_bonus,
            classifier.resolve_floor,
        ]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::ValidationError(
                "classifier bonuses and floors must be non-negative".into(),
            ));
        }
        if classifier.fallback_intent.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.classifier.fallback_intent must name an intent".into(),
            ));
        }

        if self.pipeline.cache.ttl_secs == 0 || self.pipeline.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.cache ttl_secs and max_entries must be > 0".into(),
            ));
        }

        let prune = &self.pipeline.prune;
        if prune.max_string_len < 2 || prune.max_array_len == 0 || prune.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.prune caps must be positive (max_string_len >= 2)".into(),
            ));
        }

        if self.pipeline.history.window > 100 {
            return Err(ConfigError::ValidationError(
                "pipeline.history.window must be <= 100".into(),
            ));
        }

        if self.pipeline.invoke.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.invoke.timeout_secs must be > 0".into(),
            ));
        }
        if self.pipeline.invoke.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.invoke.max_message_chars must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            environment: Environment::default(),
            providers: HashMap::new(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
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
