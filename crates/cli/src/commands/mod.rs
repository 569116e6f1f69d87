pub mod ask;
pub mod classify;
pub mod config_cmd;
pub mod intents;
pub mod serve;

use anyhow::{Context, bail};
use std::sync::Arc;
use steward_config::AppConfig;
use steward_core::provider::Provider;
use steward_core::store::DataStore;
use steward_pipeline::{Pipeline, default_registry};
use steward_store::{InMemoryStore, SqliteStore};

/// Providers that run locally and need no API key.
const LOCAL_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

pub fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load config")
}

/// Open the store backend named in the config.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DataStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "sqlite" => {
            let store = SqliteStore::new(&config.store.path)
                .await
                .with_context(|| format!("Failed to open SQLite store at {}", config.store.path))?;
            Ok(Arc::new(store))
        }
        other => bail!("Unknown store backend '{other}' (expected \"memory\" or \"sqlite\")"),
    }
}

/// The default provider, or a clear error when it cannot be used.
pub fn default_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn Provider>> {
    if !config.has_api_key() && !LOCAL_PROVIDERS.contains(&config.default_provider.as_str()) {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    STEWARD_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let router = steward_providers::router::build_from_config(config);
    router
        .default()
        .with_context(|| format!("No provider registered as '{}'", config.default_provider))
}

pub fn build_pipeline(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    store: Arc<dyn DataStore>,
) -> anyhow::Result<Pipeline> {
    let registry = default_registry().context("Failed to build intent registry")?;
    Ok(Pipeline::new(config, provider, store, registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".into();
        let err = open_store(&config).await.err().unwrap();
        assert!(err.to_string().contains("postgres"));
    }

    #[tokio::test]
    async fn sqlite_backend_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.store.backend = "sqlite".into();
        config.store.path = dir.path().join("steward.db").display().to_string();
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.count("invoices").await.unwrap(), 0);
    }

    #[test]
    fn local_provider_needs_no_key() {
        let mut config = AppConfig::default();
        config.api_key = None;
        config.default_provider = "ollama".into();
        assert!(default_provider(&config).is_ok());

        config.default_provider = "openrouter".into();
        assert!(default_provider(&config).is_err());
    }
}
