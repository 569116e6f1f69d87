//! `steward serve` — Start the HTTP API server.

use std::sync::Arc;
use steward_store::fixtures::seed_demo;

/// User id the demo conversation history is seeded under.
const DEMO_USER: &str = "demo-user";

pub async fn run(port_override: Option<u16>, demo: Option<String>) -> anyhow::Result<()> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let provider = super::default_provider(&config)?;
    let store = super::open_store(&config).await?;

    if let Some(business) = demo.as_deref() {
        if config.store.backend == "memory" {
            seed_demo(store.as_ref(), business, DEMO_USER).await?;
        } else {
            eprintln!("  --demo only seeds the memory backend; ignoring");
        }
    }

    let pipeline = Arc::new(super::build_pipeline(&config, provider, store)?);

    println!("Steward Gateway");
    println!("   Listening:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:    {} ({})", pipeline.provider_name(), config.default_model);
    println!("   Store:       {}", config.store.backend);
    println!("   Intents:     {}", pipeline.registry().len());

    steward_gateway::start(&config, pipeline)
        .await
        .map_err(|e| anyhow::anyhow!("Gateway failed: {e}"))?;

    Ok(())
}
