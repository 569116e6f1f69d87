//! `steward ask` — Run a single turn and print the response envelope.

use clap::Args;
use steward_core::request::{ChatRequest, Hints};
use steward_store::fixtures::seed_demo;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// User id
    #[arg(long)]
    pub user: String,

    /// Business (tenant) id
    #[arg(long)]
    pub business: String,

    /// Current client route, e.g. /finance/overview
    #[arg(long)]
    pub route: Option<String>,

    /// Force an intent by key, skipping scoring
    #[arg(long)]
    pub intent: Option<String>,

    /// Conversation thread id
    #[arg(long)]
    pub thread: Option<String>,

    /// Seed demo records for this user and business first (memory backend only)
    #[arg(long)]
    pub demo: bool,

    pub message: String,
}

impl AskArgs {
    pub fn into_request(self) -> ChatRequest {
        let mut request = ChatRequest::new(self.user, self.business, self.message);
        request.route = self.route;
        request.intent = self.intent;
        if let Some(thread) = self.thread {
            request = request.with_hints(Hints::thread(thread));
        }
        request
    }
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let provider = super::default_provider(&config)?;
    let store = super::open_store(&config).await?;

    if args.demo {
        if config.store.backend == "memory" {
            seed_demo(store.as_ref(), &args.business, &args.user).await?;
        } else {
            eprintln!("  --demo only seeds the memory backend; ignoring");
        }
    }

    let pipeline = super::build_pipeline(&config, provider, store)?;

    // Ctrl-C abandons the model call instead of killing the process mid-turn.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling turn");
            on_interrupt.cancel();
        }
    });

    let envelope = pipeline
        .handle_with_cancel(args.into_request(), cancel)
        .await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
