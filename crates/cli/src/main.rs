//! Steward CLI — the main entry point.
//!
//! Commands:
//! - `serve`     — Start the HTTP gateway
//! - `ask`       — Run one turn through the pipeline
//! - `classify`  — Show the intent ranking for a message
//! - `intents`   — List registered intents
//! - `config`    — Print the default, loaded or path of the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "steward",
    about = "Steward — conversational request pipeline for business assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Seed demo records for this business (memory backend only)
        #[arg(long, value_name = "BUSINESS_ID")]
        demo: Option<String>,
    },

    /// Send one message through the pipeline and print the envelope
    Ask(commands::ask::AskArgs),

    /// Rank intents for a message without calling the model
    Classify {
        /// Current client route, e.g. /finance/overview
        #[arg(long)]
        route: Option<String>,

        /// Conversation thread id
        #[arg(long)]
        thread: Option<String>,

        message: String,
    },

    /// List registered intents
    Intents,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: Option<commands::config_cmd::ConfigAction>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port, demo } => commands::serve::run(port, demo).await?,
        Commands::Ask(args) => commands::ask::run(args).await?,
        Commands::Classify {
            route,
            thread,
            message,
        } => commands::classify::run(route, thread, message)?,
        Commands::Intents => commands::intents::run()?,
        Commands::Config { action } => commands::config_cmd::run(action)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::config_cmd::ConfigAction;

    #[test]
    fn parses_ask_with_hints() {
        let cli = Cli::try_parse_from([
            "steward",
            "ask",
            "--user",
            "u1",
            "--business",
            "b1",
            "--route",
            "/finance",
            "--thread",
            "th-1",
            "how is cash flow looking",
        ])
        .unwrap();
        let Commands::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.user, "u1");
        assert_eq!(args.route.as_deref(), Some("/finance"));
        assert_eq!(args.message, "how is cash flow looking");
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["steward", "intents", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn bare_config_has_no_action() {
        let cli = Cli::try_parse_from(["steward", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: None }));

        let cli = Cli::try_parse_from(["steward", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: Some(ConfigAction::Path)
            }
        ));
    }

    #[test]
    fn ask_requires_tenant() {
        assert!(Cli::try_parse_from(["steward", "ask", "hello"]).is_err());
    }
}
