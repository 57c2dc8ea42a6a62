use anyhow::Result;
use clap::{Parser, Subcommand};
use srp_mcp::compaction::EvaluationStatus;
use srp_mcp::{config, hook, server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "srp-mcp", version, about = "Structured notes and compaction MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on: stdio or http (overrides config)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Evaluate one pre-compaction payload read from stdin and print the result
    PreCompact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::SrpConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and hook output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            if let Some(t) = transport {
                config.server.transport = t;
            }
            server::serve(config).await?;
        }
        Command::PreCompact => {
            let evaluator = server::build_evaluator(&config)?;
            let status = hook::run_pre_compact(&evaluator, std::io::stdin().lock(), std::io::stdout().lock())?;
            if status == EvaluationStatus::Error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
