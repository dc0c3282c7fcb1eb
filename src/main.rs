use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "bugboard")]
#[command(version, about = "Client for the BugBoard AI bug reporting service")]
pub struct Cli {
    /// Name identifying the reporting agent (or BUGBOARD_AGENT)
    #[arg(long, global = true)]
    pub agent_name: Option<String>,

    /// Base URL of the BugBoard API (or BUGBOARD_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a bug report directly
    Report {
        /// What the agent was asked to do
        #[arg(long)]
        input: String,

        /// Log output to attach ("-" reads stdin)
        #[arg(long)]
        logs: String,

        /// Error message, if any
        #[arg(long)]
        error: Option<String>,
    },
    /// Watch agent output on stdin and auto-report stuck patterns
    Watch {
        /// Regex marking a line as a build failure
        #[arg(long, default_value = "(?i)build failed")]
        failure_pattern: String,

        /// Inactivity window in milliseconds before the agent counts as hung
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "bugboard=debug" } else { "bugboard=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cmd::resolve_config(cli.agent_name.as_deref(), cli.api_url.as_deref())?;

    match &cli.command {
        Commands::Report { input, logs, error } => {
            cmd::cmd_report(config, input, logs, error.as_deref()).await?;
        }
        Commands::Watch {
            failure_pattern,
            timeout_ms,
        } => {
            cmd::cmd_watch(config, failure_pattern, *timeout_ms).await?;
        }
    }

    Ok(())
}
