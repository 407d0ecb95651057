//! hookcat binary entry point.
//!
//! Usage: some-command | hookcat [-u <url>] [-1] [-v] [-c <config.yaml>]

use clap::Parser;
use hookcat::config::WEBHOOK_URL_ENV;
use hookcat::logging::init_logging;
use hookcat::shutdown::shutdown_token;
use hookcat::{exit_code, Config, ConfigSources, Pipeline};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{debug, error, info, warn};

/// hookcat: echo stdin to stdout and post it to a Discord webhook.
#[derive(Parser, Debug)]
#[command(name = "hookcat", version)]
#[command(about = "Tee stdin to a Discord webhook")]
struct Args {
    /// Webhook URL. Falls back to DISCORD_WEBHOOK_URL, then the config file.
    #[arg(short = 'u', long)]
    webhook_url: Option<String>,

    /// Send each line as its own message instead of batching all input.
    #[arg(short = '1', long)]
    one_line: bool,

    /// Log delivery progress and print metrics at the end.
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let code = run(args).await;

    // A pending stdin read cannot be cancelled; exit without waiting for it.
    std::process::exit(code)
}

async fn run(args: Args) -> i32 {
    let config = match Config::resolve(ConfigSources {
        webhook_url_flag: args.webhook_url,
        webhook_url_env: std::env::var(WEBHOOK_URL_ENV).ok(),
        config_file: args.config,
        one_line: args.one_line,
        verbose: args.verbose,
    }) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return 1;
        }
    };

    match config.destination() {
        Some(_) => debug!(
            one_line = config.one_line,
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.max_retries,
            "Configuration loaded"
        ),
        None => warn!("No webhook URL configured, input will only be echoed"),
    }

    if std::io::stdin().is_terminal() {
        error!("No input piped to stdin");
        return 1;
    }

    let mut pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            return 1;
        }
    };

    let result = pipeline
        .run(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            shutdown_token(),
        )
        .await;

    let code = exit_code(&result, config.verbose);
    match &result {
        Ok(()) if config.verbose => {
            let metrics = pipeline.metrics();
            info!(
                messages_sent = metrics.messages_sent,
                errors = metrics.messages_failed,
                bytes_sent = metrics.bytes_sent,
                "Run complete"
            );
        }
        Err(e) if code != 0 => error!(error = %e, "Processing failed"),
        _ => {}
    }
    code
}
