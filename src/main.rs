use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use padscope::config::AppConfig;
use padscope::formatter::JsonFormatter;
use padscope::Collector;

/// Loads one site's well pad data and prints it as JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Site profile (YAML)
    #[arg(short, long, env = "PADSCOPE_PROFILE", default_value = "./profiles/site.yaml")]
    profile: String,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::new(level.as_str())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&args.profile)?;
    info!(
        profile = %config.profile.name,
        host = %config.server().api_host_name,
        keys = config.mapping().len(),
        "profile loaded"
    );

    let collector = Collector::http(config.settings.clone()).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = collector
        .load_groups(config.server(), config.mapping(), cancel)
        .await;
    info!(provenance = ?result.provenance, groups = result.groups.len(), "load finished");

    let json = if args.compact {
        JsonFormatter::to_json_compact(&result)?
    } else {
        JsonFormatter::to_json_string(&result)?
    };
    println!("{}", json);

    Ok(())
}
