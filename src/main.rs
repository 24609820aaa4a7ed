//! mockdir - CLI entry point.

use anyhow::Result;
use clap::Parser;
use mockdir::{DelayConfig, RoutingMode, ServerConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mockdir",
    about = "Directory-backed mock HTTP server with live cache invalidation",
    version
)]
struct Args {
    /// Path to a YAML configuration file (overrides the flags below)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory whose files are served as responses
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Response delay in milliseconds
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Unescape the query string in request log lines
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    request_query_unescape: bool,

    /// Render responses as Handlebars templates against the JSON request body
    #[arg(long)]
    template: bool,

    /// Walk the data directory at startup and serve only enumerated routes
    #[arg(long)]
    enumerate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print default config if requested
    if args.print_config {
        println!("{}", serde_yaml::to_string(&ServerConfig::default())?);
        return Ok(());
    }

    // Load configuration
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ServerConfig::from_file(path)?
        }
        None => ServerConfig {
            data_dir: args.data,
            port: args.port,
            delay: DelayConfig::fixed(args.delay),
            unescape_request_query: args.request_query_unescape,
            template: args.template,
            routing: if args.enumerate {
                RoutingMode::Enumerated
            } else {
                RoutingMode::Direct
            },
        },
    };
    config.validate()?;

    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    // The data root must exist and be a directory before the core starts.
    let meta = std::fs::metadata(&config.data_dir)
        .map_err(|_| anyhow::anyhow!("no such data directory: {}", config.data_dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("not a directory: {}", config.data_dir.display());
    }
    // Canonicalize so cache keys and watcher event paths agree.
    config.data_dir = config.data_dir.canonicalize()?;

    info!(port = config.port, data_dir = %config.data_dir.display(), "starting mock server");
    mockdir::server::run(config).await
}
