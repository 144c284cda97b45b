//! termfolio - A portfolio you visit from a terminal
//!
//! termfolio serves an animated home screen over a character-mode telnet
//! connection. Four shapes bounce around a tiled background phrase, each one
//! linked to a content page. When a visitor leaves, the session is classified
//! (scanner or human) and, outside the per-address cool-downs, announced on a
//! webhook.
//!
//! # Quick Start
//!
//! ```text
//! termfolio                      # Listen on 0.0.0.0:2323
//! termfolio -p 2222              # Custom port
//! DISCORD_WEBHOOK=https://... termfolio
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | 1-4 | Open page |
//! | b / Esc | Back to home |
//! | q / Ctrl+C | Quit |

mod config;
mod core;
mod server;
mod ui;
mod visitor;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::core::{AnimationSettings, PageTable};
use crate::server::{Server, SessionContext};
use crate::ui::ViewConfig;
use crate::visitor::{Cooldowns, HttpGeoLookup, RateLimiter, VisitorWatch, WebhookSink};

/// Command line options; anything unset comes from the config file
#[derive(Debug, Default)]
struct Args {
    bind: Option<String>,
    port: Option<u16>,
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("termfolio {}", VERSION);
}

fn print_help() {
    eprintln!("termfolio {} - A portfolio you visit from a terminal", VERSION);
    eprintln!();
    eprintln!("Usage: termfolio [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -b, --bind <ADDR>     Address to listen on (default: 0.0.0.0)");
    eprintln!("  -p, --port <PORT>     Port to listen on (default: 2323)");
    eprintln!("  -c, --config <FILE>   Config file (default: ~/.termfolio/config.toml)");
    eprintln!("  --log-file <FILE>     Write logs to a file instead of stderr");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {:<22}Webhook for visitor notifications", config::WEBHOOK_ENV);
    eprintln!("  RUST_LOG              Log filter (default: info)");
    eprintln!();
    eprintln!("Connect with: telnet <host> 2323");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| format!("{} requires a value", flag))
    };

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-b" | "--bind" => {
                i += 1;
                parsed.bind = Some(value(i, "--bind")?);
            }
            "-p" | "--port" => {
                i += 1;
                let port = value(i, "--port")?;
                parsed.port = Some(
                    port.parse()
                        .map_err(|_| format!("Invalid port: {}", port))?,
                );
            }
            "-c" | "--config" => {
                i += 1;
                parsed.config = Some(PathBuf::from(value(i, "--config")?));
            }
            "--log-file" => {
                i += 1;
                parsed.log_file = Some(PathBuf::from(value(i, "--log-file")?));
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging(args.log_file.as_ref())?;
    info!("termfolio {} starting...", VERSION);

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    config.apply_env();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let view = ViewConfig {
        pages: PageTable::with_overrides(&config.pages),
        theme: config.theme.clone(),
        phrase: config.animation.background_phrase.clone(),
    };

    let visitor = &config.visitor;
    if visitor.webhook_url.is_none() {
        info!("no webhook configured, visitor notifications disabled");
    }
    let limiter = Arc::new(RateLimiter::new(Cooldowns::from(visitor)));
    let geo = HttpGeoLookup::new(visitor.geo_endpoint.clone(), visitor.geo_timeout())?;
    let sink = WebhookSink::new(visitor.webhook_url.clone(), visitor.notify_timeout())?;
    let watch = VisitorWatch::new(visitor, limiter, Arc::new(geo), Arc::new(sink));

    let ctx = SessionContext {
        view,
        settings: AnimationSettings::from(&config.animation),
        watch: Arc::new(watch),
    };

    Server::new(config.server.clone(), ctx)
        .run(shutdown_signal())
        .await
}
