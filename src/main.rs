use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use log::info;

use ydns_updater::config::{parse_duration, Config};
use ydns_updater::schedule::{self, TokioSleeper};
use ydns_updater::{UpdateError, Updater};

#[derive(Parser)]
#[command(name = "ydns-updater", version)]
#[command(about = "Keeps a YDNS host record pointed at this machine's address")]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "YDNS_CONFIG")]
    config: Option<PathBuf>,

    /// Base url for api calls on ydns [default: https://ydns.io/api/v1/update/]
    #[arg(long, env = "YDNS_BASE")]
    base: Option<String>,

    /// Host to update
    #[arg(long, env = "YDNS_HOST")]
    host: Option<String>,

    /// IP to update; the server uses the caller's address when omitted
    #[arg(long, env = "YDNS_IP")]
    ip: Option<String>,

    /// Record id to update
    #[arg(long = "record-id", alias = "record_id", env = "YDNS_RECORD_ID")]
    record_id: Option<String>,

    /// Username for authentication on ydns
    #[arg(long, env = "YDNS_USER")]
    user: Option<String>,

    /// Password for authentication on ydns
    #[arg(long, env = "YDNS_PASS", hide_env_values = true)]
    pass: Option<String>,

    /// Force IP family for outgoing requests: ipv4|ipv6|any [default: any]
    #[arg(long, env = "YDNS_FAMILY")]
    family: Option<String>,

    /// Keep running and update on every tick of --frequency
    #[arg(long, env = "YDNS_DAEMON", value_parser = BoolishValueParser::new())]
    daemon: bool,

    /// Sleep time between updates while in daemon mode, e.g. 60m or 1h30m [default: 60m]
    #[arg(long, env = "YDNS_FREQUENCY", value_parser = parse_duration)]
    frequency: Option<Duration>,

    /// Enable debug logging
    #[arg(long, env = "YDNS_DEBUG", value_parser = BoolishValueParser::new())]
    debug: bool,
}

impl Args {
    /// Flags and their environment fallbacks as the top settings layer.
    /// Unset booleans stay `None` so the config file can still enable them.
    fn layer(self) -> Config {
        Config {
            base: self.base,
            host: self.host,
            ip: self.ip,
            record_id: self.record_id,
            user: self.user,
            pass: self.pass,
            family: self.family,
            daemon: self.daemon.then_some(true),
            frequency: self.frequency,
            debug: self.debug.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load the config file first (before logger init)
    let config_path = args.config.clone();
    let file = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = args.layer().over(file);

    // Initialize logger with the debug switch (env var takes precedence)
    let level = if config.debug.unwrap_or(false) { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path.display());
    }

    let settings = config.into_settings()?;
    let updater = Updater::new(settings.request);

    until_interrupted(
        schedule::run(settings.schedule, &TokioSleeper, || updater.run()),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Drives `work` to completion unless `interrupt` fires first.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Result<()>
where
    W: Future<Output = Result<(), UpdateError>>,
    I: Future<Output = io::Result<()>>,
{
    tokio::select! {
        result = work => result?,
        signal = interrupt => {
            signal.context("Failed to listen for interrupt signal")?;
            info!("received interrupt, shutting down");
        }
    }

    Ok(())
}
