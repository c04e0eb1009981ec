//! Synth Bridge daemon
//!
//! Listens for `/synth_settings` from the Max patch, logs each snapshot to
//! CSV, and sends `max_randomizations` `/random` commands before exiting.
//!
//! Exit status is non-zero when the configuration cannot be loaded or the
//! listener cannot bind. Ctrl-C is a normal shutdown.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use synth_bridge::config::DEFAULT_CONFIG_PATH;
use synth_bridge::{BridgeConfig, Result, app, shutdown_channel};

#[derive(Parser)]
#[command(name = "synth-bridge", version)]
#[command(about = "Log synth settings from a Max patch and send it randomization commands")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    log::info!("Synth Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match BridgeConfig::load(&args.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log::error!("{}", e);
            return Err(e.into());
        }
    };
    log::info!(
        "Using config {} ({} synth params, {} randomizations)",
        args.config.display(),
        config.synth_params.len(),
        config.max_randomizations
    );

    let (trigger, signal) = shutdown_channel();
    if let Err(e) = ctrlc::set_handler(move || trigger.trigger()) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let report = match app::run(config, &signal) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Application error: {}", e);
            return Err(e);
        }
    };

    if report.interrupted {
        log::info!("Shutting down application...");
    } else {
        log::info!("Done.");
    }

    Ok(())
}
