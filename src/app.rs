//! Process orchestration for the synth bridge
//!
//! Wires the listener, settings log and emitter together:
//!
//! ```text
//!            /synth_settings                     /random
//! Max patch ----------------> OscListener        <-------- CommandEmitter
//!                              | (detached thread)            (main path)
//!                              v
//!                        SettingsLogger -> CSV
//! ```
//!
//! The listener is bound synchronously so a bind failure aborts before any
//! command is sent, then it is moved to a detached thread that is never
//! joined. The emitter runs to completion (or interrupt) on the caller's
//! thread.

use crate::codec::{SETTINGS_ROUTE, decode_settings};
use crate::config::BridgeConfig;
use crate::emitter::{CommandEmitter, EmitReport, EmitterTiming, UdpCommandSink};
use crate::error::Result;
use crate::listener::OscListener;
use crate::logger::SettingsLogger;
use crate::router::Router;
use crate::shutdown::ShutdownSignal;
use rosc::OscMessage;
use std::sync::Arc;

/// Run the bridge with the default 10 ms / 500 ms emitter timing
pub fn run(config: Arc<BridgeConfig>, shutdown: &ShutdownSignal) -> Result<EmitReport> {
    run_with_timing(config, shutdown, EmitterTiming::default())
}

/// Run the bridge
///
/// Returns the emitter's report. Errors are startup faults only: the command
/// socket could not be created or the listener could not bind.
pub fn run_with_timing(
    config: Arc<BridgeConfig>,
    shutdown: &ShutdownSignal,
    timing: EmitterTiming,
) -> Result<EmitReport> {
    let sink = UdpCommandSink::connect(&config.send_endpoint())?;

    let logger = Arc::new(SettingsLogger::new(
        config.log_file_path.clone(),
        config.synth_params.clone(),
    ));
    log::info!("Logging synth settings to {}", logger.path().display());

    log::info!("Starting OSC server...");
    let router = Router::new().route(
        SETTINGS_ROUTE,
        settings_handler(Arc::clone(&config), Arc::clone(&logger)),
    );
    let listener = OscListener::bind(&config.receive_endpoint(), router)?;
    // Detached: the handle is dropped and the thread dies with the process
    listener.spawn_detached()?;

    let mut emitter = CommandEmitter::with_timing(sink, config.max_randomizations, timing);
    let report = emitter.run(shutdown);

    if report.failed > 0 {
        log::warn!(
            "{} of {} randomization commands failed to send",
            report.failed,
            report.attempted
        );
    }

    Ok(report)
}

/// Route handler: decode a settings message and append it to the log
///
/// Log write failures are reported here and the record is dropped, so the
/// listener keeps serving.
pub fn settings_handler(
    config: Arc<BridgeConfig>,
    logger: Arc<SettingsLogger>,
) -> impl FnMut(&OscMessage) -> Result<()> + Send + 'static {
    move |msg: &OscMessage| {
        let record = decode_settings(&msg.args, &config.synth_params);

        match logger.append(&record) {
            Ok(()) => log::debug!("Logged synth settings: {:?}", record.values),
            Err(e) => log::error!(
                "Failed to write to {}: {}",
                logger.path().display(),
                e
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::OscType;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(log_file_path: PathBuf) -> Arc<BridgeConfig> {
        Arc::new(BridgeConfig {
            synth_params: vec!["freq".to_string(), "amp".to_string()],
            max_ip: "127.0.0.1".to_string(),
            max_send_port: 9,
            max_receive_port: 9,
            max_randomizations: 0,
            log_file_path,
        })
    }

    fn settings(args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: SETTINGS_ROUTE.to_string(),
            args,
        }
    }

    #[test]
    fn test_handler_logs_row() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.csv");
        let config = config(path.clone());
        let logger = Arc::new(SettingsLogger::new(&path, config.synth_params.clone()));
        let mut handler = settings_handler(config, logger);

        handler(&settings(vec![
            OscType::Bool(true),
            OscType::Int(440),
            OscType::Float(0.8),
        ]))
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Timestamp,freq,amp");
        assert!(lines[1].ends_with(",440,0.8"));
    }

    #[test]
    fn test_handler_survives_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("later");
        let path = dir.join("settings.csv");
        let config = config(path.clone());
        let logger = Arc::new(SettingsLogger::new(&path, config.synth_params.clone()));
        let mut handler = settings_handler(config, logger);

        // Parent directory missing: the record is dropped, not an error
        assert!(handler(&settings(vec![OscType::Int(1), OscType::Int(1)])).is_ok());
        assert!(!path.exists());

        std::fs::create_dir(&dir).unwrap();
        handler(&settings(vec![OscType::Int(1), OscType::Int(220)])).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().ends_with(",220,"));
    }
}
