// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod band_control;
mod config;
mod listener;
mod receiver;
mod registry;
mod relay;
mod session;
mod wideband;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use wrx_app::init_logging;
use wrx_core::{BandWindow, BandWindowCell, DynResult};
use wrx_dsp::{IqSource, MockIqSource, ToneIqSource, WidebandSpectrumEngine};

use band_control::BandControl;
use config::{ReceiverConfig, ServerConfig};
use receiver::Receiver;
use registry::{SessionCounter, SessionRegistry};
use relay::ConnectionTable;
use session::SessionContext;
use wideband::WidebandService;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - multi-viewer receiver server");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// IP address for the viewer listener
    #[arg(short = 'l', long = "listen")]
    listen: Option<IpAddr>,
    /// Port for the viewer listener
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    /// Maximum number of concurrent viewers
    #[arg(short = 'm', long = "max-sessions")]
    max_sessions: Option<usize>,
}

fn apply_cli_overrides(cli: &Cli, cfg: &mut ServerConfig) {
    if let Some(listen) = cli.listen {
        cfg.listen.listen = listen;
    }
    if let Some(port) = cli.port {
        cfg.listen.port = port;
    }
    if let Some(max_sessions) = cli.max_sessions {
        cfg.sessions.max_sessions = max_sessions;
    }
}

fn build_source(cfg: &ReceiverConfig) -> DynResult<Box<dyn IqSource>> {
    match cfg.source.as_str() {
        "mock" => Ok(Box::new(MockIqSource)),
        "tone" => Ok(Box::new(ToneIqSource::new(
            cfg.tone_offset_hz,
            cfg.tone_amplitude,
        ))),
        other => Err(format!("Unknown receiver source: {}", other).into()),
    }
}

fn stop_thread(name: &str, stop: &AtomicBool, handle: JoinHandle<()>) {
    stop.store(true, Ordering::Release);
    if handle.join().is_err() {
        warn!("{} thread panicked", name);
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = ServerConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    apply_cli_overrides(&cli, &mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let window = BandWindow::for_band(cfg.receiver.initial_band)?;
    let window_cell = Arc::new(BandWindowCell::new(window));
    let sessions = SessionCounter::default();
    let band = Arc::new(BandControl::new(Arc::clone(&window_cell), sessions.clone()));

    let mut source = build_source(&cfg.receiver)?;
    source
        .retune(window.tuned_hz())
        .map_err(|e| format!("Receiver initialisation failed: {}", e))?;
    info!(
        "Starting wrx-server (source: {}, band {}: {}, gain reduction {} dB, bandwidth {} Hz)",
        cfg.receiver.source,
        cfg.receiver.initial_band,
        window,
        cfg.receiver.gain_reduction_db,
        cfg.receiver.bandwidth_hz
    );

    let listen_addr = SocketAddr::from((cfg.listen.listen, cfg.listen.port));
    let tcp = TcpListener::bind(listen_addr).await?;
    info!("Listening on {}", listen_addr);

    let (outbound_tx, outbound_rx) = relay::outbound_channel();
    let ctx = SessionContext {
        band: Arc::clone(&band),
        sessions,
        outbound: outbound_tx,
        calibration_db: cfg.spectrum.calibration_db,
        spectrum_interval: cfg.spectrum.update_interval(),
    };
    let (registry, inlets) = SessionRegistry::new(ctx, cfg.sessions.max_sessions);

    let engine =
        WidebandSpectrumEngine::new(cfg.spectrum.calibration_db, cfg.spectrum.update_interval());
    let (wideband, wideband_input) = WidebandService::new(engine, window_cell, inlets.wideband);
    let receiver = Receiver::new(source, wideband_input, inlets.raw, band, true);

    let dispatcher_stop = Arc::new(AtomicBool::new(false));
    let wideband_stop = Arc::new(AtomicBool::new(false));
    let receiver_stop = Arc::new(AtomicBool::new(false));
    let dispatcher_thread = registry.spawn(Arc::clone(&dispatcher_stop))?;
    let wideband_thread = wideband.spawn(Arc::clone(&wideband_stop))?;
    let receiver_thread = receiver.spawn(Arc::clone(&receiver_stop))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let connections = ConnectionTable::default();
    let (ingress_tx, ingress_rx) = mpsc::channel(listener::INGRESS_QUEUE);

    let mut task_handles = Vec::new();
    task_handles.push(tokio::spawn(listener::run_ingress(
        ingress_rx,
        inlets.control,
        shutdown_rx.clone(),
    )));
    task_handles.push(tokio::spawn(relay::run_relay(
        outbound_rx,
        connections.clone(),
        shutdown_rx.clone(),
    )));
    let max_sessions = cfg.sessions.max_sessions;
    let listener_shutdown_rx = shutdown_rx.clone();
    task_handles.push(tokio::spawn(async move {
        if let Err(e) = listener::serve(
            tcp,
            max_sessions,
            ingress_tx,
            connections,
            listener_shutdown_rx,
        )
        .await
        {
            error!("Listener error: {:?}", e);
        }
    }));

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");

    tokio::task::spawn_blocking(move || {
        stop_thread("receiver", &receiver_stop, receiver_thread);
        stop_thread("wideband", &wideband_stop, wideband_thread);
        stop_thread("dispatcher", &dispatcher_stop, dispatcher_thread);
    })
    .await?;

    let _ = shutdown_tx.send(true);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["wrx-server", "-l", "127.0.0.1", "-p", "9100", "-m", "3"]);
        let mut cfg = ServerConfig::default();
        apply_cli_overrides(&cli, &mut cfg);
        assert_eq!(cfg.listen.listen, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(cfg.listen.port, 9100);
        assert_eq!(cfg.sessions.max_sessions, 3);
    }

    #[test]
    fn test_cli_defaults_leave_config() {
        let cli = Cli::parse_from(["wrx-server"]);
        let mut cfg = ServerConfig::default();
        apply_cli_overrides(&cli, &mut cfg);
        assert_eq!(cfg.listen.port, 9001);
        assert_eq!(cfg.sessions.max_sessions, 20);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_build_source() {
        let mut cfg = ReceiverConfig::default();
        assert!(build_source(&cfg).is_ok());
        cfg.source = "mock".to_string();
        assert!(build_source(&cfg).is_ok());
        cfg.source = "airspy".to_string();
        assert!(build_source(&cfg).is_err());
    }
}
