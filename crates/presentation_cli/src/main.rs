//! Kiosk speech output daemon
//!
//! Connects to the kiosk push stream, speaks incoming speech commands through a
//! local audio player, and treats every line read from stdin as a user gesture
//! (the kiosk's physical button or touch bridge writes one line per press).

#![allow(clippy::print_stdout)]

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use ai_speech::HttpSynthesisGateway;
use anyhow::{Context, anyhow};
use application::{InteractionEvent, InteractionKind, SpeechInput, SpeechOutputService};
use clap::Parser;
use infrastructure::{
    AppConfig, CommandAudioOutput, DEFAULT_FILTER, LogFormat, SpeechCommandListener,
    TracingNotifier, init_tracing,
};
use integration_stream::{ConnectionState, SseTransport, StreamClient};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Kiosk speech output
#[derive(Debug, Parser)]
#[command(name = "kiosk-speech")]
#[command(author, version, about = "Speaks kiosk stream commands through a local player", long_about = None)]
struct Cli {
    /// Configuration file (default: ./config.toml when present)
    #[arg(short, long, env = "KIOSK_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the stream base URL
    #[arg(long)]
    stream_url: Option<String>,

    /// Override the log format (text or json)
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

/// Determine log filter from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => DEFAULT_FILTER,
        1 => "debug",
        _ => "trace",
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config =
        AppConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.stream_url {
        config.stream.base_url.clone_from(url);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    init_tracing(config.log_format, log_filter_from_verbosity(cli.verbose))?;
    run(config).await
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let synthesis = HttpSynthesisGateway::new(config.speech.synthesis())
        .context("Failed to create synthesis gateway")?;
    let speech = SpeechOutputService::new(
        Arc::new(synthesis),
        Arc::new(CommandAudioOutput::from_config(&config.audio)),
        Arc::new(TracingNotifier::new()),
    )
    .with_config(config.speech.output())
    .start();

    let transport =
        SseTransport::new(&config.stream).context("Failed to create stream transport")?;
    let endpoint = config.stream.stream_endpoint();
    info!(
        base_url = %config.stream.base_url,
        endpoint = endpoint.name(),
        player = %config.audio.player_command,
        "🔊 Kiosk speech output starting"
    );
    let stream = StreamClient::connect(
        Arc::new(transport),
        endpoint,
        config.stream.reconnect.clone(),
        Arc::new(SpeechCommandListener::new(speech.input())),
    );

    let states = tokio::spawn(log_connection_states(stream.subscribe()));
    spawn_gesture_reader(speech.input());

    shutdown_signal().await;

    stream.shutdown().await;
    speech.shutdown().await;
    states.abort();
    info!("👋 Kiosk speech output stopped");
    Ok(())
}

async fn log_connection_states(mut states: watch::Receiver<ConnectionState>) {
    while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        match state {
            ConnectionState::Open => info!("Kiosk stream connected"),
            ConnectionState::Errored => warn!("Kiosk stream disconnected"),
            ConnectionState::Connecting | ConnectionState::Closed => {
                debug!(state = ?state, "Kiosk stream state changed");
            },
        }
    }
}

/// Forward each stdin line as a trusted key press
///
/// Reads on a plain thread: a blocking stdin read cannot be cancelled and would
/// otherwise hold up runtime shutdown.
fn spawn_gesture_reader(input: SpeechInput) {
    let spawned = std::thread::Builder::new()
        .name("gesture-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                if input
                    .interaction(InteractionEvent::trusted(InteractionKind::KeyDown))
                    .is_err()
                {
                    break;
                }
            }
            debug!("Gesture input closed");
        });

    if let Err(e) = spawned {
        error!(error = %e, "Failed to start gesture reader; audio stays locked");
    }
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("📥 Received Ctrl+C, shutting down...");
        }
        () = terminate => {
            info!("📥 Received SIGTERM, shutting down...");
        }
    }
}
