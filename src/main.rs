//! Railops CLI - terminal consumer for the logistics dashboard.
//!
//! This is the main binary entry point. It demonstrates the consumer
//! contract of the `railops` library: subscribe/send over the realtime
//! channel, plus a few REST queries. See the library crate for the core.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mimalloc::MiMalloc;
use std::time::Duration;
use tokio::sync::mpsc;

use railops::realtime::LifecycleCallback;
use railops::{ApiClient, Config, RealtimeClient, SimulationAction};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Delay before the watch command re-dials after a lost connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Terminal consumer for the rail logistics dashboard.
#[derive(Parser)]
#[command(name = "railops", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream realtime envelopes to stdout (reconnects on loss).
    Watch {
        /// Topics to subscribe to; defaults to everything (`*`).
        #[arg(short, long)]
        topic: Vec<String>,
    },
    /// Send a one-shot simulation control over the realtime channel.
    Control {
        /// Control action to issue.
        action: ControlAction,
    },
    /// List the rakes currently active in the simulation.
    Rakes,
    /// Print the aggregate dashboard metrics as JSON.
    Metrics,
}

/// CLI-facing mirror of [`SimulationAction`].
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControlAction {
    /// Pause the running simulation.
    Pause,
    /// Resume a paused simulation.
    Resume,
    /// Stop the simulation entirely.
    Stop,
}

impl From<ControlAction> for SimulationAction {
    fn from(action: ControlAction) -> Self {
        match action {
            ControlAction::Pause => Self::Pause,
            ControlAction::Resume => Self::Resume,
            ControlAction::Stop => Self::Stop,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Watch { topic } => watch(&config, topic).await,
        Command::Control { action } => control(&config, action.into()).await,
        Command::Rakes => rakes(&config).await,
        Command::Metrics => metrics(&config).await,
    }
}

/// Lifecycle signals routed from manager callbacks to the command loop.
#[derive(Debug)]
enum Lifecycle {
    Opened,
    Closed,
}

/// Wire up callbacks that forward open/close into a channel the command
/// loop can select on. The core never retries by itself; retry policy
/// lives here, in the consumer.
fn lifecycle_channel() -> (
    LifecycleCallback,
    LifecycleCallback,
    mpsc::UnboundedReceiver<Lifecycle>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let open_tx = tx.clone();
    let on_open: LifecycleCallback = Box::new(move || {
        let _ = open_tx.send(Lifecycle::Opened);
    });
    let on_close: LifecycleCallback = Box::new(move || {
        let _ = tx.send(Lifecycle::Closed);
    });
    (on_open, on_close, rx)
}

async fn watch(config: &Config, topics: Vec<String>) -> Result<()> {
    let client = RealtimeClient::new(&config.ws_url);

    let topics = if topics.is_empty() {
        vec!["*".to_string()]
    } else {
        topics
    };
    for topic in &topics {
        let label = topic.clone();
        client.subscribe(topic, move |payload| {
            println!("[{label}] {payload}");
        });
    }

    loop {
        let (on_open, on_close, mut lifecycle) = lifecycle_channel();
        client.connect(Some(on_open), Some(on_close));
        client.start_heartbeat(config.heartbeat_interval());

        let reconnect = loop {
            tokio::select! {
                signal = lifecycle.recv() => match signal {
                    Some(Lifecycle::Opened) => {
                        // Fresh session: ask for a position snapshot.
                        client.request_positions();
                    }
                    Some(Lifecycle::Closed) | None => break true,
                },
                _ = tokio::signal::ctrl_c() => break false,
            }
        };

        if !reconnect {
            client.disconnect();
            return Ok(());
        }

        log::warn!(
            "Connection lost; reconnecting in {}s",
            RECONNECT_DELAY.as_secs()
        );
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn control(config: &Config, action: SimulationAction) -> Result<()> {
    let client = RealtimeClient::new(&config.ws_url);
    let (on_open, on_close, mut lifecycle) = lifecycle_channel();
    client.connect(Some(on_open), Some(on_close));

    let opened = tokio::time::timeout(Duration::from_secs(10), lifecycle.recv()).await;
    match opened {
        Ok(Some(Lifecycle::Opened)) => {}
        Ok(_) => anyhow::bail!("Connection closed before the control could be sent"),
        Err(_) => anyhow::bail!("Timed out connecting to {}", config.ws_url),
    }

    if client.control_simulation(action) {
        println!("Sent simulation control: {}", action.as_str());
    } else {
        anyhow::bail!("Control was not written; connection not open");
    }

    client.disconnect();
    Ok(())
}

async fn rakes(config: &Config) -> Result<()> {
    let api = ApiClient::new(&config.api_url)?;
    let response = api.get_active_rakes().await?;

    if response.data.is_empty() {
        println!("No active rakes.");
        return Ok(());
    }
    for rake in response.data {
        println!(
            "{:<6} {:>5.1}%  {} -> {}  [{}]",
            rake.id, rake.progress, rake.from, rake.to, rake.status
        );
    }
    Ok(())
}

async fn metrics(config: &Config) -> Result<()> {
    let api = ApiClient::new(&config.api_url)?;
    let response = api.get_dashboard_metrics().await?;
    println!("{}", serde_json::to_string_pretty(&response.data)?);
    Ok(())
}
