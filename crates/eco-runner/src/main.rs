//! Runs a predator-prey world in the background and watches it headlessly.

mod consumer;
mod export;
mod scheduler;
mod telemetry;

use anyhow::{Context, Result};
use eco_core::RunnerConfig;
use eco_world::World;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = load_config()?;
    info!("Starting eco-runner");
    info!(
        width = config.sim.width,
        height = config.sim.height,
        rabbits = config.sim.rabbits,
        foxes = config.sim.foxes,
        "Configuration loaded"
    );

    let world = World::new(&config.sim).context("Invalid simulation parameters")?;

    let (handle, stream) = scheduler::spawn(world, config.scheduler.clone());
    let history = handle.history();
    info!(run_id = %handle.run_id(), "Simulation spawned");
    let consumer = tokio::spawn(consumer::run_consumer(stream, config.consumer.clone()));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut pause_signal = PauseSignal::install();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Cancelling simulation");
                handle.cancel();
                break;
            }
            _ = pause_signal.recv() => {
                handle.toggle_pause();
                info!(
                    paused = handle.is_paused(),
                    state = ?handle.state(),
                    latest = ?history.latest(),
                    "Pause toggled"
                );
            }
            _ = handle.wait_for_state(scheduler::SchedulerState::Stopped) => break,
        }
    }

    let consumed = consumer.await.context("Consumer task failed")?;
    let summary = handle.join().await.context("Scheduler task failed")?;
    let history = history.to_history();

    if let Some(path) = &config.consumer.history_path {
        export::write_history(Path::new(path), &summary, &history).await?;
    }

    crate::record_counter!("ticks_completed", summary.ticks);
    info!(
        run_id = %summary.run_id,
        reason = ?summary.reason,
        ticks = summary.ticks,
        rabbits = summary.final_population.rabbits,
        foxes = summary.final_population.foxes,
        peak_rabbits = history.peak_rabbits(),
        peak_foxes = history.peak_foxes(),
        frames = consumed.frames,
        "Run finished"
    );

    telemetry::shutdown_telemetry();

    Ok(())
}

/// Config file from the first argument or `ECO_CONFIG`, defaults otherwise
fn load_config() -> Result<RunnerConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ECO_CONFIG").ok())
        .map(PathBuf::from);

    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(RunnerConfig::default());
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: RunnerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    info!(path = %path.display(), "Config file loaded");
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// SIGUSR1 toggles pause on unix; never fires elsewhere
struct PauseSignal {
    #[cfg(unix)]
    inner: Option<signal::unix::Signal>,
}

impl PauseSignal {
    #[cfg(unix)]
    fn install() -> Self {
        let inner = match signal::unix::signal(signal::unix::SignalKind::user_defined1()) {
            Ok(sigusr1) => Some(sigusr1),
            Err(e) => {
                warn!("Failed to install SIGUSR1 handler: {}", e);
                None
            }
        };
        Self { inner }
    }

    #[cfg(not(unix))]
    fn install() -> Self {
        Self {}
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        if let Some(sigusr1) = self.inner.as_mut() {
            if sigusr1.recv().await.is_some() {
                return;
            }
            self.inner = None;
        }
        std::future::pending::<()>().await
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}
