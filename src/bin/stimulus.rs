use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Error};
use antctl::prelude::*;
use env_logger::Env;
use log::info;
use tokio::signal;

/// Keeps hammering the outputs with random masks until interrupted
#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init()?;

    let config = Config::load()?;
    let mut client = CommandClient::open_port(&config.port).context("open failed")?;

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = stop.clone();
    let stimulus = config.stimulus.clone();

    // Serial I/O blocks, so it gets a thread of its own
    let mut worker = tokio::task::spawn_blocking(move || {
        let mut generator = StimulusGenerator::new(stimulus.groups.clone());
        run_stimulus(&mut client, &mut generator, &stimulus, &worker_stop)
    });

    let sent = tokio::select! {
        joined = &mut worker => joined??,
        result = shutdown_signal() => {
            result?;
            info!("Shutdown signal received, stopping stimulus...");
            stop.store(true, Ordering::Relaxed);
            worker.await??
        }
    };

    info!("Sent {} commands", sent);
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() -> Result<(), Error> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}
