use std::io;

use anyhow::{Context, Error};
use antctl::prelude::*;
use env_logger::Env;
use log::info;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init()?;

    // Load the config file
    let config = Config::load()?;

    // Positional arguments replace the configured command list
    let commands = config.resolve_commands(std::env::args().skip(1).collect());

    info!(
        "Probing {} at {} baud with {} commands",
        config.port.path,
        config.port.baud_rate,
        commands.len()
    );

    let mut client = CommandClient::open_port(&config.port).context("open failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_probe(&mut client, &commands, &mut out)?;

    client.close();
    Ok(())
}
