//! Firmware image helpers: merged-image and flashing arguments for
//! `esptool.py`, and the web frontend archive download.

use anyhow::{bail, Context, Error};
use log::{debug, info};
use tokio::process::Command;

mod fetch;
mod merge;

pub use fetch::{fetch_frontend, frontend_request, ApiToken, TOKEN_ENV};
pub use merge::{collect_binaries, FlashImage, FlashPlan, MergeBinPlan, FILESYSTEM_OFFSET};

/// Run an external tool and fail on a non-zero exit
pub async fn run_tool(program: &str, args: &[String]) -> Result<(), Error> {
    debug!("Running {} {}", program, args.join(" "));

    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("could not start {}", program))?;

    if !status.success() {
        bail!("{} exited with {}", program, status);
    }

    info!("{} finished", program);
    Ok(())
}
