use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Error};
use antctl::firmware::{
    collect_binaries, fetch_frontend, run_tool, ApiToken, FlashImage, FlashPlan, MergeBinPlan,
    TOKEN_ENV,
};
use env_logger::Env;
use log::{info, warn};

const ESPTOOL: &str = "esptool.py";
const BOOT_APP0_OFFSET: u32 = 0xe000;
const FRONTEND_ARCHIVE: &str = "frontend.tar.gz";

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let build_dir = PathBuf::from(std::env::var("BUILD_DIR").unwrap_or_else(|_| ".".to_string()));

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["copy"] => copy(&build_dir, Path::new(".")),
        ["copy", dest] => copy(&build_dir, Path::new(dest)),
        ["merge"] => merge(&build_dir, "fullimage.bin").await,
        ["merge", output] => merge(&build_dir, output).await,
        ["flash"] => run_tool(ESPTOOL, &FlashPlan::merged("merged-flash.bin").esptool_args()).await,
        ["flash", image] => run_tool(ESPTOOL, &FlashPlan::merged(*image).esptool_args()).await,
        ["fetch", url, dest] => fetch(url, Path::new(dest)).await,
        _ => {
            print_help();
            bail!("unknown invocation: {:?}", args);
        }
    }
}

fn copy(build_dir: &Path, dest: &Path) -> Result<(), Error> {
    let copied = collect_binaries(build_dir, dest)
        .with_context(|| format!("copying binaries out of {}", build_dir.display()))?;
    info!("Copied {} binaries", copied.len());
    Ok(())
}

async fn merge(build_dir: &Path, output: &str) -> Result<(), Error> {
    let mut plan = MergeBinPlan::for_build_dir(build_dir, output);

    if let Ok(boot_app0) = std::env::var("BOOT_APP0") {
        plan = plan.with_extra_image(FlashImage::new(BOOT_APP0_OFFSET, boot_app0));
    }

    run_tool(ESPTOOL, &plan.esptool_args()).await
}

async fn fetch(url: &str, dest: &Path) -> Result<(), Error> {
    let token = ApiToken::from_env(TOKEN_ENV);
    if token.is_none() {
        warn!("{} is not set, downloading without authentication", TOKEN_ENV);
    }

    tokio::fs::create_dir_all(dest).await?;
    let archive = dest.join(FRONTEND_ARCHIVE);

    let client = reqwest::Client::new();
    fetch_frontend(&client, url, token.as_ref(), &archive).await?;

    let args = vec![
        "-xzf".to_string(),
        archive.display().to_string(),
        "-C".to_string(),
        dest.display().to_string(),
    ];
    run_tool("tar", &args).await
}

fn print_help() {
    println!(
        r#"antctl-fwimage

USAGE:
    antctl-fwimage copy [DEST]         Copy firmware, partitions and bootloader out of $BUILD_DIR
    antctl-fwimage merge [OUTPUT]      Merge all images and the filesystem into one file
    antctl-fwimage flash [IMAGE]       Write a merged image from address 0x0
    antctl-fwimage fetch <URL> <DIR>   Download and unpack the web frontend, using ${TOKEN_ENV} if set
"#
    );
}
