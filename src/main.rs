use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::error;

use whatcms::{indicators, scanner, utils, Args, ScanConfig};

async fn run(args: &Args) -> Result<()> {
    if args.init {
        return indicators::init_default_indicators(Path::new(indicators::DEFAULT_INDICATOR_FILE));
    }

    utils::validate_args(args)?;
    let config = ScanConfig::from_args(args)?;
    let summary = scanner::scan_and_write(args, &config).await?;

    let output_path = args.output.as_deref().context("Missing output CSV path")?;
    scanner::print_scan_summary(&summary, output_path, config.include_all);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    utils::setup_logging(args.verbose);

    if let Err(e) = run(&args).await {
        error!(action = "abort", component = "main", error = %format!("{e:#}"), "Run failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
