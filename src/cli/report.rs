//! `report`: download a finished live report.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::backend::BackendClient;
use crate::cli::args::ReportCliArgs;
use crate::config::Config;
use crate::global;

pub async fn handle_report_command(args: ReportCliArgs, config: Config) -> Result<()> {
    let client = BackendClient::new(config.server.endpoints(), config.server.request_timeout())
        .context("Failed to create HTTP client")?;

    let dest = match args.output {
        Some(path) => path,
        None => default_report_path(&args.report_id)?,
    };

    let bytes = client
        .download_report(&args.report_id, &dest)
        .await
        .with_context(|| format!("Failed to download report {}", args.report_id))?;

    info!("Saved report {} ({} bytes)", args.report_id, bytes);
    println!("Saved {}", dest.display());
    Ok(())
}

fn default_report_path(report_id: &str) -> Result<PathBuf> {
    let file_name: String = report_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    Ok(global::reports_dir()?.join(format!("{file_name}.pdf")))
}
