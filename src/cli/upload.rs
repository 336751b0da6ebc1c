//! `upload`: send a recorded meeting for offline analysis.

use anyhow::Result;

use crate::cli::args::UploadCliArgs;
use crate::cli::live::create_spinner;
use crate::config::Config;
use crate::workspace::Workspace;

pub async fn handle_upload_command(args: UploadCliArgs, config: Config) -> Result<()> {
    let output_type = args.output.unwrap_or(config.capture.default_output);

    let workspace = Workspace::from_config(config)?;
    workspace.set_output_type(output_type).await;

    let spinner = create_spinner("Uploading...");
    let result = workspace.upload(&args.file).await;
    spinner.finish_and_clear();

    let response = result?;

    if let Some(session_id) = response.session_id() {
        println!("Session: {}", session_id);
    }
    match workspace.transcription().report_link().await {
        Some(link) => println!("{}: {}", output_type.label(), link),
        None => println!("Processed, but the server returned no {} link", output_type),
    }

    Ok(())
}
