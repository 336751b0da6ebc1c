//! `live`: capture a meeting from the terminal.

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::capture::{StartOutcome, StopOutcome};
use crate::cli::args::LiveCliArgs;
use crate::config::Config;
use crate::workspace::{ReportOutcome, Workspace};

pub async fn handle_live_command(args: LiveCliArgs, config: Config) -> Result<()> {
    let output_type = args.output.unwrap_or(config.capture.default_output);
    let report_wait = config.capture.report_wait();

    let mut workspace = Workspace::from_config(config)?;
    workspace.set_output_type(output_type).await;

    let session_id = match workspace.start_capture().await? {
        StartOutcome::Started { session_id, .. } => session_id,
        StartOutcome::AlreadyCapturing { session_id } => session_id,
    };

    println!("Capturing session {} ({})", session_id, output_type.label());
    println!("Press Enter or Ctrl-C to stop.");

    wait_for_stop_request().await;

    match workspace.stop_capture().await {
        StopOutcome::Stopped {
            duration_seconds,
            stats,
            end_token_sent,
            ..
        } => {
            println!(
                "Stopped after {}s ({} chunks, {} bytes sent)",
                duration_seconds, stats.chunks_sent, stats.bytes_sent
            );
            if !end_token_sent {
                bail!("Connection to the analysis server was lost; no report will be produced");
            }
        }
        StopOutcome::NotCapturing => bail!("Capture was not running"),
    }

    let spinner = create_spinner("Waiting for report...");
    let outcome = workspace
        .transcription()
        .wait_for_report(None, report_wait)
        .await;
    spinner.finish_and_clear();

    let state = workspace.transcription().get().await;
    let entries: Vec<_> = state.activity.entries().collect();
    for entry in entries.iter().rev() {
        debug!("{}", entry);
    }

    match outcome {
        ReportOutcome::Ready(link) => {
            info!("Report for {} ready", session_id);
            println!("Report ready: {}", link);
            Ok(())
        }
        ReportOutcome::Failed(message) => {
            bail!("Server failed to process session {}: {}", session_id, message)
        }
        ReportOutcome::Closed => bail!(
            "Server closed the connection for session {} without a report",
            session_id
        ),
        ReportOutcome::TimedOut => bail!(
            "No report received within {}s for session {}",
            report_wait.as_secs(),
            session_id
        ),
    }
}

// A plain thread rather than a blocking task: an unfinished stdin read must
// not hold up runtime shutdown after Ctrl-C.
async fn wait_for_stop_request() {
    let (tx, enter) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = tx.send(());
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => debug!("Ctrl-C received"),
        _ = enter => debug!("Enter pressed"),
    }
}

pub(crate) fn create_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
