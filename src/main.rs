use anyhow::Result;
use clap::Parser;
use easyanalyzer::{
    app,
    cli::{
        handle_ask_command, handle_config_command, handle_index_command, handle_live_command,
        handle_report_command, handle_upload_command, load_config, Cli, CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(CliCommand::Version) = cli.command {
        println!("EasyAnalyzer {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.server.as_deref())?;

    match cli.command {
        Some(CliCommand::Live(args)) => handle_live_command(args, config).await,
        Some(CliCommand::Upload(args)) => handle_upload_command(args, config).await,
        Some(CliCommand::Index(args)) => handle_index_command(args, config).await,
        Some(CliCommand::Ask(args)) => handle_ask_command(args, config).await,
        Some(CliCommand::Report(args)) => handle_report_command(args, config).await,
        Some(CliCommand::Config) => handle_config_command(&config),
        Some(CliCommand::Version) => Ok(()),
        None => app::run_workspace(config).await,
    }
}
