use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::relay::OutputType;

#[derive(Parser, Debug)]
#[command(name = "easyanalyzer")]
#[command(about = "Meeting capture, analysis reports and transcript search", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Analysis server host, e.g. `analysis.example.com:8000` (overrides config)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Capture a live meeting and wait for its report
    Live(LiveCliArgs),
    /// Upload a recorded meeting for analysis
    Upload(UploadCliArgs),
    /// Index sessions for question answering
    Index(IndexCliArgs),
    /// Ask a question across indexed sessions
    Ask(AskCliArgs),
    /// Download a finished live report
    Report(ReportCliArgs),
    /// Show the config file location and effective settings
    Config,
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct LiveCliArgs {
    /// Report to produce (default from config)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Audio or video file to upload
    pub file: PathBuf,
    /// Report to produce (default from config)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(ClapArgs, Debug)]
pub struct IndexCliArgs {
    /// Session to index
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub session_id: Option<String>,
    /// Rebuild the index from every stored session
    #[arg(long)]
    pub all: bool,
}

#[derive(ClapArgs, Debug)]
pub struct AskCliArgs {
    /// Question to ask
    pub question: String,
    /// Number of transcript chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct ReportCliArgs {
    /// Report id announced at the end of a live session
    pub report_id: String,
    /// Where to save the PDF (default: data directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
