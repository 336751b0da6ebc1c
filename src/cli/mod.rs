pub mod args;
pub mod live;
pub mod rag;
pub mod report;
pub mod upload;

use anyhow::Result;

use crate::config::Config;
use crate::workspace::views;

pub use args::{Cli, CliCommand};
pub use live::handle_live_command;
pub use rag::{handle_ask_command, handle_index_command};
pub use report::handle_report_command;
pub use upload::handle_upload_command;

/// Load the config file and apply per-invocation overrides.
pub fn load_config(server: Option<&str>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(host) = server {
        config.server.host = host.to_string();
    }
    Ok(config)
}

pub fn handle_config_command(config: &Config) -> Result<()> {
    println!("Config file: {}", Config::config_path()?.display());
    println!();
    print!("{}", views::render_settings(config));
    Ok(())
}
