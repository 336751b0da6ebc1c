use crate::backend::Endpoints;
use crate::global;
use crate::relay::OutputType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub capture: CaptureConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` of the analysis server.
    pub host: String,
    /// Use wss/https instead of ws/http.
    pub secure: bool,
    /// Per-request timeout for upload/index/query calls. 0 disables it.
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub default_output: OutputType,
    /// How often captured audio is flushed to the socket.
    pub chunk_interval_ms: u64,
    /// Sample rate of the PCM stream sent upstream.
    pub sample_rate: u32,
    /// Mix the desktop output monitor in with the microphone.
    pub include_system_audio: bool,
    /// Input device name; empty uses the system default.
    pub input_device: String,
    /// How long `live` waits for the report after stopping.
    pub report_wait_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".to_string(),
            secure: false,
            request_timeout_seconds: 600,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            default_output: OutputType::Analysis,
            chunk_interval_ms: 1000,
            sample_rate: 16000,
            include_system_audio: true,
            input_device: String::new(),
            report_wait_seconds: 900,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl ServerConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.host, self.secure)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_seconds > 0).then(|| Duration::from_secs(self.request_timeout_seconds))
    }
}

impl CaptureConfig {
    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms.max(10))
    }

    pub fn report_wait(&self) -> Duration {
        Duration::from_secs(self.report_wait_seconds)
    }

    pub fn input_device(&self) -> Option<String> {
        let name = self.input_device.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Load from `config_path`, writing the defaults there first if the
    /// file does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
