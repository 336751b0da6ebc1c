//! The capture surface: the set of audio sources recorded for a session.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::audio::{AudioSource, MicAudioSource, SampleTap, SystemAudioSource};

/// Host capture facility the session acquires on start and releases on stop.
pub trait CaptureSurface {
    /// Start every source. An error means nothing is capturing.
    fn acquire(&mut self) -> Result<Vec<SampleTap>>;

    fn release(&mut self) -> Result<()>;
}

/// Microphone plus, when available, the desktop output monitor.
///
/// The microphone is required; the monitor is best effort.
pub struct DesktopSurface {
    mic: MicAudioSource,
    system: Option<SystemAudioSource>,
}

impl DesktopSurface {
    pub fn new(input_device: Option<String>, include_system_audio: bool) -> Self {
        Self {
            mic: MicAudioSource::new(input_device),
            system: include_system_audio.then(SystemAudioSource::new),
        }
    }
}

impl CaptureSurface for DesktopSurface {
    fn acquire(&mut self) -> Result<Vec<SampleTap>> {
        let mut taps = vec![self
            .mic
            .start()
            .context("Microphone capture was refused or is unavailable")?];

        if let Some(system) = self.system.as_mut() {
            match system.start() {
                Ok(tap) => taps.push(tap),
                Err(e) => warn!("System audio unavailable, capturing microphone only: {}", e),
            }
        }

        info!("Capture surface acquired with {} source(s)", taps.len());
        Ok(taps)
    }

    fn release(&mut self) -> Result<()> {
        if let Some(system) = self.system.as_mut() {
            if system.is_active() {
                if let Err(e) = system.stop() {
                    warn!("Failed to stop {}: {}", system.name(), e);
                }
            }
        }
        self.mic.stop()
    }
}
