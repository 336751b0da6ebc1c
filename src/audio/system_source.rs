//! System audio capture (what the other meeting participants say).
//!
//! PipeWire/PulseAudio expose the output mix as "Monitor" input devices;
//! cpal sees them like any microphone.

use anyhow::{bail, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{debug, info};

use super::audio_source::{AudioSource, SampleTap};
use super::mic_source::build_mono_stream;

#[derive(Default)]
pub struct SystemAudioSource {
    stream: Option<cpal::Stream>,
}

impl SystemAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_monitor_device() -> Option<cpal::Device> {
        let host = cpal::default_host();

        host.input_devices().ok()?.find(|device| {
            device
                .name()
                .map(|name| is_monitor_name(&name))
                .unwrap_or(false)
        })
    }
}

fn is_monitor_name(name: &str) -> bool {
    name.to_lowercase().contains("monitor")
}

impl AudioSource for SystemAudioSource {
    fn name(&self) -> &str {
        "system audio"
    }

    fn start(&mut self) -> Result<SampleTap> {
        if self.stream.is_some() {
            bail!("System audio source already capturing");
        }

        let Some(device) = Self::find_monitor_device() else {
            bail!(
                "No system audio monitor source found. \
                 Ensure PipeWire or PulseAudio is running and a monitor source is available."
            );
        };

        info!(
            "Live capture system audio using monitor: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let (stream, tap) = build_mono_stream(&device, "System audio")?;
        self.stream = Some(stream);
        Ok(tap)
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping system audio stream");
            drop(stream);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for SystemAudioSource {
    fn drop(&mut self) {
        if self.is_active() {
            debug!("Dropping active SystemAudioSource, cleaning up");
            let _ = self.stop();
        }
    }
}
