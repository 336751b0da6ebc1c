//! Microphone capture via cpal.
//!
//! The device is looked up when capture starts, not at construction, so a
//! missing or refused device surfaces as a failed start.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tracing::{debug, error, info};

use super::audio_source::{AudioSource, SampleTap};

pub struct MicAudioSource {
    device_name: Option<String>,
    stream: Option<cpal::Stream>,
}

impl MicAudioSource {
    /// `device_name` selects a specific input; `None` uses the host default.
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            stream: None,
        }
    }

    fn find_device(&self) -> Result<cpal::Device> {
        let host = cpal::default_host();

        match &self.device_name {
            Some(wanted) => host
                .input_devices()
                .context("Failed to enumerate input devices")?
                .find(|device| device.name().map(|n| &n == wanted).unwrap_or(false))
                .with_context(|| format!("Input device '{}' not found", wanted)),
            None => host
                .default_input_device()
                .context("No input device available for live capture"),
        }
    }
}

impl AudioSource for MicAudioSource {
    fn name(&self) -> &str {
        "microphone"
    }

    fn start(&mut self) -> Result<SampleTap> {
        if self.stream.is_some() {
            bail!("Microphone already capturing");
        }

        let device = self.find_device()?;
        info!(
            "Live capture mic using device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let (stream, tap) = build_mono_stream(&device, "Microphone")?;
        self.stream = Some(stream);

        Ok(tap)
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping microphone stream");
            drop(stream);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for MicAudioSource {
    fn drop(&mut self) {
        if self.is_active() {
            debug!("Dropping active MicAudioSource, cleaning up");
            let _ = self.stop();
        }
    }
}

/// Open `device` with its default input configuration and fold every frame
/// down to mono f32 into a fresh tap.
pub(crate) fn build_mono_stream(
    device: &cpal::Device,
    label: &str,
) -> Result<(cpal::Stream, SampleTap)> {
    let supported = device
        .default_input_config()
        .with_context(|| format!("{label}: no usable input configuration"))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let channels = config.channels.max(1) as usize;
    let tap = SampleTap::new(config.sample_rate.0);

    let err_label = label.to_string();
    let err_fn = move |err| error!("{} stream error: {}", err_label, err);
    let writer = tap.clone();

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                writer.push(&downmix(data, channels, |s| s));
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                writer.push(&downmix(data, channels, |s| s as f32 / i16::MAX as f32));
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                writer.push(&downmix(data, channels, |s| (s as f32 - 32768.0) / 32768.0));
            },
            err_fn,
            None,
        )?,
        other => bail!("{label}: unsupported sample format {other:?}"),
    };

    stream
        .play()
        .with_context(|| format!("Failed to start {label} stream"))?;

    debug!(
        "{} stream running: {} channel(s) at {}Hz",
        label, channels, config.sample_rate.0
    );

    Ok((stream, tap))
}

/// Average interleaved frames into a single channel.
fn downmix<T: Copy>(data: &[T], channels: usize, to_f32: impl Fn(T) -> f32) -> Vec<f32> {
    if channels <= 1 {
        return data.iter().map(|&s| to_f32(s)).collect();
    }

    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| to_f32(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}
