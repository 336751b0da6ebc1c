//! Encodes mixed samples into the byte chunks streamed to the server.
//!
//! Chunks are 16-bit little-endian PCM, mono. The first chunk that actually
//! reaches the socket carries a WAV header with the RIFF and data lengths
//! set to `u32::MAX`, so the server can treat the concatenation of every
//! chunk in a session as one open-ended WAV stream.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

pub const STREAMING_LENGTH: u32 = u32::MAX;

#[derive(Debug)]
pub struct ChunkEncoder {
    sample_rate: u32,
    header: Vec<u8>,
    header_delivered: bool,
}

impl ChunkEncoder {
    pub fn new(sample_rate: u32) -> Result<Self> {
        Ok(Self {
            sample_rate,
            header: streaming_header(sample_rate)?,
            header_delivered: false,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Encode `samples`, prefixed with the header until
    /// [`ChunkEncoder::mark_delivered`] has been called.
    pub fn encode(&self, samples: &[f32]) -> Option<Vec<u8>> {
        if samples.is_empty() {
            return None;
        }

        let header_len = if self.header_delivered {
            0
        } else {
            self.header.len()
        };
        let mut bytes = Vec::with_capacity(header_len + samples.len() * 2);

        if !self.header_delivered {
            bytes.extend_from_slice(&self.header);
        }

        for &sample in samples {
            bytes.extend_from_slice(&to_pcm16(sample).to_le_bytes());
        }

        Some(bytes)
    }

    /// Record that a chunk produced by [`ChunkEncoder::encode`] was handed to
    /// the socket.
    pub fn mark_delivered(&mut self) {
        self.header_delivered = true;
    }

    pub fn header_delivered(&self) -> bool {
        self.header_delivered
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// A WAV header for an empty file, patched to announce an unknown length.
fn streaming_header(sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut header = Vec::new();
    {
        let writer = WavWriter::new(Cursor::new(&mut header), spec)
            .context("Failed to build WAV header")?;
        writer.finalize().context("Failed to finalize WAV header")?;
    }

    // RIFF chunk size follows the "RIFF" tag; the data chunk size is the
    // last field before the (empty) sample data.
    let len = header.len();
    header[4..8].copy_from_slice(&STREAMING_LENGTH.to_le_bytes());
    header[len - 4..].copy_from_slice(&STREAMING_LENGTH.to_le_bytes());

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_streaming_wav() {
        let encoder = ChunkEncoder::new(16000).unwrap();
        let header = &encoder.header;

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[4..8], &u32::MAX.to_le_bytes());
        let len = header.len();
        assert_eq!(&header[len - 8..len - 4], b"data");
        assert_eq!(&header[len - 4..], &u32::MAX.to_le_bytes());
    }

    #[test]
    fn test_header_until_delivered() {
        let mut encoder = ChunkEncoder::new(16000).unwrap();
        let header_len = encoder.header.len();

        let first = encoder.encode(&[0.0; 10]).unwrap();
        assert_eq!(first.len(), header_len + 20);

        // Not delivered yet: the next chunk still carries the header.
        let retry = encoder.encode(&[0.0; 10]).unwrap();
        assert_eq!(retry.len(), header_len + 20);

        encoder.mark_delivered();
        let second = encoder.encode(&[0.0; 10]).unwrap();
        assert_eq!(second.len(), 20);
        assert!(encoder.header_delivered());
    }

    #[test]
    fn test_empty_samples_produce_no_chunk() {
        let encoder = ChunkEncoder::new(16000).unwrap();
        assert!(encoder.encode(&[]).is_none());
    }

    #[test]
    fn test_pcm16_conversion_clamps() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), i16::MAX);
        assert_eq!(to_pcm16(2.5), i16::MAX);
        assert_eq!(to_pcm16(-1.0), -i16::MAX);
    }

    #[test]
    fn test_samples_little_endian() {
        let mut encoder = ChunkEncoder::new(8000).unwrap();
        encoder.mark_delivered();
        let bytes = encoder.encode(&[1.0]).unwrap();
        assert_eq!(bytes, i16::MAX.to_le_bytes().to_vec());
    }
}
