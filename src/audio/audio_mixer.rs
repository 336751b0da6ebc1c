//! Folding several capture tracks into the single mono track sent upstream.

/// Stateless mixing helpers.
pub struct AudioMixer;

impl AudioMixer {
    /// Average equal-rate tracks into one, zero-padding shorter tracks.
    /// The result is rescaled if any sample leaves [-1.0, 1.0].
    pub fn mix(tracks: &[Vec<f32>]) -> Vec<f32> {
        let non_empty: Vec<&Vec<f32>> = tracks.iter().filter(|t| !t.is_empty()).collect();

        match non_empty.len() {
            0 => return Vec::new(),
            1 => return non_empty[0].clone(),
            _ => {}
        }

        let max_len = non_empty.iter().map(|t| t.len()).max().unwrap_or(0);
        let count = non_empty.len() as f32;
        let mut mixed = vec![0.0f32; max_len];

        for track in &non_empty {
            for (out, &sample) in mixed.iter_mut().zip(track.iter()) {
                *out += sample;
            }
        }

        for sample in &mut mixed {
            *sample /= count;
        }

        let peak = mixed.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak > 1.0 {
            for sample in &mut mixed {
                *sample /= peak;
            }
        }

        mixed
    }
}

/// Streaming linear-interpolation resampler for one track.
///
/// The last input sample and the fractional read position carry over
/// between calls, so consecutive buffers resample as one continuous signal.
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    from_rate: u32,
    last: Option<f32>,
    /// Next output position, in input samples, relative to `last`.
    pos: f64,
}

impl Resampler {
    pub fn process(&mut self, samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
            return samples.to_vec();
        }
        if samples.is_empty() {
            return Vec::new();
        }
        if from_rate != self.from_rate {
            *self = Self {
                from_rate,
                ..Self::default()
            };
        }

        let ratio = from_rate as f64 / to_rate as f64;
        let input: Vec<f32> = self.last.into_iter().chain(samples.iter().copied()).collect();
        let end = (input.len() - 1) as f64;
        let mut out = Vec::with_capacity((samples.len() as f64 / ratio).ceil() as usize + 1);

        while self.pos < end {
            let idx = self.pos as usize;
            let frac = self.pos - idx as f64;
            let a = input[idx] as f64;
            let b = input[idx + 1] as f64;
            out.push((a * (1.0 - frac) + b * frac) as f32);
            self.pos += ratio;
        }

        self.pos -= end;
        self.last = input.last().copied();
        out
    }
}

/// Incremental mixer for the live chunk producer.
///
/// Tracks deliver samples at their own pace. Only the span every track has
/// reached is mixed, so one device running slightly ahead does not smear
/// silence into the other. A track that lags by more than `max_skew`
/// samples stops holding the others back and is padded with silence.
#[derive(Debug)]
pub struct StreamMixer {
    target_rate: u32,
    max_skew: usize,
    pending: Vec<Vec<f32>>,
    resamplers: Vec<Resampler>,
}

impl StreamMixer {
    pub fn new(tracks: usize, target_rate: u32, max_skew: usize) -> Self {
        Self {
            target_rate,
            max_skew,
            pending: vec![Vec::new(); tracks],
            resamplers: vec![Resampler::default(); tracks],
        }
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Append samples captured at `rate` to `track`.
    pub fn push(&mut self, track: usize, samples: &[f32], rate: u32) {
        if samples.is_empty() {
            return;
        }
        if let (Some(pending), Some(resampler)) =
            (self.pending.get_mut(track), self.resamplers.get_mut(track))
        {
            pending.extend(resampler.process(samples, rate, self.target_rate));
        }
    }

    /// Mix and remove the span that is ready to send.
    pub fn take_ready(&mut self) -> Vec<f32> {
        let longest = self.pending.iter().map(Vec::len).max().unwrap_or(0);
        if longest == 0 {
            return Vec::new();
        }

        let shortest = self.pending.iter().map(Vec::len).min().unwrap_or(0);
        let ready = if longest > self.max_skew {
            longest
        } else {
            shortest
        };

        self.take(ready)
    }

    /// Mix everything still buffered, padding short tracks.
    pub fn flush(&mut self) -> Vec<f32> {
        let longest = self.pending.iter().map(Vec::len).max().unwrap_or(0);
        self.take(longest)
    }

    pub fn buffered(&self) -> usize {
        self.pending.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn take(&mut self, len: usize) -> Vec<f32> {
        if len == 0 {
            return Vec::new();
        }

        let spans: Vec<Vec<f32>> = self
            .pending
            .iter_mut()
            .map(|pending| {
                let n = len.min(pending.len());
                let mut span: Vec<f32> = pending.drain(..n).collect();
                if !span.is_empty() {
                    span.resize(len, 0.0);
                }
                span
            })
            .collect();

        AudioMixer::mix(&spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_empty() {
        assert!(AudioMixer::mix(&[]).is_empty());
        assert!(AudioMixer::mix(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_mix_single_track_untouched() {
        let track = vec![0.5, -0.3, 0.1];
        assert_eq!(AudioMixer::mix(&[track.clone(), vec![]]), track);
    }

    #[test]
    fn test_mix_averages_and_pads() {
        let result = AudioMixer::mix(&[vec![1.0, 1.0], vec![1.0, 1.0, 1.0, 1.0]]);
        assert_eq!(result, vec![1.0, 1.0, 0.5, 0.5]);
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(Resampler::default().process(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32).collect();
        assert_eq!(Resampler::default().process(&samples, 48000, 16000).len(), 16);
    }

    #[test]
    fn test_resample_is_continuous_across_buffers() {
        // A ramp split at an awkward point must resample exactly like the
        // whole ramp at once.
        let ramp: Vec<f32> = (0..96).map(|i| i as f32).collect();

        let whole = Resampler::default().process(&ramp, 44100, 16000);

        let mut split = Resampler::default();
        let mut pieces = split.process(&ramp[..37], 44100, 16000);
        pieces.extend(split.process(&ramp[37..], 44100, 16000));

        assert_eq!(pieces.len(), whole.len());
        for (a, b) in pieces.iter().zip(&whole) {
            assert!((a - b).abs() < 1e-3, "{a} != {b}");
        }
        // Linear interpolation of a ramp is the ramp itself.
        for (i, s) in pieces.iter().enumerate() {
            assert!((s - i as f32 * 44100.0 / 16000.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_stream_mixer_single_track_passes_through() {
        let mut mixer = StreamMixer::new(1, 16000, 32000);
        mixer.push(0, &[0.25; 10], 16000);
        assert_eq!(mixer.take_ready(), vec![0.25; 10]);
        assert_eq!(mixer.buffered(), 0);
    }

    #[test]
    fn test_stream_mixer_holds_back_leading_track() {
        let mut mixer = StreamMixer::new(2, 16000, 100);
        mixer.push(0, &[0.5; 10], 16000);
        mixer.push(1, &[0.5; 6], 16000);

        let ready = mixer.take_ready();
        assert_eq!(ready.len(), 6);
        assert_eq!(mixer.buffered(), 4);

        mixer.push(1, &[0.5; 4], 16000);
        assert_eq!(mixer.take_ready().len(), 4);
        assert_eq!(mixer.buffered(), 0);
    }

    #[test]
    fn test_stream_mixer_stops_waiting_for_stalled_track() {
        let mut mixer = StreamMixer::new(2, 16000, 8);
        mixer.push(0, &[0.4; 5], 16000);
        assert!(mixer.take_ready().is_empty());

        mixer.push(0, &[0.4; 5], 16000);
        let ready = mixer.take_ready();
        assert_eq!(ready.len(), 10);
        assert!(ready.iter().all(|&s| (s - 0.4).abs() < f32::EPSILON));
    }

    #[test]
    fn test_stream_mixer_resamples_to_target() {
        let mut mixer = StreamMixer::new(1, 16000, 1_000_000);
        mixer.push(0, &[0.0; 480], 48000);
        assert_eq!(mixer.take_ready().len(), 160);
    }

    #[test]
    fn test_stream_mixer_flush_pads() {
        let mut mixer = StreamMixer::new(2, 16000, 1000);
        mixer.push(0, &[1.0; 4], 16000);
        mixer.push(1, &[1.0; 2], 16000);
        assert_eq!(mixer.take_ready().len(), 2);
        assert_eq!(mixer.flush(), vec![1.0, 1.0]);
        assert!(mixer.flush().is_empty());
    }
}
