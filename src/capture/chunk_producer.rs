//! Periodic chunk emission for a running capture.
//!
//! Every tick the producer drains the source taps, mixes what all tracks
//! have in common, encodes it and queues it on the relay channel. It never
//! waits for the network: a refused send is counted and the audio dropped.
//! Audio captured before the socket first opens is held (up to a bound) so
//! the beginning of a meeting is not lost to connection latency.

use anyhow::Result;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::status::ProducerStats;
use crate::audio::{ChunkEncoder, SampleTap, StreamMixer};
use crate::relay::ChannelHandle;

#[derive(Debug, Clone, Copy)]
pub struct ProducerSettings {
    pub interval: Duration,
    pub sample_rate: u32,
    /// Longest stretch of audio held while the socket is not ready.
    pub max_backlog: Duration,
}

impl ProducerSettings {
    pub fn new(interval: Duration, sample_rate: u32) -> Self {
        Self {
            interval,
            sample_rate,
            max_backlog: Duration::from_secs(30),
        }
    }

    fn samples_in(&self, span: Duration) -> usize {
        (span.as_millis() as u64 * self.sample_rate as u64 / 1000) as usize
    }
}

pub struct ChunkProducer {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<ProducerStats>,
}

impl ChunkProducer {
    pub fn spawn(
        taps: Vec<SampleTap>,
        channel: ChannelHandle,
        settings: ProducerSettings,
    ) -> Result<Self> {
        let state = ProducerState {
            mixer: StreamMixer::new(
                taps.len(),
                settings.sample_rate,
                settings.samples_in(settings.interval * 2),
            ),
            encoder: ChunkEncoder::new(settings.sample_rate)?,
            max_backlog: settings.samples_in(settings.max_backlog),
            backlog: Vec::new(),
            stats: ProducerStats::default(),
            taps,
            channel,
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(state, stop_rx, settings.interval));

        Ok(Self { stop_tx, task })
    }

    /// Stop ticking, flush whatever is still buffered as a last chunk and
    /// return the session counters.
    pub async fn finalize(self) -> ProducerStats {
        let _ = self.stop_tx.send(());
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Chunk producer task failed: {}", e);
                ProducerStats::default()
            }
        }
    }
}

struct ProducerState {
    taps: Vec<SampleTap>,
    channel: ChannelHandle,
    mixer: StreamMixer,
    encoder: ChunkEncoder,
    backlog: Vec<f32>,
    max_backlog: usize,
    stats: ProducerStats,
}

impl ProducerState {
    fn collect(&mut self, flush: bool) {
        for (track, tap) in self.taps.iter().enumerate() {
            let samples = tap.drain();
            self.mixer.push(track, &samples, tap.sample_rate());
        }

        let mixed = if flush {
            self.mixer.flush()
        } else {
            self.mixer.take_ready()
        };
        self.backlog.extend(mixed);
    }

    fn emit(&mut self) {
        if self.backlog.is_empty() {
            return;
        }

        if !self.channel.is_open() {
            if self.backlog.len() > self.max_backlog {
                let excess = self.backlog.len() - self.max_backlog;
                self.backlog.drain(..excess);
                self.stats.samples_discarded += excess as u64;
            }
            return;
        }

        let Some(bytes) = self.encoder.encode(&self.backlog) else {
            return;
        };
        let len = bytes.len() as u64;

        if self.channel.try_send_chunk(bytes) {
            self.encoder.mark_delivered();
            self.stats.chunks_sent += 1;
            self.stats.bytes_sent += len;
        } else {
            self.stats.chunks_dropped += 1;
            self.stats.samples_discarded += self.backlog.len() as u64;
        }

        self.backlog.clear();
    }
}

async fn run(
    mut state: ProducerState,
    mut stop_rx: oneshot::Receiver<()>,
    interval: Duration,
) -> ProducerStats {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    debug!("Chunk producer running every {:?}", interval);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                state.collect(false);
                state.emit();
            }
        }
    }

    state.collect(true);
    state.emit();

    info!(
        "Chunk producer finished: {} sent ({} bytes), {} dropped",
        state.stats.chunks_sent, state.stats.bytes_sent, state.stats.chunks_dropped
    );
    state.stats
}
