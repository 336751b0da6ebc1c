//! Audio source abstraction for the live capture surface.

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared buffer an audio callback appends to and the chunk producer drains.
///
/// The source owns the (non-`Send`) device stream; only the tap crosses
/// into the async side.
#[derive(Debug, Clone)]
pub struct SampleTap {
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
}

impl SampleTap {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn push(&self, data: &[f32]) {
        self.lock().extend_from_slice(data);
    }

    /// Take everything captured since the previous drain.
    pub fn drain(&self) -> Vec<f32> {
        std::mem::take(&mut *self.lock())
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<f32>> {
        match self.samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A device the capture surface can record from (microphone, system monitor).
pub trait AudioSource {
    fn name(&self) -> &str;

    /// Start capturing; samples arrive in the returned tap as mono f32.
    fn start(&mut self) -> Result<SampleTap>;

    /// Stop capturing. Samples already in the tap stay there.
    fn stop(&mut self) -> Result<()>;

    fn is_active(&self) -> bool;
}
