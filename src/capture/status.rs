//! Capture lifecycle types.

use serde::{Deserialize, Serialize};

use crate::relay::OutputType;

/// Phase of the live capture session. There is no paused state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePhase {
    #[default]
    Idle,
    Capturing,
}

impl CapturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
        }
    }
}

/// Result of [`super::CaptureSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        session_id: String,
        output_type: OutputType,
    },
    AlreadyCapturing {
        session_id: String,
    },
}

/// Result of [`super::CaptureSession::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped {
        session_id: String,
        duration_seconds: u64,
        stats: ProducerStats,
        end_token_sent: bool,
    },
    NotCapturing,
}

/// Counters kept by the chunk producer over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub chunks_sent: u64,
    pub chunks_dropped: u64,
    pub bytes_sent: u64,
    pub samples_discarded: u64,
}
