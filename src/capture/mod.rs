//! Live meeting capture.

pub mod capture_session;
pub mod chunk_producer;
pub mod status;
pub mod surface;

pub use capture_session::CaptureSession;
pub use chunk_producer::{ChunkProducer, ProducerSettings};
pub use status::{CapturePhase, ProducerStats, StartOutcome, StopOutcome};
pub use surface::{CaptureSurface, DesktopSurface};
