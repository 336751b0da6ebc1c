//! Host capture surface: audio sources, mixing and chunk encoding.

pub mod audio_mixer;
pub mod audio_source;
pub mod chunk_encoder;
pub mod mic_source;
pub mod system_source;

pub use audio_mixer::{AudioMixer, StreamMixer};
pub use audio_source::{AudioSource, SampleTap};
pub use chunk_encoder::ChunkEncoder;
pub use mic_source::MicAudioSource;
pub use system_source::SystemAudioSource;
