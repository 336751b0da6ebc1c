//! Live capture lifecycle: `Idle → Capturing → Idle`.
//!
//! start → open socket (announces the output type) → acquire surface →
//! spawn chunk producer. stop → release surface → flush producer → send
//! the end-of-meeting token. The socket stays up after stop; the server
//! closes it once the report has been announced.
//!
//! The session is owned by the workspace rather than by any view, so
//! navigating between pages never interrupts a capture.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::chunk_producer::{ChunkProducer, ProducerSettings};
use super::status::{CapturePhase, StartOutcome, StopOutcome};
use super::surface::CaptureSurface;
use crate::backend::Endpoints;
use crate::config::CaptureConfig;
use crate::relay::{ChannelHandle, ControlToken, OutputType, RelayEvent, ServerEvent, SocketRelay};
use crate::workspace::{SessionEnd, TranscriptionHandle};

struct ActiveCapture {
    session_id: String,
    output_type: OutputType,
    producer: ChunkProducer,
    started_at: DateTime<Utc>,
}

pub struct CaptureSession {
    surface: Box<dyn CaptureSurface>,
    endpoints: Endpoints,
    settings: ProducerSettings,
    transcription: TranscriptionHandle,
    active: Option<ActiveCapture>,
    relay: Option<SocketRelay>,
}

impl CaptureSession {
    pub fn new(
        surface: Box<dyn CaptureSurface>,
        endpoints: Endpoints,
        settings: ProducerSettings,
        transcription: TranscriptionHandle,
    ) -> Self {
        Self {
            surface,
            endpoints,
            settings,
            transcription,
            active: None,
            relay: None,
        }
    }

    pub fn from_config(
        surface: Box<dyn CaptureSurface>,
        endpoints: Endpoints,
        config: &CaptureConfig,
        transcription: TranscriptionHandle,
    ) -> Self {
        let settings = ProducerSettings::new(config.chunk_interval(), config.sample_rate);
        Self::new(surface, endpoints, settings, transcription)
    }

    pub fn phase(&self) -> CapturePhase {
        if self.active.is_some() {
            CapturePhase::Capturing
        } else {
            CapturePhase::Idle
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.session_id.as_str())
    }

    pub fn output_type(&self) -> Option<OutputType> {
        self.active.as_ref().map(|a| a.output_type)
    }

    /// Channel of the most recent socket, including one kept after stop.
    pub fn channel(&self) -> Option<&ChannelHandle> {
        self.relay.as_ref().map(|r| r.channel())
    }

    pub async fn start(&mut self, output_type: OutputType) -> Result<StartOutcome> {
        if let Some(active) = &self.active {
            debug!(
                "Capture {} already running, ignoring start",
                active.session_id
            );
            return Ok(StartOutcome::AlreadyCapturing {
                session_id: active.session_id.clone(),
            });
        }

        let session_id = new_session_id();
        self.transcription.begin_session(session_id.clone()).await;
        self.transcription.log("Starting session...").await;

        let (relay, events) =
            SocketRelay::open(self.endpoints.live_socket(&session_id), output_type);
        tokio::spawn(apply_relay_events(
            events,
            session_id.clone(),
            self.transcription.clone(),
            self.endpoints.clone(),
        ));

        let taps = match self.surface.acquire() {
            Ok(taps) => taps,
            Err(e) => {
                relay.close();
                error!("Live capture {} failed to start: {:#}", session_id, e);
                self.transcription.log(format!("Capture failed: {e:#}")).await;
                return Err(e.context("Failed to start live capture"));
            }
        };

        let producer = match ChunkProducer::spawn(taps, relay.channel().clone(), self.settings) {
            Ok(producer) => producer,
            Err(e) => {
                relay.close();
                if let Err(release_err) = self.surface.release() {
                    warn!("Failed to release capture surface: {}", release_err);
                }
                self.transcription.log(format!("Capture failed: {e:#}")).await;
                return Err(e.context("Failed to start chunk producer"));
            }
        };

        // A previous session's socket keeps running until its server closes it.
        if let Some(previous) = self.relay.replace(relay) {
            debug!("Detached relay {}", previous.url());
        }

        self.active = Some(ActiveCapture {
            session_id: session_id.clone(),
            output_type,
            producer,
            started_at: Utc::now(),
        });
        self.transcription.set_recording(true).await;

        info!("Live capture {} started ({})", session_id, output_type);

        Ok(StartOutcome::Started {
            session_id,
            output_type,
        })
    }

    pub async fn stop(&mut self) -> StopOutcome {
        let Some(active) = self.active.take() else {
            debug!("No capture running, ignoring stop");
            return StopOutcome::NotCapturing;
        };

        if let Err(e) = self.surface.release() {
            warn!("Failed to release capture surface: {}", e);
        }

        let stats = active.producer.finalize().await;

        let end_token_sent = self
            .relay
            .as_ref()
            .map(|relay| relay.channel().try_send_control(ControlToken::EndMeeting))
            .unwrap_or(false);

        self.transcription.set_recording(false).await;
        self.transcription.log("Stopped").await;

        let duration_seconds = (Utc::now() - active.started_at).num_seconds().max(0) as u64;
        info!(
            "Live capture {} stopped after {}s (end token sent: {})",
            active.session_id, duration_seconds, end_token_sent
        );

        StopOutcome::Stopped {
            session_id: active.session_id,
            duration_seconds,
            stats,
            end_token_sent,
        }
    }
}

/// Timestamp-derived session label.
fn new_session_id() -> String {
    format!("meeting_{}", Utc::now().timestamp_millis())
}

/// Fold socket traffic into the transcription view.
async fn apply_relay_events(
    mut events: mpsc::UnboundedReceiver<RelayEvent>,
    session_id: String,
    transcription: TranscriptionHandle,
    endpoints: Endpoints,
) {
    while let Some(event) = events.recv().await {
        match event {
            RelayEvent::Connected => debug!("Capture socket ready"),
            RelayEvent::Frame(ServerEvent::ReportReady { report_id }) => {
                info!("Report ready: {}", report_id);
                transcription
                    .report_ready(endpoints.live_report(&report_id))
                    .await;
            }
            RelayEvent::Frame(event) => {
                match &event {
                    ServerEvent::FinalError(message) => {
                        warn!("Server failed to process session: {}", message)
                    }
                    ServerEvent::RagIndexError(message) => {
                        warn!("Server failed to index session: {}", message)
                    }
                    _ => debug!("Server: {}", event),
                }
                transcription.log(event.to_string()).await;
                if let ServerEvent::FinalError(message) = event {
                    transcription
                        .session_ended(&session_id, SessionEnd::Failed(message))
                        .await;
                }
            }
            RelayEvent::ConnectFailed(e) => {
                let message = format!("Connection failed: {e}");
                transcription.log(message.clone()).await;
                transcription
                    .session_ended(&session_id, SessionEnd::Failed(message))
                    .await;
            }
            RelayEvent::Closed(reason) => {
                match reason {
                    Some(e) => debug!("Capture socket for {} closed: {}", session_id, e),
                    None => debug!("Capture socket for {} closed by server", session_id),
                }
                transcription
                    .session_ended(&session_id, SessionEnd::Closed)
                    .await;
            }
        }
    }
}
