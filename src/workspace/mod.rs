//! The workspace controller.
//!
//! One [`Workspace`] owns the state of every page plus the capture session.
//! Pages are plain render functions over that state, so switching pages
//! never tears anything down.

pub mod index;
pub mod query;
pub mod router;
pub mod state;
pub mod upload;
pub mod views;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::backend::{Backend, BackendClient, UploadResponse};
use crate::capture::{CaptureSession, CaptureSurface, DesktopSurface, StartOutcome, StopOutcome};
use crate::config::Config;
use crate::relay::OutputType;

pub use index::IndexOutcome;
pub use router::{Page, ViewRouter};
pub use state::{RagState, ReportOutcome, SessionEnd, TranscriptionHandle, TranscriptionState};

pub struct Workspace {
    config: Config,
    router: ViewRouter,
    transcription: TranscriptionHandle,
    rag: RagState,
    capture: CaptureSession,
    backend: Arc<dyn Backend>,
}

impl Workspace {
    pub fn new(config: Config, backend: Arc<dyn Backend>, surface: Box<dyn CaptureSurface>) -> Self {
        let transcription = TranscriptionHandle::new(config.capture.default_output);
        let capture = CaptureSession::from_config(
            surface,
            config.server.endpoints(),
            &config.capture,
            transcription.clone(),
        );

        Self {
            config,
            router: ViewRouter::default(),
            transcription,
            rag: RagState::default(),
            capture,
            backend,
        }
    }

    /// Workspace talking to the configured server and capturing from the
    /// desktop's audio devices.
    pub fn from_config(config: Config) -> Result<Self> {
        let backend = BackendClient::new(
            config.server.endpoints(),
            config.server.request_timeout(),
        )
        .context("Failed to create HTTP client")?;
        let surface = DesktopSurface::new(
            config.capture.input_device(),
            config.capture.include_system_audio,
        );

        info!("Workspace using server {}", config.server.host);
        Ok(Self::new(config, Arc::new(backend), Box::new(surface)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_page(&self) -> Page {
        self.router.current()
    }

    pub fn navigate(&mut self, page: Page) {
        self.router.navigate(page);
    }

    pub fn transcription(&self) -> &TranscriptionHandle {
        &self.transcription
    }

    pub fn rag(&self) -> &RagState {
        &self.rag
    }

    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_capturing()
    }

    /// Takes effect for the next capture or upload; a running capture keeps
    /// the type it announced.
    pub async fn set_output_type(&self, output_type: OutputType) {
        self.transcription.set_output_type(output_type).await;
    }

    pub async fn start_capture(&mut self) -> Result<StartOutcome> {
        let output_type = self.transcription.output_type().await;
        self.capture.start(output_type).await
    }

    pub async fn stop_capture(&mut self) -> StopOutcome {
        self.capture.stop().await
    }

    pub async fn upload(&self, file_path: &Path) -> Result<UploadResponse> {
        upload::upload_recording(self.backend.as_ref(), &self.transcription, file_path).await
    }

    pub async fn index_session(&self) -> Result<IndexOutcome> {
        index::index_session(self.backend.as_ref(), &self.transcription).await
    }

    pub async fn index_by_id(&self, session_id: &str) -> Result<()> {
        index::index_by_id(self.backend.as_ref(), &self.transcription, session_id).await
    }

    pub async fn index_all(&self) -> Result<()> {
        index::index_all(self.backend.as_ref(), &self.transcription).await
    }

    pub async fn ask(&mut self, question: &str) -> Result<()> {
        let top_k = self.config.rag.top_k;
        self.ask_with(question, top_k).await
    }

    pub async fn ask_with(&mut self, question: &str, top_k: usize) -> Result<()> {
        query::ask(self.backend.as_ref(), &mut self.rag, question, top_k).await
    }

    /// Sidebar, top bar and the current page.
    pub async fn render(&self) -> String {
        let transcription = self.transcription.get().await;
        let page = self.router.current();

        let body = match page {
            Page::Dashboard => views::render_dashboard(&transcription),
            Page::Transcription => views::render_transcription(&transcription),
            Page::Rag => views::render_rag(&self.rag),
            Page::Settings => views::render_settings(&self.config),
        };

        format!(
            "{}\n{}\n\n{}",
            views::render_sidebar(page),
            views::render_topbar(page, transcription.recording),
            body
        )
    }
}
