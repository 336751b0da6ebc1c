//! Per-view state structs and the shared handle for the transcription view.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use crate::activity::ActivityLog;
use crate::backend::{QueryHit, QueryResponse, UploadResponse, NO_ANSWER};
use crate::relay::OutputType;

/// Everything the transcription view shows.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionState {
    pub activity: ActivityLog,
    pub output_type: OutputType,
    pub report_link: Option<String>,
    pub recording: bool,
    pub session_id: Option<String>,
    /// How the current live session ended without a report, if it did.
    pub session_end: Option<SessionEnd>,
}

/// A live session that finished without producing a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server gave up; carries its message.
    Failed(String),
    /// The socket closed with no report announced.
    Closed,
}

/// Result of [`TranscriptionHandle::wait_for_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Ready(String),
    Failed(String),
    Closed,
    TimedOut,
}

/// Shared handle to [`TranscriptionState`].
///
/// The capture session's socket task writes to it in the background, so it
/// lives behind an async mutex like the other status handles.
#[derive(Clone, Default)]
pub struct TranscriptionHandle {
    inner: Arc<Mutex<TranscriptionState>>,
    report_changed: Arc<Notify>,
}

impl TranscriptionHandle {
    pub fn new(output_type: OutputType) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TranscriptionState {
                output_type,
                ..Default::default()
            })),
            report_changed: Arc::new(Notify::new()),
        }
    }

    pub async fn get(&self) -> TranscriptionState {
        self.inner.lock().await.clone()
    }

    pub async fn log(&self, message: impl Into<String>) {
        self.inner.lock().await.activity.push(message);
    }

    pub async fn output_type(&self) -> OutputType {
        self.inner.lock().await.output_type
    }

    pub async fn set_output_type(&self, output_type: OutputType) {
        self.inner.lock().await.output_type = output_type;
    }

    pub async fn session_id(&self) -> Option<String> {
        self.inner.lock().await.session_id.clone()
    }

    pub async fn set_session_id(&self, session_id: impl Into<String>) {
        self.inner.lock().await.session_id = Some(session_id.into());
    }

    /// A new live session replaces the held id and forgets how the
    /// previous one ended.
    pub async fn begin_session(&self, session_id: impl Into<String>) {
        let mut state = self.inner.lock().await;
        state.session_id = Some(session_id.into());
        state.session_end = None;
    }

    /// Record that live session `session_id` ended without a report.
    ///
    /// Ignored when a newer session has started since, and a failure is
    /// never downgraded to a plain close.
    pub async fn session_ended(&self, session_id: &str, end: SessionEnd) {
        {
            let mut state = self.inner.lock().await;
            if state.session_id.as_deref() != Some(session_id) {
                return;
            }
            match (&state.session_end, &end) {
                (Some(SessionEnd::Failed(_)), SessionEnd::Closed) => return,
                _ => state.session_end = Some(end),
            }
        }
        self.report_changed.notify_waiters();
    }

    pub async fn report_link(&self) -> Option<String> {
        self.inner.lock().await.report_link.clone()
    }

    pub async fn set_recording(&self, recording: bool) {
        self.inner.lock().await.recording = recording;
    }

    pub async fn is_recording(&self) -> bool {
        self.inner.lock().await.recording
    }

    /// A live report finished: replace the link and note it in the feed.
    pub async fn report_ready(&self, link: String) {
        {
            let mut state = self.inner.lock().await;
            state.report_link = Some(link);
            state.activity.push("PDF Ready");
        }
        self.report_changed.notify_waiters();
    }

    /// Wait until the report link differs from `previous`, or the live
    /// session ends without one.
    pub async fn wait_for_report(&self, previous: Option<&str>, timeout: Duration) -> ReportOutcome {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Registered before the check so a notification in between is not lost.
            let changed = self.report_changed.notified();
            {
                let state = self.inner.lock().await;
                if let Some(link) = &state.report_link {
                    if previous != Some(link.as_str()) {
                        return ReportOutcome::Ready(link.clone());
                    }
                }
                match &state.session_end {
                    Some(SessionEnd::Failed(message)) => {
                        return ReportOutcome::Failed(message.clone())
                    }
                    Some(SessionEnd::Closed) => return ReportOutcome::Closed,
                    None => {}
                }
            }
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                return ReportOutcome::TimedOut;
            }
        }
    }

    /// Adopt the session id and report link of an upload response.
    ///
    /// `output_type` is the selection at submission time. When no field
    /// matches, the current link is left as it is.
    pub async fn apply_upload(&self, response: &UploadResponse, output_type: OutputType) {
        let mut state = self.inner.lock().await;
        if let Some(session_id) = response.session_id() {
            state.session_id = Some(session_id.to_string());
        }
        if let Some(link) = response.report_link(output_type) {
            state.report_link = Some(link.to_string());
        }
    }
}

/// Everything the RAG view shows.
#[derive(Debug, Clone, Default)]
pub struct RagState {
    pub question: String,
    pub answer: Option<String>,
    pub hits: Vec<QueryHit>,
}

impl RagState {
    pub fn apply_response(&mut self, response: &QueryResponse) {
        self.answer = Some(response.answer_or_fallback());
        self.hits = response.hits().to_vec();
    }

    pub fn apply_failure(&mut self) {
        self.answer = Some(NO_ANSWER.to_string());
        self.hits.clear();
    }
}
