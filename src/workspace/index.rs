//! Ask the server to index transcripts for retrieval.

use anyhow::{anyhow, Result};
use tracing::{error, info};

use super::state::TranscriptionHandle;
use crate::backend::Backend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed { session_id: String },
    /// Nothing to index yet; no request was made.
    MissingSession,
}

/// Index the session currently held by the transcription view.
pub async fn index_session(
    backend: &dyn Backend,
    transcription: &TranscriptionHandle,
) -> Result<IndexOutcome> {
    let Some(session_id) = transcription.session_id().await else {
        transcription.log("No session ID.").await;
        return Ok(IndexOutcome::MissingSession);
    };

    index_by_id(backend, transcription, &session_id).await?;

    Ok(IndexOutcome::Indexed { session_id })
}

/// Index an explicit session, regardless of what the view holds.
pub async fn index_by_id(
    backend: &dyn Backend,
    transcription: &TranscriptionHandle,
    session_id: &str,
) -> Result<()> {
    if let Err(e) = backend.store_session(session_id).await {
        error!("Indexing session {} failed: {}", session_id, e);
        transcription.log(format!("Index failed: {e}")).await;
        return Err(anyhow!(e).context(format!("Failed to index session {session_id}")));
    }

    info!("Indexed session {}", session_id);
    transcription.log("Indexed").await;
    Ok(())
}

/// Rebuild the index from every stored transcript.
pub async fn index_all(backend: &dyn Backend, transcription: &TranscriptionHandle) -> Result<()> {
    if let Err(e) = backend.store_all().await {
        error!("Indexing all sessions failed: {}", e);
        transcription.log(format!("Index failed: {e}")).await;
        return Err(anyhow!(e).context("Failed to index all sessions"));
    }

    info!("Indexed all sessions");
    transcription.log("Indexed all sessions").await;
    Ok(())
}
