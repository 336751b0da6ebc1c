//! Upload a finished recording for offline analysis.

use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tracing::{error, info};

use super::state::TranscriptionHandle;
use crate::backend::{Backend, UploadResponse};

/// Run the upload flow for `file_path`.
///
/// The output type is read once, when the upload is submitted; changing
/// the selection while the request is in flight does not affect which
/// report link is picked from the response.
pub async fn upload_recording(
    backend: &dyn Backend,
    transcription: &TranscriptionHandle,
    file_path: &Path,
) -> Result<UploadResponse> {
    let output_type = transcription.output_type().await;

    if !file_path.is_file() {
        let message = format!("file not found: {}", file_path.display());
        transcription.log(format!("Upload failed: {message}")).await;
        bail!(message);
    }

    transcription.log("Uploading...").await;

    let response = match backend.upload_video(file_path, output_type).await {
        Ok(response) => response,
        Err(e) => {
            error!("Upload of {:?} failed: {}", file_path, e);
            transcription.log(format!("Upload failed: {e}")).await;
            return Err(anyhow!(e).context("Failed to upload recording"));
        }
    };

    if let Some(message) = response.error.as_deref().filter(|m| !m.is_empty()) {
        error!("Server rejected upload of {:?}: {}", file_path, message);
        transcription.log(format!("Upload failed: {message}")).await;
        bail!("Server rejected upload: {}", message);
    }

    transcription.apply_upload(&response, output_type).await;
    transcription.log("Processed").await;

    info!(
        "Upload processed (session: {})",
        response.session_id().unwrap_or("none")
    );

    Ok(response)
}
