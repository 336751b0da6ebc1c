//! HTTP client for the analysis server.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::endpoints::Endpoints;
use super::error::BackendError;
use super::types::{QueryRequest, QueryResponse, UploadResponse};
use crate::relay::OutputType;

pub struct BackendClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl BackendClient {
    /// `timeout` bounds every request end to end; `None` waits forever.
    pub fn new(endpoints: Endpoints, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(BackendError::Client)?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Stream a recording to `/upload-video` as multipart `file` + `output_type`.
    pub async fn upload_video(
        &self,
        file_path: &Path,
        output_type: OutputType,
    ) -> Result<UploadResponse, BackendError> {
        let url = self.endpoints.upload_video();
        let read_err = |source| BackendError::ReadFile {
            path: file_path.to_path_buf(),
            source,
        };

        let file = fs::File::open(file_path).await.map_err(read_err)?;
        let file_size = file.metadata().await.map_err(read_err)?.len();

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_string();
        let mime_type = file_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_type_for_extension)
            .unwrap_or("application/octet-stream");

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, file_size)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(BackendError::Form)?;

        let form = Form::new()
            .part("file", part)
            .text("output_type", output_type.as_str().to_string());

        info!(
            "Uploading {:?} ({} bytes, {}) as {}",
            file_path, file_size, mime_type, output_type
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        let body = success_body(&url, response).await?;
        decode(&url, &body)
    }

    /// Ask the server to index one session for retrieval. The response body
    /// is not interpreted.
    pub async fn store_session(&self, session_id: &str) -> Result<(), BackendError> {
        let url = self.endpoints.rag_store(session_id);

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        let body = success_body(&url, response).await?;
        debug!("Index response for {}: {}", session_id, body);
        Ok(())
    }

    /// Rebuild the retrieval index from every stored transcript.
    pub async fn store_all(&self) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoints.rag_store_all();

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        let body = success_body(&url, response).await?;
        let value: serde_json::Value = decode(&url, &body)?;

        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return Err(BackendError::Server(message.to_string()));
        }

        Ok(value)
    }

    pub async fn query(&self, question: &str, top_k: usize) -> Result<QueryResponse, BackendError> {
        let url = self.endpoints.rag_query();

        let response = self
            .client
            .post(&url)
            .json(&QueryRequest { question, top_k })
            .send()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        let body = success_body(&url, response).await?;
        decode(&url, &body)
    }

    /// Download a finished report PDF to `dest`, returning the bytes written.
    ///
    /// A missing report comes back as a JSON error body rather than a 404.
    pub async fn download_report(&self, report_id: &str, dest: &Path) -> Result<u64, BackendError> {
        let url = self.endpoints.live_report(report_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if !status.is_success() || is_json {
            let body = response
                .text()
                .await
                .map_err(|e| BackendError::transport(&url, e))?;
            if !status.is_success() {
                return Err(BackendError::Status { url, status, body });
            }
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("unexpected JSON instead of a PDF: {body}"));
            return Err(BackendError::Server(message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::transport(&url, e))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| BackendError::WriteFile {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        fs::write(dest, &bytes)
            .await
            .map_err(|source| BackendError::WriteFile {
                path: dest.to_path_buf(),
                source,
            })?;

        info!("Saved report {} to {:?} ({} bytes)", report_id, dest, bytes.len());
        Ok(bytes.len() as u64)
    }
}

async fn success_body(url: &str, response: Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::transport(url, e))?;

    if !status.is_success() {
        return Err(BackendError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }

    Ok(body)
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|source| BackendError::Decode {
        url: url.to_string(),
        source,
    })
}

/// MIME type for the recording formats the server's converter accepts.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for_extension("mp4"), Some("video/mp4"));
        assert_eq!(mime_type_for_extension("MOV"), Some("video/quicktime"));
        assert_eq!(mime_type_for_extension("wav"), Some("audio/wav"));
        assert_eq!(mime_type_for_extension("xyz"), None);
    }
}
