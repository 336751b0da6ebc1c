//! HTTP side of the analysis server: upload, index, query and report
//! retrieval.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

use async_trait::async_trait;
use std::path::Path;

use crate::relay::OutputType;

pub use client::{mime_type_for_extension, BackendClient};
pub use endpoints::Endpoints;
pub use error::BackendError;
pub use types::{QueryHit, QueryResponse, UploadResponse, NO_ANSWER};

/// The request/response calls the workspace flows depend on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn upload_video(
        &self,
        file_path: &Path,
        output_type: OutputType,
    ) -> Result<UploadResponse, BackendError>;

    async fn store_session(&self, session_id: &str) -> Result<(), BackendError>;

    async fn store_all(&self) -> Result<(), BackendError>;

    async fn query(&self, question: &str, top_k: usize) -> Result<QueryResponse, BackendError>;
}

#[async_trait]
impl Backend for BackendClient {
    async fn upload_video(
        &self,
        file_path: &Path,
        output_type: OutputType,
    ) -> Result<UploadResponse, BackendError> {
        BackendClient::upload_video(self, file_path, output_type).await
    }

    async fn store_session(&self, session_id: &str) -> Result<(), BackendError> {
        BackendClient::store_session(self, session_id).await
    }

    async fn store_all(&self) -> Result<(), BackendError> {
        BackendClient::store_all(self).await.map(|_| ())
    }

    async fn query(&self, question: &str, top_k: usize) -> Result<QueryResponse, BackendError> {
        BackendClient::query(self, question, top_k).await
    }
}
