//! Free-text questions against the retrieval index.

use anyhow::{anyhow, bail, Result};
use tracing::{debug, error};

use super::state::RagState;
use crate::backend::Backend;

/// Ask `question` and fold the answer into `rag`.
///
/// On failure, including an `error` field in the response body, the
/// displayed answer becomes the fallback text and the error is returned.
pub async fn ask(backend: &dyn Backend, rag: &mut RagState, question: &str, top_k: usize) -> Result<()> {
    rag.question = question.to_string();

    match backend.query(question, top_k).await {
        Ok(response) => {
            if let Some(message) = response.error.as_deref().filter(|m| !m.is_empty()) {
                error!("Server failed to answer query: {}", message);
                rag.apply_failure();
                bail!("Server failed to answer query: {}", message);
            }
            rag.apply_response(&response);
            debug!("Query answered with {} hit(s)", rag.hits.len());
            Ok(())
        }
        Err(e) => {
            error!("Query failed: {}", e);
            rag.apply_failure();
            Err(anyhow!(e).context("Failed to query the index"))
        }
    }
}
