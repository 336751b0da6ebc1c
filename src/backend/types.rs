//! Request and response bodies of the analysis server.

use serde::{Deserialize, Serialize};

use crate::relay::OutputType;

/// Shown whenever a query produced no usable answer.
pub const NO_ANSWER: &str = "No answer.";

/// Response of `POST /upload-video`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadResponse {
    /// Report link for the requested output type: the matching field first,
    /// then the generic `pdf_url`. Empty strings count as absent.
    pub fn report_link(&self, output_type: OutputType) -> Option<&str> {
        let specific = match output_type {
            OutputType::Analysis => non_empty(&self.analysis),
            OutputType::Notes => non_empty(&self.notes),
        };
        specific.or_else(|| non_empty(&self.pdf_url))
    }

    pub fn session_id(&self) -> Option<&str> {
        non_empty(&self.session_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    pub top_k: usize,
}

/// Response of `POST /rag/query`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Option<QueryResults>,
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResponse {
    /// The answer to display; never empty.
    pub fn answer_or_fallback(&self) -> String {
        non_empty(&self.answer)
            .map(str::to_string)
            .unwrap_or_else(|| NO_ANSWER.to_string())
    }

    pub fn hits(&self) -> &[QueryHit] {
        self.results
            .as_ref()
            .map(|r| r.hits.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub hits: Vec<QueryHit>,
}

/// One transcript chunk the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryHit {
    pub chunk: String,
    #[serde(default)]
    pub meta: HitMeta,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HitMeta {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub chunk_id: Option<serde_json::Value>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
