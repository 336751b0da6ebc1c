//! Text protocol spoken over the live capture socket.
//!
//! The server understands a handful of reserved literal strings. They are
//! kept byte-for-byte on the wire and parsed into tagged variants here so
//! the rest of the crate never matches on raw prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const OUTPUT_TYPE_PREFIX: &str = "__OUTPUT_TYPE__::";
pub const END_MEETING: &str = "__END_MEETING__";
pub const REPORT_READY_PREFIX: &str = "__REPORT_READY__::";
pub const ACK_OUTPUT_PREFIX: &str = "__ACK_OUTPUT__::";
pub const RAG_INDEXED_PREFIX: &str = "__RAG_INDEXED__::";
pub const RAG_INDEX_ERROR_PREFIX: &str = "__RAG_INDEX_ERROR__::";
pub const FINAL_ERROR_PREFIX: &str = "__ERROR_FINAL__::";

const SEPARATOR: &str = "::";

/// Which report the server should produce for a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Analysis,
    Notes,
}

impl OutputType {
    pub const ALL: [OutputType; 2] = [OutputType::Analysis, OutputType::Notes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Notes => "notes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Analysis => "Analysis PDF",
            Self::Notes => "Notes PDF",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Ok(Self::Analysis),
            "notes" => Ok(Self::Notes),
            other => Err(format!(
                "unknown output type '{other}' (expected 'analysis' or 'notes')"
            )),
        }
    }
}

/// Reserved client → server strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToken {
    OutputType(OutputType),
    EndMeeting,
}

impl ControlToken {
    pub fn encode(&self) -> String {
        match self {
            Self::OutputType(kind) => format!("{OUTPUT_TYPE_PREFIX}{kind}"),
            Self::EndMeeting => END_MEETING.to_string(),
        }
    }
}

/// A text frame received from the server.
///
/// Only `ReportReady` changes client state; every other variant is shown to
/// the user exactly as it arrived (see the `Display` impl).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ReportReady { report_id: String },
    OutputAcknowledged(String),
    RagIndexed { session_id: String },
    RagIndexError(String),
    FinalError(String),
    Status(String),
}

impl ServerEvent {
    pub fn parse(text: &str) -> Self {
        if let Some(rest) = text.strip_prefix(REPORT_READY_PREFIX) {
            // The id ends at the next separator, if any.
            let report_id = rest.split(SEPARATOR).next().unwrap_or_default();
            if !report_id.is_empty() {
                return Self::ReportReady {
                    report_id: report_id.to_string(),
                };
            }
            return Self::Status(text.to_string());
        }
        if let Some(rest) = text.strip_prefix(ACK_OUTPUT_PREFIX) {
            return Self::OutputAcknowledged(rest.to_string());
        }
        if let Some(rest) = text.strip_prefix(RAG_INDEXED_PREFIX) {
            return Self::RagIndexed {
                session_id: rest.to_string(),
            };
        }
        if let Some(rest) = text.strip_prefix(RAG_INDEX_ERROR_PREFIX) {
            return Self::RagIndexError(rest.to_string());
        }
        if let Some(rest) = text.strip_prefix(FINAL_ERROR_PREFIX) {
            return Self::FinalError(rest.to_string());
        }
        Self::Status(text.to_string())
    }

    pub fn is_report_ready(&self) -> bool {
        matches!(self, Self::ReportReady { .. })
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReportReady { report_id } => write!(f, "{REPORT_READY_PREFIX}{report_id}"),
            Self::OutputAcknowledged(kind) => write!(f, "{ACK_OUTPUT_PREFIX}{kind}"),
            Self::RagIndexed { session_id } => write!(f, "{RAG_INDEXED_PREFIX}{session_id}"),
            Self::RagIndexError(msg) => write!(f, "{RAG_INDEX_ERROR_PREFIX}{msg}"),
            Self::FinalError(msg) => write!(f, "{FINAL_ERROR_PREFIX}{msg}"),
            Self::Status(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_tokens_encode_literally() {
        assert_eq!(
            ControlToken::OutputType(OutputType::Analysis).encode(),
            "__OUTPUT_TYPE__::analysis"
        );
        assert_eq!(
            ControlToken::OutputType(OutputType::Notes).encode(),
            "__OUTPUT_TYPE__::notes"
        );
        assert_eq!(ControlToken::EndMeeting.encode(), "__END_MEETING__");
    }

    #[test]
    fn test_parse_report_ready() {
        assert_eq!(
            ServerEvent::parse("__REPORT_READY__::abc123"),
            ServerEvent::ReportReady {
                report_id: "abc123".to_string()
            }
        );
    }

    #[test]
    fn test_parse_report_ready_stops_at_next_separator() {
        assert_eq!(
            ServerEvent::parse("__REPORT_READY__::meeting_1::extra"),
            ServerEvent::ReportReady {
                report_id: "meeting_1".to_string()
            }
        );
    }

    #[test]
    fn test_report_ready_without_id_is_plain_status() {
        let event = ServerEvent::parse("__REPORT_READY__::");
        assert!(!event.is_report_ready());
        assert_eq!(event.to_string(), "__REPORT_READY__::");
    }

    #[test]
    fn test_free_text_is_status() {
        assert_eq!(
            ServerEvent::parse("Transcribing chunk 4"),
            ServerEvent::Status("Transcribing chunk 4".to_string())
        );
    }

    #[test]
    fn test_known_tokens_display_verbatim() {
        for raw in [
            "__ACK_OUTPUT__::notes",
            "__RAG_INDEXED__::meeting_42",
            "__RAG_INDEX_ERROR__::Transcript not found",
            "__ERROR_FINAL__::FFMPEG conversion failed",
            "plain status",
        ] {
            let event = ServerEvent::parse(raw);
            assert!(!event.is_report_ready());
            assert_eq!(event.to_string(), raw);
        }
    }

    #[test]
    fn test_output_type_from_str() {
        assert_eq!("notes".parse::<OutputType>(), Ok(OutputType::Notes));
        assert_eq!(" Analysis ".parse::<OutputType>(), Ok(OutputType::Analysis));
        assert!("both".parse::<OutputType>().is_err());
    }

    #[test]
    fn test_output_type_serialization() {
        let json = serde_json::to_string(&OutputType::Notes).unwrap();
        assert_eq!(json, "\"notes\"");
        let parsed: OutputType = serde_json::from_str("\"analysis\"").unwrap();
        assert_eq!(parsed, OutputType::Analysis);
    }
}
