//! Plain-text rendering of each page.
//!
//! Renderers only read state; every mutation goes through [`super::Workspace`].

use std::fmt::Write;

use super::router::Page;
use super::state::{RagState, TranscriptionState};
use crate::config::Config;
use crate::relay::OutputType;

pub const SUBTITLE: &str = "Audio analysis workspace";

pub fn render_sidebar(current: Page) -> String {
    let mut out = String::from("EasyAnalyzer\n");
    for page in Page::ALL {
        let marker = if page == current { ">" } else { " " };
        let _ = writeln!(out, "{} {}", marker, page.label());
    }
    out
}

/// Shown on every page, so a running capture is never out of sight.
pub fn render_topbar(page: Page, recording: bool) -> String {
    let mut out = format!("{}\n{}", page.title(), SUBTITLE);
    if recording {
        out.push_str("\n● Recording");
    }
    out
}

pub fn render_dashboard(transcription: &TranscriptionState) -> String {
    let mut out = String::from("Welcome to EasyAnalyzer.\n");
    let _ = writeln!(
        out,
        "Session: {}",
        transcription.session_id.as_deref().unwrap_or("none")
    );
    let _ = writeln!(out, "Output: {}", transcription.output_type.label());
    match transcription.activity.latest() {
        Some(entry) => {
            let _ = writeln!(out, "Last activity: {}", entry);
        }
        None => out.push_str("Last activity: none\n"),
    }
    out
}

pub fn render_transcription(state: &TranscriptionState) -> String {
    let mut out = String::new();

    out.push_str("Output type:\n");
    for output_type in OutputType::ALL {
        let marker = if output_type == state.output_type { "(x)" } else { "( )" };
        let _ = writeln!(out, "  {} {}", marker, output_type.label());
    }

    let _ = writeln!(
        out,
        "Capture: {}",
        if state.recording { "recording" } else { "idle" }
    );

    if let Some(link) = &state.report_link {
        let _ = writeln!(out, "\nReport ready!\n{}", link);
    }

    out.push_str("\nActivity\n");
    if state.activity.is_empty() {
        out.push_str("No activity yet\n");
    } else {
        for entry in state.activity.entries() {
            let _ = writeln!(out, "  {}", entry);
        }
    }

    out
}

pub fn render_rag(state: &RagState) -> String {
    let mut out = String::new();

    if !state.question.is_empty() {
        let _ = writeln!(out, "Q: {}", state.question);
    }

    match &state.answer {
        Some(answer) => {
            let _ = writeln!(out, "A: {}", answer);
        }
        None => out.push_str("Ask a question about your indexed sessions.\n"),
    }

    if !state.hits.is_empty() {
        out.push_str("\nSources\n");
        for hit in &state.hits {
            let _ = writeln!(
                out,
                "  [{:.2}] {}: {}",
                hit.score,
                hit.meta.session_id.as_deref().unwrap_or("?"),
                snippet(&hit.chunk, 120)
            );
        }
    }

    out
}

pub fn render_settings(config: &Config) -> String {
    let mut out = String::new();
    let endpoints = config.server.endpoints();
    let _ = writeln!(out, "Server: {}", endpoints.http_base());
    let _ = writeln!(
        out,
        "Request timeout: {}",
        match config.server.request_timeout() {
            Some(timeout) => format!("{}s", timeout.as_secs()),
            None => "none".to_string(),
        }
    );
    let _ = writeln!(out, "Default output: {}", config.capture.default_output.label());
    let _ = writeln!(out, "Chunk interval: {}ms", config.capture.chunk_interval().as_millis());
    let _ = writeln!(out, "Sample rate: {} Hz", config.capture.sample_rate);
    let _ = writeln!(
        out,
        "Input device: {}",
        config.capture.input_device().as_deref().unwrap_or("default")
    );
    let _ = writeln!(
        out,
        "System audio: {}",
        if config.capture.include_system_audio { "on" } else { "off" }
    );
    let _ = writeln!(out, "RAG top k: {}", config.rag.top_k);
    out
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
