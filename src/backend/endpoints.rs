//! URL construction for every server endpoint the client talks to.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http_base: String,
    ws_base: String,
}

impl Endpoints {
    /// `host` is `host:port`; a leading scheme is tolerated and replaced
    /// according to `secure`.
    pub fn new(host: &str, secure: bool) -> Self {
        let host = strip_scheme(host.trim()).trim_end_matches('/');
        let (http, ws) = if secure {
            ("https", "wss")
        } else {
            ("http", "ws")
        };

        Self {
            http_base: format!("{http}://{host}"),
            ws_base: format!("{ws}://{host}"),
        }
    }

    pub fn http_base(&self) -> &str {
        &self.http_base
    }

    pub fn live_socket(&self, session_id: &str) -> String {
        format!("{}/ws/live/{}", self.ws_base, session_id)
    }

    pub fn live_report(&self, report_id: &str) -> String {
        format!("{}/live-report/{}", self.http_base, report_id)
    }

    pub fn upload_video(&self) -> String {
        format!("{}/upload-video", self.http_base)
    }

    pub fn rag_store(&self, session_id: &str) -> String {
        format!("{}/rag/store/{}", self.http_base, session_id)
    }

    pub fn rag_store_all(&self) -> String {
        format!("{}/rag/store_all", self.http_base)
    }

    pub fn rag_query(&self) -> String {
        format!("{}/rag/query", self.http_base)
    }
}

fn strip_scheme(host: &str) -> &str {
    for scheme in ["https://", "http://", "wss://", "ws://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            return rest;
        }
    }
    host
}
