//! Page selection. One page is shown at a time; there is no history.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Dashboard,
    Transcription,
    Rag,
    Settings,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Dashboard,
        Page::Transcription,
        Page::Rag,
        Page::Settings,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Transcription => "transcribe",
            Page::Rag => "rag",
            Page::Settings => "settings",
        }
    }

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Transcription => "Transcription",
            Page::Rag => "RAG",
            Page::Settings => "Settings",
        }
    }

    /// Top bar title: the page key in capitals.
    pub fn title(&self) -> String {
        self.key().to_uppercase()
    }

    pub fn from_key(key: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Default)]
pub struct ViewRouter {
    current: Page,
}

impl ViewRouter {
    pub fn current(&self) -> Page {
        self.current
    }

    /// Switch pages. Only the selection changes; page state is untouched.
    pub fn navigate(&mut self, page: Page) {
        self.current = page;
    }
}
