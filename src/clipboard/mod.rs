//! Copying report links to the system clipboard.

use anyhow::{anyhow, Result};
use arboard::Clipboard;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use which::which;

/// Copy `text` with the native clipboard, falling back to the desktop's
/// clipboard tools when no native backend is available.
pub fn copy_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => {
            debug!("Copied {} chars with native clipboard", text.len());
            Ok(())
        }
        Err(err) => {
            warn!("Native clipboard unavailable ({}), trying system tools", err);
            copy_with_system_backends(text)
        }
    }
}

fn copy_with_system_backends(text: &str) -> Result<()> {
    for backend in CLIPBOARD_BACKENDS {
        if which(backend.copy_cmd).is_err() {
            continue;
        }

        let mut child = match Command::new(backend.copy_cmd)
            .args(backend.copy_args)
            .stdin(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                debug!("Failed to spawn {}: {}", backend.name, err);
                continue;
            }
        };

        if let Some(stdin) = child.stdin.as_mut() {
            if stdin.write_all(text.as_bytes()).is_err() {
                continue;
            }
        }

        if let Ok(status) = child.wait() {
            if status.success() {
                debug!("Copied {} chars with {}", text.len(), backend.name);
                return Ok(());
            }
        }
    }

    Err(anyhow!(
        "No clipboard tool (wl-copy/xclip/xsel) available for fallback"
    ))
}

struct ClipboardBackend {
    name: &'static str,
    copy_cmd: &'static str,
    copy_args: &'static [&'static str],
}

const CLIPBOARD_BACKENDS: &[ClipboardBackend] = &[
    ClipboardBackend {
        name: "wl-copy",
        copy_cmd: "wl-copy",
        copy_args: &[],
    },
    ClipboardBackend {
        name: "xclip",
        copy_cmd: "xclip",
        copy_args: &["-selection", "clipboard"],
    },
    ClipboardBackend {
        name: "xsel",
        copy_cmd: "xsel",
        copy_args: &["--clipboard", "--input"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_noop() {
        assert!(copy_text("").is_ok());
    }
}
