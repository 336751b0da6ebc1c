//! Best-effort outbound channel to the capture socket.
//!
//! Every send made by the capture pipeline goes through [`ChannelHandle::try_send`].
//! When the socket is not connected yet, or has already gone away, the frame
//! is dropped and `false` is returned. Nothing is logged to the user and
//! nothing is retried; callers that care (the chunk producer) look at the
//! return value and decide whether to keep the data around.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::protocol::ControlToken;

/// Readiness of the underlying socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    NotReady,
    Open,
}

/// One frame queued for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Binary(Vec<u8>),
}

impl Outbound {
    pub fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::Text(text),
            Self::Binary(bytes) => Message::Binary(bytes),
        }
    }
}

#[derive(Debug, Default)]
struct ChannelFlags {
    open: AtomicBool,
    dropped: AtomicU64,
}

/// Cloneable sending side of a relay connection.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    tx: mpsc::UnboundedSender<Outbound>,
    flags: Arc<ChannelFlags>,
}

impl ChannelHandle {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                flags: Arc::new(ChannelFlags::default()),
            },
            rx,
        )
    }

    pub fn state(&self) -> ChannelState {
        if self.flags.open.load(Ordering::Acquire) && !self.tx.is_closed() {
            ChannelState::Open
        } else {
            ChannelState::NotReady
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    pub(crate) fn set_state(&self, state: ChannelState) {
        self.flags
            .open
            .store(state == ChannelState::Open, Ordering::Release);
    }

    /// Queue a frame without waiting for the network write.
    pub fn try_send(&self, frame: Outbound) -> bool {
        if !self.is_open() {
            self.flags.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Socket not ready, dropping outbound frame");
            return false;
        }

        if self.tx.send(frame).is_err() {
            self.flags.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Socket writer gone, dropping outbound frame");
            return false;
        }

        true
    }

    pub fn try_send_control(&self, token: ControlToken) -> bool {
        self.try_send(Outbound::Text(token.encode()))
    }

    pub fn try_send_chunk(&self, bytes: Vec<u8>) -> bool {
        self.try_send(Outbound::Binary(bytes))
    }

    /// Frames refused by the send guard so far.
    pub fn dropped_frames(&self) -> u64 {
        self.flags.dropped.load(Ordering::Relaxed)
    }
}
