#![allow(dead_code)]

use anyhow::{bail, Result};
use easyanalyzer::audio::SampleTap;
use easyanalyzer::capture::CaptureSurface;
use easyanalyzer::workspace::TranscriptionHandle;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

pub const WAIT: Duration = Duration::from_secs(5);

/// In-memory capture surface.
pub struct FakeSurface {
    taps: Vec<SampleTap>,
    fail: bool,
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

impl FakeSurface {
    pub fn new(taps: Vec<SampleTap>) -> Self {
        Self {
            taps,
            fail: false,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn refusing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

impl CaptureSurface for FakeSurface {
    fn acquire(&mut self) -> Result<Vec<SampleTap>> {
        if self.fail {
            bail!("Permission denied");
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(self.taps.clone())
    }

    fn release(&mut self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One accepted socket on the test server.
pub struct Connection {
    pub path: String,
    frames: mpsc::UnboundedReceiver<Message>,
    replies: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub async fn next_frame(&mut self) -> Option<Message> {
        timeout(WAIT, self.frames.recv()).await.ok().flatten()
    }

    /// Next frame if one arrives within `wait`.
    pub async fn frame_within(&mut self, wait: Duration) -> Option<Message> {
        timeout(wait, self.frames.recv()).await.ok().flatten()
    }

    pub fn reply(&self, text: &str) {
        let _ = self.replies.send(Message::Text(text.to_string()));
    }

    pub fn close(&self) {
        let _ = self.replies.send(Message::Close(None));
    }
}

/// Minimal live-capture server: records every frame and sends scripted replies.
pub struct WsServer {
    pub host: String,
    connections: mpsc::UnboundedReceiver<Connection>,
}

impl WsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        let (conn_tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let mut path = String::new();
                let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    path = req.uri().path().to_string();
                    Ok(resp)
                };
                let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                    continue;
                };

                let (frames_tx, frames) = mpsc::unbounded_channel();
                let (replies, mut replies_rx) = mpsc::unbounded_channel::<Message>();
                if conn_tx
                    .send(Connection {
                        path,
                        frames,
                        replies,
                    })
                    .is_err()
                {
                    break;
                }

                tokio::spawn(async move {
                    let (mut write, mut read) = ws.split();
                    loop {
                        tokio::select! {
                            msg = read.next() => match msg {
                                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(msg)) => {
                                    let _ = frames_tx.send(msg);
                                }
                            },
                            reply = replies_rx.recv() => match reply {
                                Some(msg) => {
                                    let closing = msg.is_close();
                                    if write.send(msg).await.is_err() || closing {
                                        break;
                                    }
                                }
                                None => break,
                            },
                        }
                    }
                });
            }
        });

        Self { host, connections }
    }

    pub async fn next_connection(&mut self) -> Option<Connection> {
        timeout(WAIT, self.connections.recv()).await.ok().flatten()
    }

    pub async fn connection_within(&mut self, wait: Duration) -> Option<Connection> {
        timeout(wait, self.connections.recv()).await.ok().flatten()
    }
}

/// Poll `check` until it holds or the wait runs out.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Wait for an activity entry matching `matches`.
pub async fn wait_for_log<F>(transcription: &TranscriptionHandle, matches: F) -> bool
where
    F: Fn(&str) -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let state = transcription.get().await;
        if state.activity.messages().into_iter().any(&matches) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
