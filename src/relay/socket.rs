//! WebSocket connection to the live capture endpoint.
//!
//! [`SocketRelay::open`] returns immediately. A background task connects,
//! announces the output type as the very first frame, then multiplexes the
//! outbound queue with inbound text frames until the server closes the
//! connection. Dropping the relay does not close the socket: the task keeps
//! reading so late server messages (the report notification arrives after
//! the end-of-meeting token) are still delivered.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::channel::{ChannelHandle, ChannelState, Outbound};
use super::protocol::{ControlToken, OutputType, ServerEvent};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("socket write failed: {0}")]
    Write(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("socket read failed: {0}")]
    Read(#[source] tokio_tungstenite::tungstenite::Error),
}

/// Lifecycle notifications from the connection task.
#[derive(Debug)]
pub enum RelayEvent {
    Connected,
    Frame(ServerEvent),
    ConnectFailed(RelayError),
    Closed(Option<RelayError>),
}

pub struct SocketRelay {
    url: String,
    channel: ChannelHandle,
    task: JoinHandle<()>,
}

impl SocketRelay {
    /// Start connecting to `url`. Must be called from within a tokio runtime.
    pub fn open(
        url: impl Into<String>,
        output_type: OutputType,
    ) -> (Self, mpsc::UnboundedReceiver<RelayEvent>) {
        let url = url.into();
        let (channel, outbound_rx) = ChannelHandle::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_connection(
            url.clone(),
            ControlToken::OutputType(output_type),
            channel.clone(),
            outbound_rx,
            events_tx,
        ));

        (Self { url, channel, task }, events_rx)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel(&self) -> &ChannelHandle {
        &self.channel
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Tear the connection down immediately, without an end-of-meeting token.
    pub fn close(self) {
        self.channel.set_state(ChannelState::NotReady);
        self.task.abort();
        debug!("Relay to {} closed", self.url);
    }
}

async fn run_connection(
    url: String,
    greeting: ControlToken,
    channel: ChannelHandle,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<RelayEvent>,
) {
    let reason = match connect_and_pump(&url, greeting, &channel, &mut outbound_rx, &events).await {
        Ok(()) => None,
        Err(err @ RelayError::Connect { .. }) => {
            warn!("{}", err);
            channel.set_state(ChannelState::NotReady);
            let _ = events.send(RelayEvent::ConnectFailed(err));
            return;
        }
        Err(err) => {
            warn!("Live socket ended with error: {}", err);
            Some(err)
        }
    };

    channel.set_state(ChannelState::NotReady);
    let _ = events.send(RelayEvent::Closed(reason));
}

async fn connect_and_pump(
    url: &str,
    greeting: ControlToken,
    channel: &ChannelHandle,
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    events: &mpsc::UnboundedSender<RelayEvent>,
) -> Result<(), RelayError> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|source| RelayError::Connect {
            url: url.to_string(),
            source,
        })?;

    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(greeting.encode()))
        .await
        .map_err(RelayError::Write)?;

    channel.set_state(ChannelState::Open);
    info!("Live socket connected: {}", url);
    let _ = events.send(RelayEvent::Connected);

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(RelayEvent::Frame(ServerEvent::parse(&text)));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Live socket closed by server");
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(RelayError::Read(e)),
                    // Binary frames are not part of the server's vocabulary;
                    // ping/pong is answered by tungstenite.
                    _ => {}
                }
            }
            Some(frame) = outbound_rx.recv() => {
                write
                    .send(frame.into_message())
                    .await
                    .map_err(RelayError::Write)?;
            }
        }
    }
}
