//! Transport seam. The engine only ever sees a [`Channel`] plus a stream of
//! [`ChannelEvent`]s; the websocket specifics stay in this module.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ChannelError;

pub trait Channel {
    fn is_open(&self) -> bool;
    fn send_text(&self, text: String) -> Result<(), ChannelError>;
    /// Starts a normal close. Safe to call more than once.
    fn close(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Error(String),
    Closed(ChannelClosure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelClosure {
    pub clean: bool,
    pub code: u16,
    pub reason: String,
}

impl ChannelClosure {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const NO_STATUS: u16 = 1005;
    pub const ABNORMAL: u16 = 1006;

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            clean: false,
            code: Self::ABNORMAL,
            reason: reason.into(),
        }
    }

    pub fn is_abnormal(&self) -> bool {
        !self.clean && !matches!(self.code, Self::NORMAL | Self::GOING_AWAY)
    }

    pub fn alert_text(&self) -> String {
        let reason = if self.reason.is_empty() {
            format!("Code {}", self.code)
        } else {
            self.reason.clone()
        };
        format!("Connection to server lost unexpectedly. Please refresh. Reason: {reason}")
    }
}

/// Websocket-backed channel. Cloning shares the same connection.
#[derive(Debug, Clone)]
pub struct WsChannel {
    outgoing: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl WsChannel {
    /// Connects and starts the reader and writer tasks. Every event for the
    /// lifetime of the connection goes to `on_event`, ending with exactly one
    /// [`ChannelEvent::Closed`]. A failed connect is reported through
    /// `on_event` as well as the returned error.
    pub async fn connect<F>(endpoint: &Url, on_event: F) -> Result<Self, ChannelError>
    where
        F: Fn(ChannelEvent) + Send + Sync + 'static,
    {
        let (ws_stream, _) = match connect_async(endpoint.as_str()).await {
            Ok(connected) => connected,
            Err(source) => {
                warn!(endpoint = %endpoint, error = %source, "channel: connect failed");
                on_event(ChannelEvent::Error(source.to_string()));
                on_event(ChannelEvent::Closed(ChannelClosure::abnormal(String::new())));
                return Err(ChannelError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                });
            }
        };
        info!(endpoint = %endpoint, "channel: connected");

        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let open = Arc::new(AtomicBool::new(true));
        on_event(ChannelEvent::Opened);

        let writer_open = Arc::clone(&open);
        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(err) = ws_writer.send(message).await {
                    warn!(error = %err, "channel: write failed");
                    writer_open.store(false, Ordering::SeqCst);
                    break;
                }
            }
            debug!("channel: writer finished");
        });

        let reader_open = Arc::clone(&open);
        tokio::spawn(async move {
            let closure = loop {
                match ws_reader.next().await {
                    Some(Ok(Message::Text(text))) => on_event(ChannelEvent::Frame(text)),
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => ChannelClosure {
                                clean: true,
                                code: u16::from(frame.code),
                                reason: frame.reason.into_owned(),
                            },
                            None => ChannelClosure {
                                clean: true,
                                code: ChannelClosure::NO_STATUS,
                                reason: String::new(),
                            },
                        };
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        debug!(len = bytes.len(), "channel: ignoring binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        on_event(ChannelEvent::Error(err.to_string()));
                        break ChannelClosure::abnormal(String::new());
                    }
                    None => break ChannelClosure::abnormal(String::new()),
                }
            };
            reader_open.store(false, Ordering::SeqCst);
            info!(code = closure.code, clean = closure.clean, "channel: closed");
            on_event(ChannelEvent::Closed(closure));
        });

        Ok(Self { outgoing, open })
    }

    /// A channel that was never connected. Every send fails with
    /// [`ChannelError::NotOpen`].
    pub fn disconnected() -> Self {
        let (outgoing, _) = mpsc::unbounded_channel();
        Self {
            outgoing,
            open: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Channel for WsChannel {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.outgoing.is_closed()
    }

    fn send_text(&self, text: String) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::NotOpen);
        }
        self.outgoing
            .send(Message::Text(text))
            .map_err(|_| ChannelError::NotOpen)
    }

    fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        if self.outgoing.send(Message::Close(Some(frame))).is_err() {
            debug!("channel: writer already gone on close");
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    sent: Vec<String>,
    close_requests: usize,
}

/// In-process channel that records outgoing frames.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryChannel {
    pub fn open() -> Self {
        let channel = Self::default();
        channel.set_open(true);
        channel
    }

    pub fn closed() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_open(&self, open: bool) {
        self.state().open = open;
    }

    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state().sent)
    }

    pub fn close_requests(&self) -> usize {
        self.state().close_requests
    }
}

impl Channel for MemoryChannel {
    fn is_open(&self) -> bool {
        self.state().open
    }

    fn send_text(&self, text: String) -> Result<(), ChannelError> {
        let mut state = self.state();
        if !state.open {
            return Err(ChannelError::NotOpen);
        }
        state.sent.push(text);
        Ok(())
    }

    fn close(&self) {
        let mut state = self.state();
        state.open = false;
        state.close_requests += 1;
    }
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
