//! Single-consumer event loop around [`SyncEngine`].
//!
//! Channel callbacks, operator input and effect timers all post into one
//! unbounded queue; the session drains it in order and runs each handler to
//! completion, so engine state needs no locking.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{
    channel::{Channel, ChannelEvent},
    engine::{ConnectionState, EngineConfig, OperatorEvent, SyncEngine},
    visualizer::{EffectScheduler, EffectToken},
};

/// How long a shutdown waits for the peer to acknowledge the close frame.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Channel(ChannelEvent),
    Operator(OperatorEvent),
    EffectExpired(EffectToken),
    Shutdown,
}

/// Producer side of the session queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Callback suitable for [`crate::channel::WsChannel::connect`].
    pub fn channel_sink(&self) -> impl Fn(ChannelEvent) + Send + Sync + 'static {
        let tx = self.tx.clone();
        move |event| {
            if tx.send(SessionEvent::Channel(event)).is_err() {
                debug!("session: queue closed, dropping channel event");
            }
        }
    }

    pub fn operator(&self, event: OperatorEvent) -> bool {
        self.tx.send(SessionEvent::Operator(event)).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(SessionEvent::Shutdown).is_ok()
    }

    pub fn effect_scheduler(&self) -> TokioEffectScheduler {
        TokioEffectScheduler {
            tx: self.tx.clone(),
        }
    }
}

pub struct SessionQueue {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

pub fn session_queue() -> (SessionHandle, SessionQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionHandle { tx }, SessionQueue { rx })
}

/// Posts each expiry back into the session queue after a tokio sleep.
/// Timers are never cancelled.
#[derive(Debug, Clone)]
pub struct TokioEffectScheduler {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EffectScheduler for TokioEffectScheduler {
    fn schedule(&mut self, token: EffectToken, after: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if tx.send(SessionEvent::EffectExpired(token)).is_err() {
                debug!(?token, "session: queue closed, dropping effect expiry");
            }
        });
    }
}

pub type SessionEngine<C> = SyncEngine<C, TokioEffectScheduler>;

pub struct Session<C> {
    engine: SessionEngine<C>,
    queue: SessionQueue,
}

impl<C: Channel> Session<C> {
    pub fn new(channel: C, config: EngineConfig, handle: &SessionHandle, queue: SessionQueue) -> Self {
        Self {
            engine: SyncEngine::new(channel, handle.effect_scheduler(), config),
            queue,
        }
    }

    pub fn engine(&self) -> &SessionEngine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SessionEngine<C> {
        &mut self.engine
    }

    pub async fn run(self) -> SessionEngine<C> {
        self.run_with(|_| {}).await
    }

    /// Drains the queue until shutdown or channel closure. `observer` sees the
    /// engine after each handled event.
    pub async fn run_with(mut self, mut observer: impl FnMut(&SessionEngine<C>)) -> SessionEngine<C> {
        while let Some(event) = self.queue.rx.recv().await {
            match event {
                SessionEvent::Channel(event) => {
                    let closed = matches!(event, ChannelEvent::Closed(_));
                    self.engine.handle_channel_event(event);
                    observer(&self.engine);
                    if closed {
                        info!("session: channel closed, ending session");
                        break;
                    }
                }
                SessionEvent::Operator(event) => {
                    if let Err(err) = self.engine.handle_operator_event(event) {
                        debug!(%err, "session: operator event rejected");
                    }
                    observer(&self.engine);
                }
                SessionEvent::EffectExpired(token) => {
                    if self.engine.expire_effect(token) {
                        observer(&self.engine);
                    }
                }
                SessionEvent::Shutdown => {
                    let was_open = self.engine.connection() == &ConnectionState::Open;
                    self.engine.shutdown();
                    observer(&self.engine);
                    if was_open {
                        self.await_close().await;
                        observer(&self.engine);
                    }
                    break;
                }
            }
        }
        self.engine
    }

    async fn await_close(&mut self) {
        let engine = &mut self.engine;
        let rx = &mut self.queue.rx;
        let waited = tokio::time::timeout(CLOSE_GRACE, async {
            while let Some(event) = rx.recv().await {
                if let SessionEvent::Channel(event @ ChannelEvent::Closed(_)) = event {
                    engine.handle_channel_event(event);
                    return;
                }
            }
        })
        .await;
        if waited.is_err() {
            debug!("session: close not acknowledged within grace period");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
