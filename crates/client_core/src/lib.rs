//! Client-side synchronization engine for a remotely controlled surface.
//!
//! A controller pushes view descriptions, visualization commands and form
//! requests over a websocket; [`engine::SyncEngine`] turns them into a
//! headless [`surface::Surface`] and reports operator interactions back.

pub mod action_log;
pub mod builder;
pub mod channel;
pub mod config;
mod dispatcher;
pub mod engine;
pub mod error;
pub mod layout;
pub mod outbound;
pub mod overlay;
pub mod render;
pub mod session;
pub mod surface;
pub mod visualizer;

pub use channel::{Channel, ChannelClosure, ChannelEvent, MemoryChannel, WsChannel};
pub use engine::{EngineConfig, OperatorEvent, SyncEngine};
pub use overlay::OverlayState;
pub use session::{session_queue, Session, SessionHandle};
pub use visualizer::EffectPolicy;
