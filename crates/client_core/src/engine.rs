//! The synchronization engine: owns every piece of surface state and applies
//! channel, operator and timer events to it one at a time.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    action_log::ActionLog,
    channel::{Channel, ChannelClosure, ChannelEvent},
    error::InteractionError,
    layout::LayoutTable,
    outbound::OutboundSender,
    overlay::{OverlayController, OverlayState},
    surface::{ElementNode, Surface},
    visualizer::{ActionVisualizer, EffectPolicy, EffectScheduler, EffectToken, DEFAULT_EFFECT_DURATION},
};

pub const STATUS_CONNECTING: &str = "Connecting to AI control system...";
pub const STATUS_CONNECTED: &str = "Connected to AI control system.";
pub const STATUS_CONNECT_ERROR: &str = "Error connecting to AI control system.";
pub const STATUS_DISCONNECTED: &str = "Disconnected from AI control system.";
pub const STATUS_FORM_SUBMITTED: &str = "Form submitted to AI. Waiting for response...";

/// Input produced by the local operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorEvent {
    Click { element_id: String },
    Focus { element_id: String },
    Edit { element_id: String, value: String },
    Blur { element_id: String },
    Confirm { element_id: String },
    EditFormField { field_id: String, value: String },
    SubmitForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub effect_duration: Duration,
    pub effect_policy: EffectPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            effect_duration: DEFAULT_EFFECT_DURATION,
            effect_policy: EffectPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed(ChannelClosure),
}

/// Identity announced by the controller in INIT_DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub software_id: String,
    pub software_name: Option<String>,
}

impl Registration {
    pub fn display_name(&self) -> &str {
        self.software_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.software_id)
    }
}

pub struct SyncEngine<C, S> {
    pub(crate) config: EngineConfig,
    pub(crate) sender: OutboundSender<C>,
    pub(crate) scheduler: S,
    pub(crate) log: ActionLog,
    pub(crate) overlay: OverlayController,
    pub(crate) layout: LayoutTable,
    pub(crate) visualizer: ActionVisualizer,
    pub(crate) connection: ConnectionState,
    pub(crate) registration: Option<Registration>,
    pub(crate) status: String,
    pub(crate) current_view: Option<String>,
    pub(crate) alerts: Vec<String>,
}

impl<C: Channel, S: EffectScheduler> SyncEngine<C, S> {
    pub fn new(channel: C, scheduler: S, config: EngineConfig) -> Self {
        let connection = if channel.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Connecting
        };
        Self {
            config,
            sender: OutboundSender::new(channel),
            scheduler,
            log: ActionLog::new(),
            overlay: OverlayController::new(),
            layout: LayoutTable::default(),
            visualizer: ActionVisualizer::new(config.effect_policy, config.effect_duration),
            connection,
            registration: None,
            status: STATUS_CONNECTING.to_string(),
            current_view: None,
            alerts: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay.state()
    }

    pub fn surface(&self) -> &Surface {
        self.overlay.surface()
    }

    pub fn layout_mut(&mut self) -> &mut LayoutTable {
        &mut self.layout
    }

    pub fn channel(&self) -> &C {
        self.sender.channel()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// Single-slot status line; each update replaces the previous one.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn current_view(&self) -> Option<&str> {
        self.current_view.as_deref()
    }

    /// Operator alerts raised so far, oldest first.
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        debug!(status = %self.status, "engine: status");
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                self.connection = ConnectionState::Open;
                self.set_status(STATUS_CONNECTED);
                self.log.info("Connected to server.");
            }
            ChannelEvent::Frame(text) => self.handle_frame(&text),
            ChannelEvent::Error(reason) => {
                self.set_status(STATUS_CONNECT_ERROR);
                self.log.error(format!("[ERROR] WebSocket error: {reason}"));
            }
            ChannelEvent::Closed(closure) => {
                if matches!(self.connection, ConnectionState::Closed(_)) {
                    debug!("engine: duplicate close ignored");
                    return;
                }
                self.set_status(STATUS_DISCONNECTED);
                self.log.info(format!(
                    "Disconnected from server (code {}{}).",
                    closure.code,
                    if closure.clean { "" } else { ", unclean" }
                ));
                if closure.is_abnormal() {
                    let alert = closure.alert_text();
                    warn!(code = closure.code, "engine: connection lost");
                    self.log.error(format!("[ERROR] {alert}"));
                    self.alerts.push(alert);
                }
                self.connection = ConnectionState::Closed(closure);
            }
        }
    }

    /// Applies one operator interaction. Rejected interactions are logged as
    /// warnings and returned to the caller; nothing is sent for them.
    pub fn handle_operator_event(&mut self, event: OperatorEvent) -> Result<(), InteractionError> {
        let result = self.apply_operator_event(event);
        if let Err(err) = &result {
            self.log.warn(format!("Interaction rejected: {err}"));
        }
        result
    }

    fn apply_operator_event(&mut self, event: OperatorEvent) -> Result<(), InteractionError> {
        match event {
            OperatorEvent::Click { element_id } => {
                let node = self.element_mut(&element_id)?;
                match node.click() {
                    Some(message) => {
                        self.sender.deliver(&message, &mut self.log);
                    }
                    None => debug!(%element_id, "engine: click on non-interactive element"),
                }
            }
            OperatorEvent::Focus { element_id } => {
                if !self.element_mut(&element_id)?.focus() {
                    return Err(InteractionError::NotEditable(element_id));
                }
            }
            OperatorEvent::Edit { element_id, value } => {
                if !self.element_mut(&element_id)?.edit(value) {
                    return Err(InteractionError::NotEditable(element_id));
                }
            }
            OperatorEvent::Blur { element_id } => {
                let node = self.editable_mut(&element_id)?;
                if let Some(message) = node.blur() {
                    self.sender.deliver(&message, &mut self.log);
                }
            }
            OperatorEvent::Confirm { element_id } => {
                let node = self.editable_mut(&element_id)?;
                if let Some(message) = node.confirm() {
                    self.sender.deliver(&message, &mut self.log);
                }
            }
            OperatorEvent::EditFormField { field_id, value } => {
                self.overlay.edit_form_field(&field_id, &value)?;
            }
            OperatorEvent::SubmitForm => {
                let message = self.overlay.submit_form()?;
                if self.sender.deliver(&message, &mut self.log) {
                    self.set_status(STATUS_FORM_SUBMITTED);
                }
            }
        }
        Ok(())
    }

    fn element_mut(&mut self, element_id: &str) -> Result<&mut ElementNode, InteractionError> {
        self.overlay
            .surface_mut()
            .element_mut(element_id)
            .ok_or_else(|| InteractionError::UnknownElement(element_id.to_string()))
    }

    fn editable_mut(&mut self, element_id: &str) -> Result<&mut ElementNode, InteractionError> {
        let node = self.element_mut(element_id)?;
        if node.input.is_none() {
            return Err(InteractionError::NotEditable(element_id.to_string()));
        }
        Ok(node)
    }

    /// A visualization timer fired.
    pub fn expire_effect(&mut self, token: EffectToken) -> bool {
        self.visualizer.expire(self.overlay.surface_mut(), token)
    }

    /// Starts a normal close of the channel.
    pub fn shutdown(&mut self) {
        info!("engine: shutting down");
        self.sender.channel().close();
        self.log.info("Session closed by operator.");
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
