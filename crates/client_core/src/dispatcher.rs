//! Routes inbound frames to the component that owns each message type.

use shared::protocol::InboundMessage;
use tracing::{debug, warn};

use crate::{
    channel::Channel,
    engine::{Registration, SyncEngine},
    overlay::RenderOutcome,
    visualizer::EffectScheduler,
};

const FALLBACK_FORM_PROMPT: &str = "Please complete the form.";

impl<C: Channel, S: EffectScheduler> SyncEngine<C, S> {
    /// Applies one inbound text frame. Frames that fail to parse or validate
    /// are dropped with a single Action Log error and leave the surface alone.
    pub fn handle_frame(&mut self, text: &str) {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(err) => {
                warn!(kind = ?err.kind(), error = %err, "dispatcher: dropping frame");
                self.log
                    .error(format!("[ERROR] Failed to process message from server: {err}"));
                return;
            }
        };
        debug!(kind = message.kind(), "dispatcher: routing");

        match message {
            InboundMessage::InitData {
                software_id,
                software_name,
            } => {
                let registration = Registration {
                    software_id,
                    software_name,
                };
                self.log.info(format!(
                    "Registered with server as '{}' ({}).",
                    registration.display_name(),
                    registration.software_id
                ));
                self.set_status(format!(
                    "Registered as {}. Waiting for AI...",
                    registration.display_name()
                ));
                self.registration = Some(registration);
            }
            InboundMessage::UpdateCapabilities(capabilities) => {
                if self.overlay.clear_form() {
                    self.log.info("Form display released for the updated view.");
                }
                self.current_view = capabilities.current_view.clone();
                match self.overlay.render_capabilities(&capabilities, &self.layout) {
                    RenderOutcome::Deferred { cleared } => {
                        warn!(cleared, "dispatcher: view update deferred behind a form")
                    }
                    RenderOutcome::Rendered { elements } => {
                        debug!(elements, view = ?self.current_view, "dispatcher: view rendered")
                    }
                    RenderOutcome::Placeholder => {}
                }
                self.set_status("AI is observing. View updated.");
            }
            InboundMessage::ExecuteActionVisualization(request) => {
                let element_id = request.element_id.as_deref().unwrap_or_default();
                let with_text = request
                    .text
                    .as_deref()
                    .map(|text| format!(" with text \"{text}\""))
                    .unwrap_or_default();
                self.log.info(format!(
                    "AI: {} on '{element_id}'{with_text}. (Reason: {})",
                    request.command,
                    request.description.as_deref().unwrap_or("N/A")
                ));

                self.visualizer.visualize(
                    self.overlay.surface_mut(),
                    &request,
                    &mut self.scheduler,
                    &mut self.log,
                );

                let summary = request
                    .description
                    .clone()
                    .filter(|description| !description.is_empty())
                    .unwrap_or_else(|| request.command.to_string());
                self.set_status(format!("AI action: {summary}"));
            }
            InboundMessage::LogMessage { message } => {
                self.log.info(format!("[SERVER]: {message}"));
            }
            InboundMessage::AiThought { message } => {
                self.set_status(format!("AI is thinking: \"{message}\""));
            }
            InboundMessage::DisplayFormRequest(request) => {
                let prompt = request
                    .form_description
                    .clone()
                    .filter(|description| !description.is_empty())
                    .unwrap_or_else(|| FALLBACK_FORM_PROMPT.to_string());
                self.log.info(format!(
                    "Form requested by AI: {prompt} ({} fields)",
                    request.fields.len()
                ));
                self.overlay.show_form(request);
                self.set_status(format!("AI needs input for form: {prompt}"));
            }
            InboundMessage::ClearFormDisplay => {
                if self.overlay.clear_form() {
                    self.log.info("Form display cleared by AI.");
                } else {
                    debug!("dispatcher: clear requested with no form displayed");
                }
            }
        }
    }
}
