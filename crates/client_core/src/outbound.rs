//! Packages operator interactions and hands them to the channel.

use shared::protocol::OutboundMessage;
use tracing::{debug, warn};

use crate::{action_log::ActionLog, channel::Channel};

pub struct OutboundSender<C> {
    channel: C,
}

impl<C: Channel> OutboundSender<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sends `message`, recording the outcome in the log. A closed channel or an
    /// encoding failure discards the message; neither is raised to the caller.
    pub fn deliver(&self, message: &OutboundMessage, log: &mut ActionLog) -> bool {
        let kind = message.kind();
        let encoded = match message.to_json() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(kind, %err, "outbound: encode failed");
                log.error(format!("[ERROR] Could not encode {kind}: {err}"));
                return false;
            }
        };

        if let Err(err) = self.channel.send_text(encoded) {
            warn!(kind, %err, "outbound: delivery failed");
            log.error(format!("[ERROR] {kind} not delivered: {err}"));
            return false;
        }

        debug!(kind, "outbound: sent");
        log.info(sent_summary(message));
        true
    }
}

fn sent_summary(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::UserAction(action) => format!(
            "User action sent: {} on '{}'",
            action.command, action.element_id
        ),
        OutboundMessage::UserInputChange(change) => format!(
            "User input on '{}' ('{}') sent to server.",
            change.element_id, change.value
        ),
        OutboundMessage::UserFilledFormData(data) => format!(
            "User submitted form data: {}",
            serde_json::to_string(&data.form_data).unwrap_or_default()
        ),
    }
}
