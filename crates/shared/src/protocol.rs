use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::{
    domain::{Capabilities, FormRequest, VisualizationRequest},
    error::ProtocolError,
};

pub mod message_type {
    pub const INIT_DATA: &str = "INIT_DATA";
    pub const UPDATE_CAPABILITIES: &str = "UPDATE_CAPABILITIES";
    pub const EXECUTE_ACTION_VISUALIZATION: &str = "EXECUTE_ACTION_VISUALIZATION";
    pub const LOG_MESSAGE: &str = "LOG_MESSAGE";
    pub const AI_THOUGHT: &str = "AI_THOUGHT";
    pub const DISPLAY_FORM_REQUEST: &str = "DISPLAY_FORM_REQUEST";
    pub const CLEAR_FORM_DISPLAY: &str = "CLEAR_FORM_DISPLAY";

    pub const USER_ACTION: &str = "USER_ACTION";
    pub const USER_INPUT_CHANGE: &str = "USER_INPUT_CHANGE";
    pub const USER_FILLED_FORM_DATA: &str = "USER_FILLED_FORM_DATA";
}

use message_type::*;

/// Raw inbound frame. The payload stays unparsed until the type is known.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    payload: Option<Box<RawValue>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    software_id: Option<String>,
    #[serde(default)]
    software_name: Option<String>,
}

/// Commands pushed by the remote controller.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    InitData {
        software_id: String,
        software_name: Option<String>,
    },
    UpdateCapabilities(Capabilities),
    ExecuteActionVisualization(VisualizationRequest),
    LogMessage {
        message: String,
    },
    AiThought {
        message: String,
    },
    DisplayFormRequest(FormRequest),
    ClearFormDisplay,
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        let kind = envelope.kind.ok_or(ProtocolError::MissingType)?;

        match kind.as_str() {
            INIT_DATA => Ok(Self::InitData {
                software_id: envelope.software_id.ok_or(ProtocolError::MissingField {
                    kind: INIT_DATA,
                    field: "software_id",
                })?,
                software_name: envelope.software_name,
            }),
            UPDATE_CAPABILITIES => Ok(Self::UpdateCapabilities(decode_payload(
                UPDATE_CAPABILITIES,
                envelope.payload,
            )?)),
            EXECUTE_ACTION_VISUALIZATION => Ok(Self::ExecuteActionVisualization(decode_payload(
                EXECUTE_ACTION_VISUALIZATION,
                envelope.payload,
            )?)),
            LOG_MESSAGE => Ok(Self::LogMessage {
                message: envelope.message.ok_or(ProtocolError::MissingField {
                    kind: LOG_MESSAGE,
                    field: "message",
                })?,
            }),
            AI_THOUGHT => Ok(Self::AiThought {
                message: envelope.message.ok_or(ProtocolError::MissingField {
                    kind: AI_THOUGHT,
                    field: "message",
                })?,
            }),
            DISPLAY_FORM_REQUEST => Ok(Self::DisplayFormRequest(decode_payload(
                DISPLAY_FORM_REQUEST,
                envelope.payload,
            )?)),
            CLEAR_FORM_DISPLAY => Ok(Self::ClearFormDisplay),
            _ => Err(ProtocolError::UnknownType(kind)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitData { .. } => INIT_DATA,
            Self::UpdateCapabilities(_) => UPDATE_CAPABILITIES,
            Self::ExecuteActionVisualization(_) => EXECUTE_ACTION_VISUALIZATION,
            Self::LogMessage { .. } => LOG_MESSAGE,
            Self::AiThought { .. } => AI_THOUGHT,
            Self::DisplayFormRequest(_) => DISPLAY_FORM_REQUEST,
            Self::ClearFormDisplay => CLEAR_FORM_DISPLAY,
        }
    }
}

fn decode_payload<T: DeserializeOwned>(
    kind: &'static str,
    payload: Option<Box<RawValue>>,
) -> Result<T, ProtocolError> {
    let raw = payload.ok_or(ProtocolError::MissingPayload { kind })?;
    serde_json::from_str(raw.get()).map_err(|source| ProtocolError::InvalidPayload { kind, source })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAction {
    pub command: String,
    pub element_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInputChange {
    pub element_id: String,
    pub value: String,
    pub element_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilledFormData {
    pub form_data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_context: Option<Box<RawValue>>,
}

/// Operator-originated events sent back to the controller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    UserAction(UserAction),
    UserInputChange(UserInputChange),
    UserFilledFormData(FilledFormData),
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserAction(_) => USER_ACTION,
            Self::UserInputChange(_) => USER_INPUT_CHANGE,
            Self::UserFilledFormData(_) => USER_FILLED_FORM_DATA,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            kind: self.kind(),
            source,
        })
    }
}
