use thiserror::Error;

/// Reasons an inbound frame is dropped or an outbound one cannot be encoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("message has no type discriminator")]
    MissingType,
    #[error("unrecognized message type '{0}'")]
    UnknownType(String),
    #[error("{kind} message is missing its payload")]
    MissingPayload { kind: &'static str },
    #[error("{kind} message is missing field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("{kind} payload failed validation: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Message type the error was raised for, when it got that far.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::InvalidJson(_) | Self::MissingType => None,
            Self::UnknownType(kind) => Some(kind),
            Self::MissingPayload { kind }
            | Self::MissingField { kind, .. }
            | Self::InvalidPayload { kind, .. }
            | Self::Encode { kind, .. } => Some(kind),
        }
    }
}
