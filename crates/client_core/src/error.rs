use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel is not open")]
    NotOpen,
    #[error("failed to connect websocket: {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tungstenite::Error,
    },
}

/// Operator interactions that could not be applied to the current surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("element '{0}' not found")]
    UnknownElement(String),
    #[error("element '{0}' has no editable field")]
    NotEditable(String),
    #[error("no form is currently displayed")]
    NoActiveForm,
    #[error("form field '{0}' not found")]
    UnknownField(String),
    #[error("form field '{0}' has no input control")]
    NoControl(String),
    #[error("'{value}' is not an option of form field '{field}'")]
    InvalidOption { field: String, value: String },
    #[error("form field '{field}' value {value} is outside {bound}")]
    OutOfRange {
        field: String,
        value: String,
        bound: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("endpoint '{0}' must use ws:// or wss://")]
    UnsupportedScheme(String),
}
