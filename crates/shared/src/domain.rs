use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{value::RawValue, Value};

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps a present value, JSON `null` included, as raw text. Only an absent
/// field (via `#[serde(default)]`) becomes `None`.
fn raw_if_present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

macro_rules! string_enum {
    ($name:ident, fallback = $fallback:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::from($fallback.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(raw),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(ElementKind, fallback = "unknown", {
    Button => "button",
    ListItem => "list_item",
    TextInput => "text_input",
    Label => "label",
});

impl ElementKind {
    pub fn is_clickable(&self) -> bool {
        matches!(self, Self::Button | Self::ListItem)
    }
}

string_enum!(FieldKind, fallback = "text", {
    Text => "text",
    Number => "number",
    Select => "select",
});

string_enum!(ActionCommand, fallback = "CLICK", {
    Click => "CLICK",
    TypeText => "TYPE_TEXT",
});

/// One interactive element of the remote application's current view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
}

impl ElementDescription {
    pub fn new(id: impl Into<String>, kind: ElementKind, label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind,
            label: Some(label.into()),
            description: None,
            current_value: None,
        }
    }

    pub fn id_contains(&self, needle: &str) -> bool {
        self.id.as_deref().is_some_and(|id| id.contains(needle))
    }

    /// Only string values are meaningful as a text field's contents.
    pub fn text_value(&self) -> Option<&str> {
        self.current_value.as_ref().and_then(Value::as_str)
    }
}

/// Full declarative snapshot of the renderable view. Replaces the previous one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_view: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<ElementDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldDescription {
    /// Initial control value, stringified the way a form input would hold it.
    pub fn default_text(&self) -> String {
        match &self.default {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Structured input request that takes over the surface until cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_description: Option<String>,
    /// Kept as raw JSON so it goes back to the controller byte-for-byte.
    #[serde(
        default,
        deserialize_with = "raw_if_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_context: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDescription>,
}

impl FormRequest {
    /// `item_context.name`, when the context is an object carrying a string name.
    pub fn context_name(&self) -> Option<String> {
        let raw = self.item_context.as_ref()?;
        let value: Value = serde_json::from_str(raw.get()).ok()?;
        value.get("name")?.as_str().map(str::to_string)
    }
}

/// Remote request to emphasise (and possibly type into) a rendered element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationRequest {
    pub command: ActionCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
