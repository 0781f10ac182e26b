//! Element description -> render node, plus the interaction bindings that turn
//! operator input on that node into outbound events.

use std::collections::BTreeSet;

use shared::{
    domain::{ElementDescription, ElementKind},
    protocol::{OutboundMessage, UserAction, UserInputChange},
};
use uuid::Uuid;

use crate::surface::{Binding, ElementNode, InputField, NodeKey};

pub const CLICK_COMMAND: &str = "CLICK";

pub fn generated_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("gen_id_{}", &simple[..9])
}

pub fn build_element(description: &ElementDescription, key: NodeKey) -> ElementNode {
    let id = description
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generated_id);
    let label = description
        .label
        .clone()
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| id.clone());

    let input = (description.kind == ElementKind::TextInput).then(|| InputField {
        placeholder: description
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| "Enter text...".to_string()),
        value: description.text_value().unwrap_or_default().to_string(),
        focused: false,
    });

    let binding = if description.kind.is_clickable() {
        Binding::Click {
            description: format!("User clicked on '{label}'"),
        }
    } else if input.is_some() {
        Binding::TextCommit
    } else {
        Binding::None
    };

    ElementNode {
        key,
        id,
        kind: description.kind.clone(),
        label,
        description: description.description.clone().filter(|text| !text.is_empty()),
        input,
        binding,
        emphasis: BTreeSet::new(),
    }
}

impl ElementNode {
    /// Handles a click on this node. The event stops here; no ancestor sees it.
    pub fn click(&self) -> Option<OutboundMessage> {
        let Binding::Click { description } = &self.binding else {
            return None;
        };
        Some(OutboundMessage::UserAction(UserAction {
            command: CLICK_COMMAND.to_string(),
            element_id: self.id.clone(),
            description: description.clone(),
        }))
    }

    fn commit_message(&self) -> Option<OutboundMessage> {
        let input = self.input.as_ref()?;
        Some(OutboundMessage::UserInputChange(UserInputChange {
            element_id: self.id.clone(),
            value: input.value.clone(),
            element_type: self.kind.as_str().to_string(),
        }))
    }

    pub fn focus(&mut self) -> bool {
        match self.input.as_mut() {
            Some(input) => {
                input.focused = true;
                true
            }
            None => false,
        }
    }

    /// Typing into the field. Does not commit.
    pub fn edit(&mut self, value: impl Into<String>) -> bool {
        match self.input.as_mut() {
            Some(input) => {
                input.value = value.into();
                input.focused = true;
                true
            }
            None => false,
        }
    }

    /// Focus loss commits the value, but only if the field still had focus.
    pub fn blur(&mut self) -> Option<OutboundMessage> {
        let input = self.input.as_mut()?;
        if !input.focused {
            return None;
        }
        input.focused = false;
        self.commit_message()
    }

    /// Confirm keypress: commits and drops focus so the trailing blur is a no-op.
    pub fn confirm(&mut self) -> Option<OutboundMessage> {
        let input = self.input.as_mut()?;
        input.focused = false;
        self.commit_message()
    }
}
