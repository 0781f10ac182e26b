//! Overlay state machine. Sole owner of the surface: the operator sees either the
//! capability-rendered tree or the captured input form.

use std::collections::BTreeMap;

use serde_json::{value::RawValue, Value};
use shared::{
    domain::{Capabilities, FieldDescription, FieldKind, FormRequest},
    protocol::{FilledFormData, OutboundMessage},
};
use tracing::{debug, info};

use crate::{
    builder::build_element,
    error::InteractionError,
    layout::{LayoutSlot, LayoutTable},
    surface::{FormControl, FormFieldView, FormView, Group, NodeKey, Surface, SurfaceNode},
};

pub const EMPTY_VIEW_PLACEHOLDER: &str = "No interactive elements in this view.";
pub const DEFAULT_FORM_TITLE: &str = "Please complete the form";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Normal,
    FormActive,
}

#[derive(Debug)]
enum Overlay {
    Normal,
    FormActive { item_context: Option<Box<RawValue>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { elements: usize },
    Placeholder,
    /// The form was up. `cleared` reports whether the visible
    /// tree was wiped anyway (non-empty payload).
    Deferred { cleared: bool },
}

#[derive(Debug)]
pub struct OverlayController {
    overlay: Overlay,
    surface: Surface,
}

impl Default for OverlayController {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayController {
    pub fn new() -> Self {
        Self {
            overlay: Overlay::Normal,
            surface: Surface::new(),
        }
    }

    pub fn state(&self) -> OverlayState {
        match self.overlay {
            Overlay::Normal => OverlayState::Normal,
            Overlay::FormActive { .. } => OverlayState::FormActive,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Any state -> FORM_ACTIVE. Replaces whatever is visible with the form.
    pub fn show_form(&mut self, request: FormRequest) {
        self.surface.clear();
        let key = self.surface.allocate_key();
        let form = build_form(&request, key);
        info!(
            fields = form.fields.len(),
            title = %form.title,
            "overlay: displaying form"
        );
        self.surface.push(SurfaceNode::Form(form));
        self.overlay = Overlay::FormActive {
            item_context: request.item_context,
        };
    }

    /// FORM_ACTIVE -> NORMAL. Leaves the surface empty; the next capabilities
    /// snapshot repopulates it. Returns false when no form was active.
    pub fn clear_form(&mut self) -> bool {
        if matches!(self.overlay, Overlay::Normal) {
            return false;
        }
        info!("overlay: clearing displayed form");
        self.surface.clear();
        self.overlay = Overlay::Normal;
        true
    }

    /// Renders a capabilities snapshot.
    ///
    /// While the form is active the render is deferred. A non-empty payload
    /// still wipes the visible tree and renders nothing, leaving the surface
    /// blank until a later message; an empty payload leaves the form alone.
    pub fn render_capabilities(
        &mut self,
        capabilities: &Capabilities,
        layout: &LayoutTable,
    ) -> RenderOutcome {
        let form_active = self.state() == OverlayState::FormActive;
        let view = capabilities.current_view.as_deref();
        let elements = &capabilities.elements;

        if !form_active || !elements.is_empty() {
            self.surface.clear();
            self.surface.set_view_class(view);
        }

        if elements.is_empty() {
            if form_active {
                return RenderOutcome::Deferred { cleared: false };
            }
            self.surface
                .push(SurfaceNode::Placeholder(EMPTY_VIEW_PLACEHOLDER.to_string()));
            return RenderOutcome::Placeholder;
        }

        if form_active {
            debug!("overlay: form displayed, deferring capability render");
            return RenderOutcome::Deferred { cleared: true };
        }

        for slot in layout.arrange(view, elements) {
            let node = match slot {
                LayoutSlot::Loose(description) => {
                    SurfaceNode::Element(build_element(description, self.surface.allocate_key()))
                }
                LayoutSlot::Group { class, members } => SurfaceNode::Group(Group {
                    class,
                    children: members
                        .into_iter()
                        .map(|description| {
                            build_element(description, self.surface.allocate_key())
                        })
                        .collect(),
                }),
            };
            self.surface.push(node);
        }
        RenderOutcome::Rendered {
            elements: elements.len(),
        }
    }

    pub fn edit_form_field(&mut self, field_id: &str, value: &str) -> Result<(), InteractionError> {
        if self.state() != OverlayState::FormActive {
            return Err(InteractionError::NoActiveForm);
        }
        let form = self
            .surface
            .form_mut()
            .ok_or(InteractionError::NoActiveForm)?;
        let field = form
            .field_mut(field_id)
            .ok_or_else(|| InteractionError::UnknownField(field_id.to_string()))?;
        let control = field
            .control
            .as_mut()
            .ok_or_else(|| InteractionError::NoControl(field_id.to_string()))?;

        match control {
            FormControl::Text { value: current, .. } => *current = value.to_string(),
            FormControl::Number { value: current, .. } => *current = sanitize_number(value),
            FormControl::Select { options, selected } => {
                let index = options.iter().position(|option| option == value).ok_or_else(|| {
                    InteractionError::InvalidOption {
                        field: field_id.to_string(),
                        value: value.to_string(),
                    }
                })?;
                *selected = Some(index);
            }
        }
        Ok(())
    }

    /// Packages the form for the controller. The overlay stays up until the
    /// controller explicitly clears it.
    pub fn submit_form(&self) -> Result<OutboundMessage, InteractionError> {
        let Overlay::FormActive { item_context } = &self.overlay else {
            return Err(InteractionError::NoActiveForm);
        };
        let form = self.surface.form().ok_or(InteractionError::NoActiveForm)?;

        let mut form_data = BTreeMap::new();
        for field in &form.fields {
            let Some(control) = &field.control else {
                continue;
            };
            check_range(&field.field_id, control)?;
            if let Some(value) = control.value() {
                form_data.insert(field.field_id.clone(), value.to_string());
            }
        }

        Ok(OutboundMessage::UserFilledFormData(FilledFormData {
            form_data,
            item_context: item_context.clone(),
        }))
    }
}

fn build_form(request: &FormRequest, key: NodeKey) -> FormView {
    FormView {
        key,
        title: request
            .form_description
            .clone()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_FORM_TITLE.to_string()),
        context_line: request
            .context_name()
            .filter(|name| !name.is_empty())
            .map(|name| format!("For item: {name}")),
        fields: request.fields.iter().map(build_field).collect(),
    }
}

fn build_field(field: &FieldDescription) -> FormFieldView {
    let label = field
        .label
        .clone()
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| field.id.clone());

    let control = match &field.kind {
        FieldKind::Text => Some(FormControl::Text {
            value: field.default_text(),
            placeholder: field.label.clone().unwrap_or_default(),
        }),
        FieldKind::Number => Some(FormControl::Number {
            value: sanitize_number(&field.default_text()),
            min: bound(field.min.as_ref()),
            max: bound(field.max.as_ref()),
        }),
        FieldKind::Select => field.options.as_ref().map(|options| {
            let default = field.default_text();
            let selected = options
                .iter()
                .position(|option| *option == default)
                .or_else(|| (!options.is_empty()).then_some(0));
            FormControl::Select {
                options: options.clone(),
                selected,
            }
        }),
        FieldKind::Other(_) => None,
    };

    FormFieldView {
        field_id: field.id.clone(),
        label,
        control,
    }
}

/// Number inputs hold either a finite decimal or nothing.
fn sanitize_number(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => raw.to_string(),
        _ => String::new(),
    }
}

fn bound(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn check_range(field_id: &str, control: &FormControl) -> Result<(), InteractionError> {
    let FormControl::Number { value, min, max } = control else {
        return Ok(());
    };
    let Ok(parsed) = value.parse::<f64>() else {
        return Ok(());
    };
    let out_of_range = |bound: String| InteractionError::OutOfRange {
        field: field_id.to_string(),
        value: value.clone(),
        bound,
    };
    match (*min, *max) {
        (Some(min), _) if parsed < min => Err(out_of_range(format!("min {min}"))),
        (_, Some(max)) if parsed > max => Err(out_of_range(format!("max {max}"))),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "tests/overlay_tests.rs"]
mod tests;
