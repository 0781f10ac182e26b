//! Plain-text outline of a [`Surface`], used by terminal front-ends.

use std::fmt::Write;

use crate::surface::{ElementNode, FormControl, FormView, Surface, SurfaceNode};

pub fn render_surface(surface: &Surface) -> String {
    let mut out = String::new();
    if let Some(class) = surface.view_class() {
        let _ = writeln!(out, "<{class}>");
    }
    for node in surface.nodes() {
        match node {
            SurfaceNode::Group(group) => {
                let _ = writeln!(out, "  [{}]", group.class);
                for child in &group.children {
                    render_element(&mut out, child, 4);
                }
            }
            SurfaceNode::Element(element) => render_element(&mut out, element, 2),
            SurfaceNode::Placeholder(text) => {
                let _ = writeln!(out, "  ({text})");
            }
            SurfaceNode::Form(form) => render_form(&mut out, form),
        }
    }
    out
}

fn render_element(out: &mut String, element: &ElementNode, indent: usize) {
    let _ = write!(
        out,
        "{:indent$}{} #{} \"{}\"",
        "",
        element.kind,
        element.id,
        element.label
    );
    if let Some(input) = &element.input {
        let _ = write!(out, " = \"{}\"", input.value);
        if input.focused {
            out.push_str(" (focused)");
        }
    }
    for emphasis in &element.emphasis {
        let _ = write!(out, " *{}*", emphasis.class_name());
    }
    out.push('\n');
    if let Some(description) = &element.description {
        let _ = writeln!(out, "{:width$}{description}", "", width = indent + 2);
    }
}

fn render_form(out: &mut String, form: &FormView) {
    let _ = writeln!(out, "== {} ==", form.title);
    if let Some(line) = &form.context_line {
        let _ = writeln!(out, "{line}");
    }
    for field in &form.fields {
        let _ = write!(out, "  {} [{}]", field.label, field.field_id);
        match &field.control {
            Some(FormControl::Text { value, .. }) => {
                let _ = write!(out, ": \"{value}\"");
            }
            Some(FormControl::Number { value, min, max }) => {
                let _ = write!(out, ": {value}");
                if min.is_some() || max.is_some() {
                    let bound = |b: &Option<f64>| b.map(|v| v.to_string()).unwrap_or_default();
                    let _ = write!(out, " ({}..{})", bound(min), bound(max));
                }
            }
            Some(FormControl::Select { options, selected }) => {
                let rendered: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(index, option)| {
                        if Some(index) == *selected {
                            format!("<{option}>")
                        } else {
                            option.clone()
                        }
                    })
                    .collect();
                let _ = write!(out, ": {}", rendered.join(" | "));
            }
            None => {}
        }
        out.push('\n');
    }
    let _ = writeln!(out, "  [{}]", FormView::SUBMIT_LABEL);
}
