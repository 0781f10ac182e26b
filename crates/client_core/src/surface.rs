//! Headless render tree: what the operator currently sees.

use std::collections::BTreeSet;

use shared::domain::ElementKind;

/// Identity of one rendered node instance. Never reused, so a re-render
/// detaches old nodes even when the element ids repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emphasis {
    Action,
    Flash,
}

impl Emphasis {
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Action => "highlight-action",
            Self::Flash => "highlight-flash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    None,
    Click { description: String },
    TextCommit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub placeholder: String,
    pub value: String,
    pub focused: bool,
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub key: NodeKey,
    pub id: String,
    pub kind: ElementKind,
    pub label: String,
    pub description: Option<String>,
    pub input: Option<InputField>,
    pub binding: Binding,
    pub emphasis: BTreeSet<Emphasis>,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub class: String,
    pub children: Vec<ElementNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormControl {
    Text {
        value: String,
        placeholder: String,
    },
    Number {
        value: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    Select {
        options: Vec<String>,
        selected: Option<usize>,
    },
}

impl FormControl {
    /// Value contributed to a submission. A select with nothing selected contributes none.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Text { value, .. } | Self::Number { value, .. } => Some(value),
            Self::Select { options, selected } => {
                selected.and_then(|index| options.get(index)).map(String::as_str)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormFieldView {
    pub field_id: String,
    pub label: String,
    pub control: Option<FormControl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub key: NodeKey,
    pub title: String,
    pub context_line: Option<String>,
    pub fields: Vec<FormFieldView>,
}

impl FormView {
    pub const SUBMIT_LABEL: &'static str = "Submit Form";

    pub fn field(&self, field_id: &str) -> Option<&FormFieldView> {
        self.fields.iter().find(|field| field.field_id == field_id)
    }

    pub(crate) fn field_mut(&mut self, field_id: &str) -> Option<&mut FormFieldView> {
        self.fields.iter_mut().find(|field| field.field_id == field_id)
    }
}

#[derive(Debug, Clone)]
pub enum SurfaceNode {
    Group(Group),
    Element(ElementNode),
    Placeholder(String),
    Form(FormView),
}

#[derive(Debug, Default)]
pub struct Surface {
    nodes: Vec<SurfaceNode>,
    view_class: Option<String>,
    next_key: u64,
    revision: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bumped on every mutation; lets front-ends skip redundant redraws.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn view_class(&self) -> Option<&str> {
        self.view_class.as_deref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.nodes.iter().find_map(|node| match node {
            SurfaceNode::Placeholder(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn form(&self) -> Option<&FormView> {
        self.nodes.iter().find_map(|node| match node {
            SurfaceNode::Form(form) => Some(form),
            _ => None,
        })
    }

    pub(crate) fn form_mut(&mut self) -> Option<&mut FormView> {
        self.revision += 1;
        self.nodes.iter_mut().find_map(|node| match node {
            SurfaceNode::Form(form) => Some(form),
            _ => None,
        })
    }

    /// Capability elements in document order, including grouped ones.
    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.nodes.iter().flat_map(|node| {
            let (single, grouped) = match node {
                SurfaceNode::Element(element) => (Some(element), None),
                SurfaceNode::Group(group) => (None, Some(group.children.iter())),
                SurfaceNode::Placeholder(_) | SurfaceNode::Form(_) => (None, None),
            };
            single.into_iter().chain(grouped.into_iter().flatten())
        })
    }

    fn elements_mut(&mut self) -> impl Iterator<Item = &mut ElementNode> {
        self.nodes.iter_mut().flat_map(|node| {
            let (single, grouped) = match node {
                SurfaceNode::Element(element) => (Some(element), None),
                SurfaceNode::Group(group) => (None, Some(group.children.iter_mut())),
                SurfaceNode::Placeholder(_) | SurfaceNode::Form(_) => (None, None),
            };
            single.into_iter().chain(grouped.into_iter().flatten())
        })
    }

    /// First element with this id in document order.
    pub fn element(&self, id: &str) -> Option<&ElementNode> {
        self.elements().find(|element| element.id == id)
    }

    pub(crate) fn element_mut(&mut self, id: &str) -> Option<&mut ElementNode> {
        self.revision += 1;
        self.elements_mut().find(|element| element.id == id)
    }

    pub(crate) fn element_by_key_mut(&mut self, key: NodeKey) -> Option<&mut ElementNode> {
        self.revision += 1;
        self.elements_mut().find(|element| element.key == key)
    }

    pub(crate) fn allocate_key(&mut self) -> NodeKey {
        self.next_key += 1;
        NodeKey(self.next_key)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.revision += 1;
    }

    pub(crate) fn set_view_class(&mut self, view: Option<&str>) {
        self.view_class = view.map(|view| format!("view-{view}"));
        self.revision += 1;
    }

    pub(crate) fn push(&mut self, node: SurfaceNode) {
        self.nodes.push(node);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(surface: &mut Surface, id: &str) -> ElementNode {
        ElementNode {
            key: surface.allocate_key(),
            id: id.to_string(),
            kind: ElementKind::Button,
            label: id.to_string(),
            description: None,
            input: None,
            binding: Binding::None,
            emphasis: BTreeSet::new(),
        }
    }

    #[test]
    fn element_lookup_walks_groups_in_document_order() {
        let mut surface = Surface::new();
        let first = element(&mut surface, "a");
        let grouped = element(&mut surface, "b");
        let duplicate = element(&mut surface, "a");
        let duplicate_key = duplicate.key;
        surface.push(SurfaceNode::Element(first.clone()));
        surface.push(SurfaceNode::Group(Group {
            class: "nav-buttons".into(),
            children: vec![grouped, duplicate],
        }));

        let ids: Vec<_> = surface.elements().map(|el| el.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "a"]);
        assert_eq!(surface.element("a").map(|el| el.key), Some(first.key));
        assert!(surface.element_by_key_mut(duplicate_key).is_some());
    }

    #[test]
    fn keys_are_never_reused_after_clear() {
        let mut surface = Surface::new();
        let before = surface.allocate_key();
        surface.clear();
        assert_ne!(surface.allocate_key(), before);
    }

    #[test]
    fn select_without_selection_contributes_nothing() {
        let control = FormControl::Select {
            options: Vec::new(),
            selected: None,
        };
        assert_eq!(control.value(), None);
    }
}
