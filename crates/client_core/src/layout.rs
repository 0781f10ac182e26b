//! Per-view grouping of capability elements.
//!
//! Each known view maps to a pure strategy. Routing inside a strategy matches
//! on element type and id substrings, a convention the controller follows when
//! naming elements rather than a general rule engine. Views without a strategy
//! fall back to a flat rendering in declaration order.

use std::collections::HashMap;

use shared::domain::{ElementDescription, ElementKind};

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutSlot<'a> {
    Group {
        class: String,
        members: Vec<&'a ElementDescription>,
    },
    Loose(&'a ElementDescription),
}

pub type LayoutStrategy = for<'a> fn(&'a [ElementDescription]) -> Vec<LayoutSlot<'a>>;

pub struct LayoutTable {
    strategies: HashMap<String, LayoutStrategy>,
    fallback: LayoutStrategy,
}

impl Default for LayoutTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register("homepage", navigation);
        table.register("waimai_page", search_list);
        table.register("cart_page", cart);
        table.register("checkout_page", checkout);
        table
    }
}

impl LayoutTable {
    /// A table that renders every view flat.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: flat,
        }
    }

    pub fn register(&mut self, view: impl Into<String>, strategy: LayoutStrategy) {
        self.strategies.insert(view.into(), strategy);
    }

    pub fn strategy_for(&self, view: Option<&str>) -> LayoutStrategy {
        view.and_then(|view| self.strategies.get(view))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn arrange<'a>(
        &self,
        view: Option<&str>,
        elements: &'a [ElementDescription],
    ) -> Vec<LayoutSlot<'a>> {
        (self.strategy_for(view))(elements)
    }
}

/// Buckets elements by `route` into the named groups, dropping empty groups.
fn grouped<'a>(
    elements: &'a [ElementDescription],
    classes: &[&str],
    route: impl Fn(&ElementDescription) -> usize,
) -> Vec<LayoutSlot<'a>> {
    let mut buckets: Vec<Vec<&'a ElementDescription>> = vec![Vec::new(); classes.len()];
    for element in elements {
        let index = route(element).min(classes.len().saturating_sub(1));
        if let Some(bucket) = buckets.get_mut(index) {
            bucket.push(element);
        }
    }
    classes
        .iter()
        .zip(buckets)
        .filter(|(_, members)| !members.is_empty())
        .map(|(class, members)| LayoutSlot::Group {
            class: class.to_string(),
            members,
        })
        .collect()
}

pub fn flat(elements: &[ElementDescription]) -> Vec<LayoutSlot<'_>> {
    elements.iter().map(LayoutSlot::Loose).collect()
}

pub fn navigation(elements: &[ElementDescription]) -> Vec<LayoutSlot<'_>> {
    grouped(elements, &["nav-buttons"], |_| 0)
}

pub fn search_list(elements: &[ElementDescription]) -> Vec<LayoutSlot<'_>> {
    grouped(
        elements,
        &["search-area", "food-list", "other-controls"],
        |element| {
            if element.id_contains("search_food") || element.id_contains("search_button") {
                0
            } else if element.kind == ElementKind::ListItem || element.id_contains("food_list") {
                1
            } else {
                2
            }
        },
    )
}

pub fn cart(elements: &[ElementDescription]) -> Vec<LayoutSlot<'_>> {
    grouped(elements, &["cart-items", "cart-actions"], |element| {
        usize::from(element.kind != ElementKind::Label)
    })
}

pub fn checkout(elements: &[ElementDescription]) -> Vec<LayoutSlot<'_>> {
    grouped(
        elements,
        &["form-area checkout-form", "action-buttons"],
        |element| usize::from(element.kind != ElementKind::TextInput),
    )
}
