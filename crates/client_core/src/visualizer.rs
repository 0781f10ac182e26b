//! Transient emphasis for remote-issued actions.

use std::{collections::HashMap, time::Duration};

use shared::domain::{ActionCommand, VisualizationRequest};
use tracing::debug;

use crate::{
    action_log::ActionLog,
    surface::{Emphasis, NodeKey, Surface},
};

pub const DEFAULT_EFFECT_DURATION: Duration = Duration::from_millis(700);

/// How expiries of overlapping activations on the same node interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectPolicy {
    /// Every expiry clears its emphasis, so an earlier activation can cut a
    /// later one short.
    #[default]
    Independent,
    /// Only the most recent activation's expiry clears the emphasis.
    LatestWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectToken {
    pub node: NodeKey,
    pub emphasis: Emphasis,
    pub generation: u64,
}

pub trait EffectScheduler {
    /// Arrange for `token` to be handed back to the engine after `after`.
    fn schedule(&mut self, token: EffectToken, after: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationOutcome {
    TargetMissing,
    Applied { value_written: bool },
}

#[derive(Debug)]
pub struct ActionVisualizer {
    policy: EffectPolicy,
    duration: Duration,
    generations: HashMap<(NodeKey, Emphasis), u64>,
}

impl ActionVisualizer {
    pub fn new(policy: EffectPolicy, duration: Duration) -> Self {
        Self {
            policy,
            duration,
            generations: HashMap::new(),
        }
    }

    pub fn policy(&self) -> EffectPolicy {
        self.policy
    }

    pub fn visualize(
        &mut self,
        surface: &mut Surface,
        request: &VisualizationRequest,
        scheduler: &mut dyn EffectScheduler,
        log: &mut ActionLog,
    ) -> VisualizationOutcome {
        let element_id = request.element_id.as_deref().unwrap_or_default();
        let Some(node) = surface.element_mut(element_id) else {
            log.warn(format!(
                "Element '{element_id}' not found for visualization of {}",
                request.command
            ));
            return VisualizationOutcome::TargetMissing;
        };

        let mut value_written = false;
        if request.command == ActionCommand::TypeText {
            match node.input.as_mut() {
                Some(input) => {
                    input.value = request.text.clone().unwrap_or_default();
                    value_written = true;
                    debug!(element_id, value = %input.value, "visualizer: wrote typed text");
                }
                None => log.warn(format!(
                    "Element '{element_id}' has no input field for {}",
                    request.command
                )),
            }
        }

        let mut applied = vec![Emphasis::Action];
        if matches!(request.command, ActionCommand::Click | ActionCommand::TypeText) {
            applied.push(Emphasis::Flash);
        }

        let key = node.key;
        for emphasis in applied {
            node.emphasis.insert(emphasis);
            let generation = self.generations.entry((key, emphasis)).or_insert(0);
            *generation += 1;
            scheduler.schedule(
                EffectToken {
                    node: key,
                    emphasis,
                    generation: *generation,
                },
                self.duration,
            );
        }

        VisualizationOutcome::Applied { value_written }
    }

    /// Handles a timer firing. Returns whether the emphasis was removed.
    pub fn expire(&mut self, surface: &mut Surface, token: EffectToken) -> bool {
        let slot = (token.node, token.emphasis);
        let latest = self.generations.get(&slot).copied().unwrap_or_default();
        if self.policy == EffectPolicy::LatestWins && token.generation != latest {
            return false;
        }
        if token.generation == latest {
            self.generations.remove(&slot);
        }

        match surface.element_by_key_mut(token.node) {
            Some(node) => node.emphasis.remove(&token.emphasis),
            None => {
                self.generations.remove(&slot);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::LayoutTable, overlay::OverlayController};
    use shared::domain::{Capabilities, ElementDescription, ElementKind};

    #[derive(Default)]
    struct Recorded(Vec<(EffectToken, Duration)>);

    impl EffectScheduler for Recorded {
        fn schedule(&mut self, token: EffectToken, after: Duration) {
            self.0.push((token, after));
        }
    }

    fn rendered() -> OverlayController {
        let mut controller = OverlayController::new();
        controller.render_capabilities(
            &Capabilities {
                current_view: Some("waimai_page".into()),
                elements: vec![
                    ElementDescription::new("search_input", ElementKind::TextInput, "Search"),
                    ElementDescription::new("note", ElementKind::Label, "Note"),
                ],
            },
            &LayoutTable::default(),
        );
        controller
    }

    fn request(command: &str, element_id: &str, text: Option<&str>) -> VisualizationRequest {
        VisualizationRequest {
            command: ActionCommand::from(command.to_string()),
            element_id: Some(element_id.to_string()),
            text: text.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn overlapping_activations_clear_early_when_independent() {
        let mut controller = rendered();
        let mut visualizer = ActionVisualizer::new(EffectPolicy::Independent, DEFAULT_EFFECT_DURATION);
        let mut scheduler = Recorded::default();
        let mut log = ActionLog::new();
        let req = request("HOVER", "note", None);

        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);
        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);
        assert_eq!(scheduler.0.len(), 2);

        let first = scheduler.0[0].0;
        assert!(visualizer.expire(controller.surface_mut(), first));
        let node = controller.surface().element("note").expect("node");
        assert!(node.emphasis.is_empty());
    }

    #[test]
    fn latest_activation_owns_the_clear_when_coalescing() {
        let mut controller = rendered();
        let mut visualizer = ActionVisualizer::new(EffectPolicy::LatestWins, DEFAULT_EFFECT_DURATION);
        let mut scheduler = Recorded::default();
        let mut log = ActionLog::new();
        let req = request("HOVER", "note", None);

        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);
        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);

        let (first, second) = (scheduler.0[0].0, scheduler.0[1].0);
        assert!(!visualizer.expire(controller.surface_mut(), first));
        assert!(controller
            .surface()
            .element("note")
            .is_some_and(|node| node.emphasis.contains(&Emphasis::Action)));
        assert!(visualizer.expire(controller.surface_mut(), second));
    }

    #[test]
    fn type_text_without_field_still_emphasises() {
        let mut controller = rendered();
        let mut visualizer = ActionVisualizer::new(EffectPolicy::Independent, DEFAULT_EFFECT_DURATION);
        let mut scheduler = Recorded::default();
        let mut log = ActionLog::new();

        let outcome = visualizer.visualize(
            controller.surface_mut(),
            &request("TYPE_TEXT", "note", Some("pizza")),
            &mut scheduler,
            &mut log,
        );

        assert_eq!(outcome, VisualizationOutcome::Applied { value_written: false });
        assert_eq!(log.len(), 1);
        let node = controller.surface().element("note").expect("node");
        assert!(node.emphasis.contains(&Emphasis::Flash));
    }

    #[test]
    fn expiry_after_rerender_does_not_touch_new_nodes() {
        let mut controller = rendered();
        let mut visualizer = ActionVisualizer::new(EffectPolicy::Independent, DEFAULT_EFFECT_DURATION);
        let mut scheduler = Recorded::default();
        let mut log = ActionLog::new();
        let req = request("CLICK", "note", None);
        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);
        let stale = scheduler.0[0].0;

        controller.render_capabilities(
            &Capabilities {
                current_view: None,
                elements: vec![ElementDescription::new("note", ElementKind::Label, "Note")],
            },
            &LayoutTable::default(),
        );
        visualizer.visualize(controller.surface_mut(), &req, &mut scheduler, &mut log);

        assert!(!visualizer.expire(controller.surface_mut(), stale));
        let node = controller.surface().element("note").expect("node");
        assert_ne!(node.key, stale.node);
        assert!(node.emphasis.contains(&Emphasis::Action));
    }

    #[test]
    fn missing_target_is_a_logged_warning() {
        let mut controller = rendered();
        let mut visualizer = ActionVisualizer::new(EffectPolicy::Independent, DEFAULT_EFFECT_DURATION);
        let mut scheduler = Recorded::default();
        let mut log = ActionLog::new();

        let outcome = visualizer.visualize(
            controller.surface_mut(),
            &request("CLICK", "ghost", None),
            &mut scheduler,
            &mut log,
        );

        assert_eq!(outcome, VisualizationOutcome::TargetMissing);
        assert!(scheduler.0.is_empty());
        assert_eq!(log.count(crate::action_log::LogLevel::Warn), 1);
    }
}
