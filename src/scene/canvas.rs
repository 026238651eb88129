//! The node tree with its two panels, and the structural edits on it.
//!
//! Every edit keeps each node attached to exactly one parent. Moves are
//! validated before anything is detached, so a refused move leaves the
//! tree untouched.

use crate::animation::{FadeSpeeds, SizeAnimation};
use crate::config::{LayoutConfig, SceneConfig};
use crate::container::Container;
use crate::geometry::{Rect, Size};
use crate::node::{deep_copy, set_role, unfold, Node, NodeKind, Role};
use crate::render::BarWidths;
use crate::scrollbar::ScrollbarSide;
use crate::tree::{NodeId, Tree};

/// Width the right panel asks for.
const TEMPLATES_PANEL_WIDTH: f32 = 400.0;

pub struct Canvas {
    pub(crate) tree: Tree<Node>,
    root: NodeId,
    document: NodeId,
    templates: NodeId,
    /// Where thrown nodes land; the most recent node the user placed.
    pub(crate) last_added: Option<NodeId>,
    window: Size,
    splitter: f32,
    pub(crate) fades: FadeSpeeds,
    pub(crate) layout: LayoutConfig,
    move_speed: f32,
    resize_speed: f32,
}

impl Canvas {
    pub fn new(config: &SceneConfig) -> Self {
        let mut tree = Tree::new();
        let root = tree.insert(Node::new(NodeKind::Root, Role::Canvas, ""));
        let document = tree.insert(Self::panel(config, Role::Document, ScrollbarSide::Right));
        let templates = tree.insert(Self::panel(config, Role::Template, ScrollbarSide::Left));
        tree.append_child(root, document);
        tree.append_child(root, templates);
        log::info!("Created canvas with document and template panels");

        Self {
            tree,
            root,
            document,
            templates,
            last_added: None,
            window: Size::zero(),
            splitter: 0.0,
            fades: config.fades,
            layout: config.layout.clone(),
            move_speed: config.move_speed,
            resize_speed: config.resize_speed,
        }
    }

    /// A panel starts above its final place and slides down on the first frames.
    fn panel(config: &SceneConfig, role: Role, side: ScrollbarSide) -> Node {
        let mut node = Node::container(role, Container::new(side, config.scrollbar.clone()));
        node.animator.movement.set_speed(config.move_speed);
        node.animator
            .movement
            .set_render(0.0, -config.layout.panel_entrance_offset);
        node
    }

    pub fn tree(&self) -> &Tree<Node> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn templates(&self) -> NodeId {
        self.templates
    }

    pub fn last_added(&self) -> Option<NodeId> {
        self.last_added.filter(|id| self.tree.contains(*id))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.tree.get_mut(id)
    }

    /// A node with the configured animation speeds, not yet attached.
    pub fn create_node(&mut self, kind: NodeKind, role: Role, title: &str) -> NodeId {
        let mut node = Node::new(kind, role, title);
        node.animator.movement.set_speed(self.move_speed);
        node.animator.size = SizeAnimation::new(self.resize_speed);
        self.tree.insert(node)
    }

    pub fn window_size(&self) -> Size {
        self.window
    }

    /// X coordinate separating the two panels for wheel routing.
    pub fn splitter(&self) -> f32 {
        self.splitter
    }

    pub fn canvas_height(&self) -> f32 {
        self.window.height
    }

    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window = Size::new(width, height);
        let document_max = self.layout.document_max_width;
        self.splitter = document_max + (width - TEMPLATES_PANEL_WIDTH - document_max) / 2.0;
        let divider = self
            .splitter
            .max(width - TEMPLATES_PANEL_WIDTH - crate::container::CONTAINER_PADDING_HORIZONTAL * 2.0);
        let top = self.layout.panel_top;
        let document_bounds = Rect::new(0.0, top, (divider - 20.0).max(0.0), height);
        let template_bounds = Rect::new(divider, top, (width - divider).max(0.0), height);
        if let Some(c) = self.container_mut(self.document) {
            c.set_bounds(document_bounds);
        }
        if let Some(c) = self.container_mut(self.templates) {
            c.set_bounds(template_bounds);
        }
        log::debug!("Window {width}x{height}, panels divided at {divider}");
    }

    pub fn container(&self, id: NodeId) -> Option<&Container> {
        self.tree.get(id).and_then(Node::container_state)
    }

    pub fn container_mut(&mut self, id: NodeId) -> Option<&mut Container> {
        self.tree.get_mut(id).and_then(|n| n.container.as_mut())
    }

    /// Panel hosting `id`, the node itself included.
    pub fn container_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.tree.ancestors(id))
            .find(|n| self.container(*n).is_some())
    }

    pub fn bar_widths(&self) -> BarWidths {
        match (self.container(self.document), self.container(self.templates)) {
            (Some(document), Some(templates)) => {
                BarWidths::compute(&self.layout, document, templates)
            }
            _ => BarWidths::default(),
        }
    }

    /// Whether a node of `kind` may live directly under `parent`. The
    /// document panel only holds features; the template panel holds anything.
    pub fn accepts(&self, parent: NodeId, kind: NodeKind) -> bool {
        if parent == self.document {
            return kind == NodeKind::Feature;
        }
        if parent == self.root {
            return false;
        }
        self.tree
            .get(parent)
            .is_some_and(|p| p.kind.accepts(kind))
    }

    pub fn find_background(&self, feature: NodeId) -> Option<NodeId> {
        self.tree
            .children(feature)
            .iter()
            .copied()
            .find(|c| self.tree.get(*c).map(|n| n.kind) == Some(NodeKind::Background))
    }

    /// Attach `child` under `parent`, appending when `index` is `None`.
    /// The subtree takes the parent's role.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> bool {
        let Some(kind) = self.tree.get(child).map(|n| n.kind) else {
            return false;
        };
        if !self.accepts(parent, kind) || self.tree.is_ancestor(child, parent) {
            log::debug!("Refused to attach {kind:?} under {parent:?}");
            return false;
        }
        let attached = match index {
            Some(index) => self.tree.insert_child(parent, child, index),
            None => self.tree.append_child(parent, child),
        };
        if !attached {
            return false;
        }
        let role = self.tree.get(parent).map_or(Role::Document, |p| p.role);
        set_role(&mut self.tree, child, role);
        if parent == self.templates {
            let fades = self.fades;
            if let Some(node) = self.tree.get_mut(child) {
                node.animator.color.set_alpha(0.0, 0.0);
                node.animator.color.set_alpha(fades.bar_alpha, fades.entrance);
            }
        }
        self.bubble_static(parent);
        true
    }

    /// Detach a node from its parent. A node leaving the template panel
    /// leaves a copy of itself behind at the same place and becomes an
    /// unfolded document node.
    pub fn take_from_parent(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.tree.parent(id)?;
        let index = self.tree.index_of(id)?;
        if parent == self.templates {
            let fades = self.fades;
            deep_copy(&mut self.tree, id, parent, index, &fades);
            self.tree.detach(id);
            set_role(&mut self.tree, id, Role::Document);
            unfold(&mut self.tree, id, false, &fades);
            log::debug!("Took {id:?} out of the templates, leaving a copy");
        } else {
            self.tree.detach(id);
        }
        Some((parent, index))
    }

    /// Move `id` to `index` under `group`. No-op when there is no index or
    /// the node is already there.
    pub fn update_element_index(&mut self, group: NodeId, id: NodeId, index: Option<usize>) -> bool {
        let Some(index) = index else {
            return false;
        };
        if self.tree.parent(id) == Some(group) && self.tree.index_of(id) == Some(index) {
            return false;
        }
        let Some(kind) = self.tree.get(id).map(|n| n.kind) else {
            return false;
        };
        if !self.accepts(group, kind) || id == group || self.tree.is_ancestor(id, group) {
            return false;
        }
        self.take_from_parent(id);
        log::debug!("Moving {id:?} to index {index} of {group:?}");
        self.add_child(group, id, Some(index))
    }

    /// Keep a feature's background as its first child.
    pub fn bubble_static(&mut self, group: NodeId) {
        if self.tree.get(group).map(|n| n.kind) != Some(NodeKind::Feature) {
            return;
        }
        if let Some(background) = self.find_background(group) {
            if self.tree.index_of(background).is_some_and(|i| i > 0) {
                self.tree.move_child(background, 0);
            }
        }
    }

    /// Where a thrown node of `kind` would land, judged from the last
    /// added node. `None` when the throw has no valid target.
    fn throw_target(&self, kind: NodeKind) -> Option<(NodeId, Option<usize>)> {
        if kind == NodeKind::Feature {
            return Some((self.document, None));
        }
        let last = self.last_added()?;
        let last_kind = self.tree.get(last)?.kind;
        match kind {
            NodeKind::Scenario | NodeKind::Background => {
                let target = match last_kind {
                    NodeKind::Feature => last,
                    NodeKind::Scenario | NodeKind::Background => self.tree.parent(last)?,
                    _ => self.tree.parent(self.tree.parent(last)?)?,
                };
                if kind == NodeKind::Background && self.find_background(target).is_some() {
                    return None;
                }
                Some((target, None))
            }
            NodeKind::Step | NodeKind::Comment => match last_kind {
                NodeKind::Feature | NodeKind::Root => None,
                NodeKind::Scenario | NodeKind::Background => Some((last, None)),
                NodeKind::Step | NodeKind::Comment => {
                    let parent = self.tree.parent(last)?;
                    Some((parent, self.tree.index_of(last).map(|i| i + 1)))
                }
            },
            NodeKind::Feature | NodeKind::Root => None,
        }
    }

    /// Move a node next to the last added one. A thrown step with a feature
    /// as last added node goes nowhere, and a feature refuses a second
    /// background.
    pub fn throw_to_document(&mut self, id: NodeId) -> bool {
        let Some(kind) = self.tree.get(id).map(|n| n.kind) else {
            return false;
        };
        let Some((target, index)) = self.throw_target(kind) else {
            log::debug!("Nowhere to throw {kind:?}");
            return false;
        };
        if !self.accepts(target, kind) || id == target || self.tree.is_ancestor(id, target) {
            return false;
        }
        self.take_from_parent(id);
        if !self.add_child(target, id, index) {
            return false;
        }
        let fades = self.fades;
        unfold(&mut self.tree, target, true, &fades);
        log::debug!("Threw {kind:?} into {target:?}");
        self.update_last_added(id);
        true
    }

    /// Remember `id` as the anchor for the next throw. Template nodes never
    /// become the anchor.
    pub fn update_last_added(&mut self, id: NodeId) -> bool {
        match self.tree.get(id) {
            Some(node) if node.role != Role::Template && node.kind != NodeKind::Root => {
                self.last_added = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Delete a document node and its subtree.
    pub fn trash(&mut self, id: NodeId) -> bool {
        match self.tree.get(id) {
            Some(node) if node.role == Role::Document && node.kind != NodeKind::Root => {}
            _ => return false,
        }
        let removed = self.tree.remove(id);
        log::debug!("Trashed {removed} node(s)");
        self.forget_removed();
        true
    }

    /// Detach and destroy a node. Template nodes are replaced by a copy.
    pub fn remove_child(&mut self, id: NodeId) -> bool {
        if !matches!(self.tree.get(id), Some(n) if n.kind != NodeKind::Root) {
            return false;
        }
        self.take_from_parent(id);
        self.tree.remove(id);
        self.forget_removed();
        true
    }

    fn forget_removed(&mut self) {
        if self.last_added.is_some_and(|id| !self.tree.contains(id)) {
            self.last_added = None;
        }
    }

    /// Remove every child of a panel.
    pub fn clear_panel(&mut self, panel: NodeId) {
        for child in self.tree.children(panel).to_vec() {
            self.tree.remove(child);
        }
        self.forget_removed();
        if let Some(container) = self.container_mut(panel) {
            container.scroll_to_top();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(&SceneConfig::default());
        canvas.set_window_size(1400.0, 800.0);
        canvas
    }

    fn add(canvas: &mut Canvas, parent: NodeId, kind: NodeKind, title: &str) -> NodeId {
        let role = canvas.node(parent).map_or(Role::Document, |n| n.role);
        let id = canvas.create_node(kind, role, title);
        assert!(canvas.add_child(parent, id, None));
        id
    }

    fn assert_single_ownership(canvas: &Canvas) {
        let tree = canvas.tree();
        for id in tree.descendants(canvas.root()).into_iter().skip(1) {
            let parent = tree.parent(id).expect("attached");
            let count = tree.children(parent).iter().filter(|c| **c == id).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_window_layout() {
        let canvas = canvas();
        assert_eq!(canvas.splitter(), 600.0 + (1400.0 - 400.0 - 600.0) / 2.0);
        let document = canvas.container(canvas.document()).map(Container::viewport);
        let templates = canvas.container(canvas.templates()).map(Container::viewport);
        assert_eq!(document, Some(Rect::new(0.0, 10.0, 940.0, 800.0)));
        assert_eq!(templates, Some(Rect::new(960.0, 10.0, 440.0, 800.0)));
    }

    #[test]
    fn test_document_only_takes_features() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let step = canvas.create_node(NodeKind::Step, Role::Document, "Given x");
        assert!(!canvas.add_child(doc, step, None));
        assert_eq!(canvas.tree().parent(step), None);
        add(&mut canvas, doc, NodeKind::Feature, "f");
    }

    #[test]
    fn test_background_bubbles_to_top() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        add(&mut canvas, feature, NodeKind::Scenario, "s1");
        add(&mut canvas, feature, NodeKind::Scenario, "s2");
        let background = add(&mut canvas, feature, NodeKind::Background, "");
        assert_eq!(canvas.tree().children(feature)[0], background);
    }

    #[test]
    fn test_leaving_templates_leaves_copy() {
        let mut canvas = canvas();
        let templates = canvas.templates();
        let doc = canvas.document();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        let scenario = add(&mut canvas, feature, NodeKind::Scenario, "s");
        let template = add(&mut canvas, templates, NodeKind::Step, "Given x");

        assert!(canvas.update_element_index(scenario, template, Some(0)));
        assert_eq!(canvas.tree().children(templates).len(), 1);
        assert_ne!(canvas.tree().children(templates)[0], template);
        assert_eq!(canvas.tree().parent(template), Some(scenario));
        assert_eq!(canvas.node(template).map(Node::role), Some(Role::Document));
        assert_single_ownership(&canvas);
    }

    #[test]
    fn test_update_element_index_same_place_is_noop() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        let scenario = add(&mut canvas, feature, NodeKind::Scenario, "s");
        assert!(!canvas.update_element_index(feature, scenario, Some(0)));
        assert!(!canvas.update_element_index(feature, scenario, None));
        assert!(!canvas.update_element_index(scenario, feature, Some(0)));
        assert_eq!(canvas.tree().parent(scenario), Some(feature));
    }

    #[test]
    fn test_throw_step_after_last_added_step() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let templates = canvas.templates();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        let scenario = add(&mut canvas, feature, NodeKind::Scenario, "s");
        let first = add(&mut canvas, scenario, NodeKind::Step, "Given a");
        add(&mut canvas, scenario, NodeKind::Step, "Then c");
        canvas.update_last_added(first);

        let template = add(&mut canvas, templates, NodeKind::Step, "When b");
        assert!(canvas.throw_to_document(template));
        assert_eq!(canvas.tree().children(scenario)[1], template);
        assert_eq!(canvas.last_added(), Some(template));
        assert_single_ownership(&canvas);
    }

    #[test]
    fn test_throw_step_at_feature_goes_nowhere() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let templates = canvas.templates();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        canvas.update_last_added(feature);
        let template = add(&mut canvas, templates, NodeKind::Step, "When b");

        assert!(!canvas.throw_to_document(template));
        assert_eq!(canvas.tree().parent(template), Some(templates));
        assert_eq!(canvas.tree().children(templates).len(), 1);
    }

    #[test]
    fn test_throw_second_background_is_refused() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let templates = canvas.templates();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        add(&mut canvas, feature, NodeKind::Background, "");
        canvas.update_last_added(feature);
        let template = add(&mut canvas, templates, NodeKind::Background, "");

        assert!(!canvas.throw_to_document(template));
        assert_eq!(canvas.tree().parent(template), Some(templates));
    }

    #[test]
    fn test_template_never_becomes_last_added() {
        let mut canvas = canvas();
        let templates = canvas.templates();
        let template = add(&mut canvas, templates, NodeKind::Step, "x");
        assert!(!canvas.update_last_added(template));
        assert_eq!(canvas.last_added(), None);
    }

    #[test]
    fn test_trash_and_remove_child() {
        let mut canvas = canvas();
        let doc = canvas.document();
        let templates = canvas.templates();
        let feature = add(&mut canvas, doc, NodeKind::Feature, "f");
        let scenario = add(&mut canvas, feature, NodeKind::Scenario, "s");
        canvas.update_last_added(scenario);
        let template = add(&mut canvas, templates, NodeKind::Scenario, "t");

        assert!(!canvas.trash(template));
        assert!(canvas.trash(scenario));
        assert!(!canvas.tree().contains(scenario));
        assert_eq!(canvas.last_added(), None);

        assert!(canvas.remove_child(template));
        assert!(!canvas.tree().contains(template));
        assert_eq!(canvas.tree().children(templates).len(), 1);
        assert!(!canvas.remove_child(doc));
    }
}
