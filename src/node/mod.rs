//! The scene's node model.
//!
//! A [`Node`] is plain data stored in the [`Tree`](crate::tree::Tree) arena.
//! Operations that need to see relatives (hit tests, fold cascades, drag
//! lifecycle) are free functions over the tree in the submodules.

mod fold;
mod kind;
mod motion;

pub use fold::{
    filter_by_tags, fold, fold_all, fold_fade, hide, remove_filter, show,
    toggle_fold, unfold, unfold_all, TagFilter,
};
pub use hit_test::{
    find_element, find_element_at_real_position, find_group, is_parent_folded,
    is_self_or_parent_folded,
};
pub use kind::NodeKind;
pub use motion::{
    apply_drag_offset, end_drag, is_draggable, start_drag, stick_children, stick_to_parent,
};

use std::path::PathBuf;

use bitflags::bitflags;

use crate::animation::{Animator, FadeSpeeds, MOVE_SPEED, RESIZE_SPEED};
use crate::container::Container;
use crate::geometry::{Color, Point, Rect};
use crate::tree::{NodeId, Tree};

bitflags! {
    /// Independent per-node state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        const FOLDED          = 0b0_0001;
        const VISIBLE         = 0b0_0010;
        const HIGHLIGHTED     = 0b0_0100;
        const DRAGGED         = 0b0_1000;
        /// Take the parent's rendered position as layout origin this frame.
        const STICK_TO_PARENT = 0b1_0000;
    }
}

/// Which part of the canvas a node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Canvas,
    /// The editable document.
    Document,
    /// The read-only palette of template nodes.
    Template,
}

/// Outcome of the latest run for a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    None,
    Running,
    Success,
    Failed,
}

impl PlayState {
    /// Tint drawn over the bar once the node has been run.
    pub fn bar_tint(self) -> Option<Color> {
        match self {
            PlayState::None => None,
            PlayState::Running => Some(Color::rgba(0.1, 0.1, 0.1, 0.5)),
            PlayState::Success => Some(Color::rgba(0.2, 0.9, 0.2, 0.5)),
            PlayState::Failed => Some(Color::rgba(1.0, 0.2, 0.2, 0.8)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) role: Role,
    pub(crate) title: String,
    /// Free text lines below a feature header.
    pub(crate) description: Vec<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) filename: Option<String>,
    pub(crate) flags: NodeFlags,
    pub(crate) play: PlayState,
    pub(crate) error_message: Option<String>,
    pub(crate) screenshots: Vec<PathBuf>,
    pub(crate) render_width: f32,
    pub(crate) render_height: f32,
    pub(crate) padding_height: f32,
    pub(crate) group_height: f32,
    pub(crate) drag_offset: Point,
    pub animator: Animator,
    pub(crate) container: Option<Container>,
}

impl Node {
    pub fn new(kind: NodeKind, role: Role, title: impl Into<String>) -> Self {
        let fades = FadeSpeeds::default();
        Self {
            kind,
            role,
            title: title.into(),
            description: Vec::new(),
            tags: Vec::new(),
            filename: None,
            flags: NodeFlags::VISIBLE,
            play: PlayState::None,
            error_message: None,
            screenshots: Vec::new(),
            render_width: 0.0,
            render_height: 0.0,
            padding_height: 0.0,
            group_height: 0.0,
            drag_offset: Point::default(),
            animator: Animator::new(
                MOVE_SPEED,
                RESIZE_SPEED,
                Color::WHITE.with_alpha(fades.bar_alpha),
            ),
            container: None,
        }
    }

    /// A structural node hosting a scrollable container.
    pub fn container(role: Role, container: Container) -> Self {
        let mut node = Self::new(NodeKind::Root, role, "");
        node.container = Some(container);
        node
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn set_description(&mut self, lines: Vec<String>) {
        self.description = lines;
    }

    /// Text drawn on the bar.
    pub fn display_text(&self) -> String {
        match self.kind {
            NodeKind::Feature | NodeKind::Scenario => {
                format!("{}: {}", self.kind.keyword(), self.title)
            }
            NodeKind::Background if self.title.is_empty() => "Background:".to_string(),
            NodeKind::Background => format!("Background: {}", self.title),
            NodeKind::Comment => format!("# {}", self.title),
            NodeKind::Step | NodeKind::Root => self.title.clone(),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Adds a tag, ignoring a leading `@` and duplicates.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim().trim_start_matches('@');
        if !tag.is_empty() && !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        let tag = tag.trim().trim_start_matches('@');
        self.tags.retain(|t| t != tag);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_folded(&self) -> bool {
        self.flags.contains(NodeFlags::FOLDED)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn is_highlighted(&self) -> bool {
        self.flags.contains(NodeFlags::HIGHLIGHTED)
    }

    pub fn is_dragged(&self) -> bool {
        self.flags.contains(NodeFlags::DRAGGED)
    }

    pub fn sticks_to_parent(&self) -> bool {
        self.flags.contains(NodeFlags::STICK_TO_PARENT)
    }

    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.flags.set(NodeFlags::HIGHLIGHTED, highlighted);
    }

    pub fn play_state(&self) -> PlayState {
        self.play
    }

    pub fn set_play_state(&mut self, state: PlayState) {
        self.play = state;
    }

    pub fn is_failed(&self) -> bool {
        self.play == PlayState::Failed
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn screenshots(&self) -> &[PathBuf] {
        &self.screenshots
    }

    pub fn add_screenshot(&mut self, path: impl Into<PathBuf>) {
        self.screenshots.push(path.into());
    }

    pub fn render_width(&self) -> f32 {
        self.render_width
    }

    pub fn render_height(&self) -> f32 {
        self.render_height
    }

    pub fn padding_height(&self) -> f32 {
        self.padding_height
    }

    pub fn group_height(&self) -> f32 {
        self.group_height
    }

    /// Own height including the gap below it, without any children.
    pub fn self_height(&self) -> f32 {
        self.render_height + self.padding_height
    }

    pub fn container_state(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn render_rect(&self) -> Rect {
        let p = self.animator.movement.render();
        Rect::new(p.x, p.y, self.render_width, self.render_height)
    }

    /// Layout rectangle, including the padding gap below the bar.
    pub fn real_rect(&self) -> Rect {
        let p = self.animator.movement.real();
        Rect::new(
            p.x,
            p.y,
            self.render_width,
            self.render_height + self.padding_height,
        )
    }

    /// Layout rectangle covering the node and its laid out descendants.
    pub fn group_rect(&self) -> Rect {
        let p = self.animator.movement.real();
        Rect::new(p.x, p.y, self.render_width, self.group_height)
    }

    pub fn can_drag(&self) -> bool {
        match self.kind {
            NodeKind::Root => false,
            NodeKind::Feature => self.role == Role::Template,
            _ => true,
        }
    }

    pub fn bar_color(&self) -> Color {
        let [normal, highlighted] = self.kind.bar_colors();
        let base = if self.is_highlighted() {
            highlighted
        } else {
            normal
        };
        match self.role {
            Role::Template => {
                if self.is_highlighted() {
                    Color::rgba(0.5, 0.9, 0.5, 0.6)
                } else {
                    Color::rgba(0.4, 0.8, 0.4, 0.6)
                }
            }
            _ => base,
        }
    }

    /// Copy of this node's content and on-screen state, without relatives.
    /// The copy fades back in so it reads as a new arrival.
    pub fn duplicate(&self, fades: &FadeSpeeds) -> Node {
        let mut copy = Node::new(self.kind, self.role, self.title.clone());
        copy.description = self.description.clone();
        copy.tags = self.tags.clone();
        copy.filename = self.filename.clone();
        copy.flags = (self.flags & NodeFlags::FOLDED) | NodeFlags::VISIBLE;
        copy.play = self.play;
        copy.error_message = self.error_message.clone();
        copy.screenshots = self.screenshots.clone();
        copy.render_width = self.render_width;
        copy.render_height = self.render_height;
        copy.padding_height = self.padding_height;
        copy.group_height = self.self_height();
        copy.animator = self.animator.clone();
        copy.animator.color.set_alpha(0.0, 0.0);
        copy.animator
            .color
            .set_alpha(fades.bar_alpha, fades.reentrance);
        copy
    }
}

/// Copy `source` and its whole subtree, attaching the copy under `parent`
/// at `index`. Returns the id of the new subtree root.
pub fn deep_copy(
    tree: &mut Tree<Node>,
    source: NodeId,
    parent: NodeId,
    index: usize,
    fades: &FadeSpeeds,
) -> Option<NodeId> {
    let copy = tree.get(source)?.duplicate(fades);
    let copy_id = tree.insert(copy);
    if !tree.insert_child(parent, copy_id, index) {
        tree.remove(copy_id);
        return None;
    }
    let children = tree.children(source).to_vec();
    for (i, child) in children.into_iter().enumerate() {
        deep_copy(tree, child, copy_id, i, fades);
    }
    Some(copy_id)
}

/// Set the role of a whole subtree.
pub fn set_role(tree: &mut Tree<Node>, id: NodeId, role: Role) {
    for node in tree.descendants(id) {
        if let Some(n) = tree.get_mut(node) {
            n.role = role;
        }
    }
}

/// Set a run state on a node and everything below it.
pub fn set_play_state_recursive(tree: &mut Tree<Node>, id: NodeId, state: PlayState) {
    for node in tree.descendants(id) {
        if let Some(n) = tree.get_mut(node) {
            n.play = state;
            if state == PlayState::None {
                n.error_message = None;
                n.screenshots.clear();
            }
        }
    }
}

/// Mark a node failed together with all of its ancestors.
pub fn set_failed(tree: &mut Tree<Node>, id: NodeId) {
    let mut current = Some(id);
    while let Some(node) = current {
        match tree.get_mut(node) {
            Some(n) if n.kind != NodeKind::Root => n.play = PlayState::Failed,
            _ => break,
        }
        current = tree.parent(node);
    }
}

/// Tags of the subtree, optionally restricted to some kinds, without duplicates.
pub fn collect_tags(tree: &Tree<Node>, id: NodeId, kinds: &[NodeKind]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for node in tree.descendants(id).into_iter().filter_map(|n| tree.get(n)) {
        if !kinds.is_empty() && !kinds.contains(&node.kind) {
            continue;
        }
        for tag in &node.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_behave_as_set() {
        let mut node = Node::new(NodeKind::Scenario, Role::Document, "s");
        node.add_tag("@smoke");
        node.add_tag("smoke");
        node.add_tag("slow");
        assert_eq!(node.tags(), &["smoke".to_string(), "slow".to_string()]);
        assert!(node.has_tag("@slow"));
        node.remove_tag("@smoke");
        assert!(!node.has_tag("smoke"));
    }

    #[test]
    fn test_document_features_are_locked() {
        let doc = Node::new(NodeKind::Feature, Role::Document, "f");
        let template = Node::new(NodeKind::Feature, Role::Template, "f");
        assert!(!doc.can_drag());
        assert!(template.can_drag());
        assert!(Node::new(NodeKind::Step, Role::Document, "s").can_drag());
    }

    #[test]
    fn test_set_failed_reaches_ancestors() {
        let mut tree = Tree::new();
        let root = tree.insert(Node::new(NodeKind::Root, Role::Document, ""));
        let feature = tree.insert(Node::new(NodeKind::Feature, Role::Document, "f"));
        let scenario = tree.insert(Node::new(NodeKind::Scenario, Role::Document, "s"));
        let step = tree.insert(Node::new(NodeKind::Step, Role::Document, "Given x"));
        tree.append_child(root, feature);
        tree.append_child(feature, scenario);
        tree.append_child(scenario, step);

        set_failed(&mut tree, step);
        for id in [feature, scenario, step] {
            assert!(tree.get(id).map(Node::is_failed).unwrap_or(false));
        }
        assert_eq!(tree.get(root).map(|n| n.play), Some(PlayState::None));

        set_play_state_recursive(&mut tree, feature, PlayState::None);
        assert!(!tree.get(step).map(Node::is_failed).unwrap_or(true));
    }

    #[test]
    fn test_deep_copy_keeps_structure() {
        let fades = FadeSpeeds::default();
        let mut tree = Tree::new();
        let root = tree.insert(Node::new(NodeKind::Root, Role::Document, ""));
        let scenario = tree.insert(Node::new(NodeKind::Scenario, Role::Document, "s"));
        let step = tree.insert(Node::new(NodeKind::Step, Role::Document, "Given x"));
        tree.append_child(root, scenario);
        tree.append_child(scenario, step);

        let copy = deep_copy(&mut tree, scenario, root, 0, &fades).expect("copy attached");
        assert_eq!(tree.children(root), &[copy, scenario]);
        let copied_step = tree.children(copy)[0];
        assert_ne!(copied_step, step);
        assert_eq!(tree.get(copied_step).map(Node::title), Some("Given x"));
    }

    #[test]
    fn test_collect_tags_filters_by_kind() {
        let mut tree = Tree::new();
        let mut feature = Node::new(NodeKind::Feature, Role::Document, "f");
        feature.add_tag("web");
        let mut scenario = Node::new(NodeKind::Scenario, Role::Document, "s");
        scenario.add_tag("smoke");
        scenario.add_tag("web");
        let f = tree.insert(feature);
        let s = tree.insert(scenario);
        tree.append_child(f, s);

        assert_eq!(collect_tags(&tree, f, &[]), vec!["web", "smoke"]);
        assert_eq!(collect_tags(&tree, f, &[NodeKind::Feature]), vec!["web"]);
    }
}
