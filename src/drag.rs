//! Pointer-driven drag state machine.
//!
//! A press either picks up a node or starts scrolling the panel under the
//! pointer. While a node is held, the drop position is resolved once per
//! tick: the group under the pointer is found, the insertion index is taken
//! from the node under the pointer, and the tree is only touched when that
//! node changes. Releasing a template quickly throws it into the document.

use std::collections::VecDeque;

use crate::config::DragConfig;
use crate::geometry::Point;
use crate::input::Modifiers;
use crate::node::{
    apply_drag_offset, deep_copy, end_drag, find_element, find_element_at_real_position,
    find_group, is_draggable, start_drag, toggle_fold, NodeKind, Role,
};
use crate::scene::Canvas;
use crate::tree::NodeId;

/// Recent pointer samples used to measure the release speed.
#[derive(Debug, Clone)]
pub struct DragHistory {
    samples: VecDeque<(Point, u64)>,
    capacity: usize,
    interval_ms: u64,
}

impl DragHistory {
    pub fn new(capacity: usize, interval_ms: u64) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            interval_ms,
        }
    }

    /// Fill the history with the press position so a release without
    /// movement measures zero speed.
    pub fn reset(&mut self, pointer: Point, now_ms: u64) {
        self.samples.clear();
        for _ in 0..self.capacity {
            self.samples.push_back((pointer, now_ms));
        }
    }

    /// Record a sample unless the newest one is younger than the interval.
    pub fn record(&mut self, pointer: Point, now_ms: u64) {
        if let Some((_, newest)) = self.samples.back() {
            if now_ms < newest + self.interval_ms {
                return;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((pointer, now_ms));
    }

    /// Squared distance per millisecond between the oldest and newest sample.
    pub fn speed(&self) -> f32 {
        let (Some((from, t0)), Some((to, t1))) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = t1.saturating_sub(*t0);
        if elapsed == 0 {
            return 0.0;
        }
        from.distance_squared(*to) / elapsed as f32
    }

    pub fn is_throw(&self, limit: f32) -> bool {
        self.speed() > limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    /// A node follows the pointer.
    Node(NodeId),
    /// The pointer scrolls a panel, by its content or its scrollbar.
    Container(NodeId),
}

/// What a released node did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub node: NodeId,
    pub thrown: bool,
    /// The node now anchors the next throw, so the document changed.
    pub placed: bool,
}

pub struct DragController {
    config: DragConfig,
    mode: DragMode,
    history: DragHistory,
    pointer: Point,
    /// Set by pointer movement, consumed by the next resolve.
    moved: bool,
    last_bubbled: Option<NodeId>,
    touched_group: Option<NodeId>,
    last_touched_group: Option<NodeId>,
    group_since_ms: u64,
    highlighted: Option<NodeId>,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        let history = DragHistory::new(config.history_length, config.history_interval_ms);
        Self {
            config,
            mode: DragMode::Idle,
            history,
            pointer: Point::default(),
            moved: false,
            last_bubbled: None,
            touched_group: None,
            last_touched_group: None,
            group_since_ms: 0,
            highlighted: None,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn dragged_node(&self) -> Option<NodeId> {
        match self.mode {
            DragMode::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    pub fn history(&self) -> &DragHistory {
        &self.history
    }

    /// Press: pick up the node under the pointer, or scroll its panel.
    /// With Ctrl held a copy of a document node stays where it was.
    pub fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        pointer: Point,
        modifiers: Modifiers,
        now_ms: u64,
    ) -> DragMode {
        self.pointer = pointer;
        self.moved = false;
        let root = canvas.root();
        let touched = find_element(&canvas.tree, root, pointer.x, pointer.y)
            .filter(|id| is_draggable(&canvas.tree, *id));

        if let Some(id) = touched {
            let fades = canvas.fades;
            if modifiers.ctrl && Self::copies_on_ctrl(canvas, id) {
                if let (Some(parent), Some(index)) = (canvas.tree.parent(id), canvas.tree.index_of(id)) {
                    deep_copy(&mut canvas.tree, id, parent, index, &fades);
                    log::debug!("Copied {id:?} before dragging it");
                }
            }
            start_drag(&mut canvas.tree, id, pointer, &fades);
            if let Some(old) = self.highlighted.take() {
                if let Some(node) = canvas.node_mut(old) {
                    node.set_highlighted(false);
                }
            }
            self.history.reset(pointer, now_ms);
            self.last_bubbled = None;
            self.touched_group = None;
            self.last_touched_group = None;
            self.mode = DragMode::Node(id);
        } else if let Some(panel) = Self::panel_at(canvas, pointer) {
            if let Some(container) = canvas.container_mut(panel) {
                container.start_drag(pointer);
            }
            self.mode = DragMode::Container(panel);
        } else {
            self.mode = DragMode::Idle;
        }
        self.mode
    }

    fn copies_on_ctrl(canvas: &Canvas, id: NodeId) -> bool {
        canvas.node(id).is_some_and(|n| {
            n.role() == Role::Document
                && !matches!(n.kind(), NodeKind::Feature | NodeKind::Background)
        })
    }

    fn panel_at(canvas: &Canvas, pointer: Point) -> Option<NodeId> {
        [canvas.document(), canvas.templates()]
            .into_iter()
            .find(|panel| {
                canvas
                    .container(*panel)
                    .is_some_and(|c| c.viewport().contains(pointer.x, pointer.y))
            })
    }

    /// Pointer motion. Panel scrolling follows at once; a held node is
    /// moved by the next [`DragController::resolve`].
    pub fn pointer_moved(&mut self, canvas: &mut Canvas, pointer: Point) {
        let delta = pointer.y - self.pointer.y;
        self.pointer = pointer;
        self.moved = true;
        if let DragMode::Container(panel) = self.mode {
            if let Some(container) = canvas.container_mut(panel) {
                container.drag(pointer, delta);
            }
        }
    }

    /// Per-tick work while a node is held. Returns whether the tree changed.
    pub fn resolve(&mut self, canvas: &mut Canvas, now_ms: u64) -> bool {
        let DragMode::Node(id) = self.mode else {
            return false;
        };
        let mut changed = false;
        if self.moved {
            self.moved = false;
            apply_drag_offset(&mut canvas.tree, id, self.pointer);
            self.history.record(self.pointer, now_ms);
            changed = self.resolve_drop(canvas, id);
        }
        changed |= self.unfold_on_hover(canvas, now_ms);
        self.edge_scroll(canvas);
        changed
    }

    fn resolve_drop(&mut self, canvas: &mut Canvas, id: NodeId) -> bool {
        let Some(kind) = canvas.node(id).map(|n| n.kind()) else {
            return false;
        };
        let (x, y) = (self.pointer.x, self.pointer.y);
        let root = canvas.root();
        let mut group = find_group(&canvas.tree, root, x, y, kind);
        if kind == NodeKind::Background {
            if let Some(feature) = group {
                if canvas.find_background(feature).is_some_and(|b| b != id) {
                    group = None;
                }
            }
        }
        if group.is_none() && kind == NodeKind::Feature {
            group = Some(canvas.document());
        }
        self.touched_group = group;

        // Panels are never reordered by hovering; features reach the
        // document by a throw.
        let Some(group) = group.filter(|g| canvas.container(*g).is_none()) else {
            self.last_bubbled = None;
            return false;
        };
        let touched = find_element_at_real_position(&canvas.tree, root, x, y);
        if touched == self.last_bubbled {
            return false;
        }
        self.last_bubbled = touched;

        let index = match touched {
            Some(t) if t == group => {
                if canvas.node(group).is_some_and(|n| n.is_folded()) {
                    None
                } else {
                    Some(0)
                }
            }
            Some(t) => std::iter::once(t)
                .chain(canvas.tree.ancestors(t))
                .find(|n| canvas.tree.parent(*n) == Some(group))
                .and_then(|n| canvas.tree.index_of(n)),
            None => None,
        };
        canvas.update_element_index(group, id, index)
    }

    fn unfold_on_hover(&mut self, canvas: &mut Canvas, now_ms: u64) -> bool {
        if self.touched_group != self.last_touched_group {
            self.group_since_ms = now_ms;
        }
        self.last_touched_group = self.touched_group;
        let Some(group) = self.touched_group else {
            return false;
        };
        if canvas.container(group).is_some() {
            return false;
        }
        let folded = canvas.node(group).is_some_and(|n| n.is_folded());
        if folded && now_ms > self.group_since_ms + self.config.unfold_delay_ms {
            let fades = canvas.fades;
            log::debug!("Unfolding {group:?} under the dragged node");
            return toggle_fold(&mut canvas.tree, group, &fades);
        }
        false
    }

    fn edge_scroll(&self, canvas: &mut Canvas) {
        let y = self.pointer.y;
        let area = self.config.edge_scroll_area;
        let amount = self.config.edge_scroll_amount;
        let height = canvas.canvas_height();
        let document = canvas.document();
        let Some(container) = canvas.container_mut(document) else {
            return;
        };
        if y < area {
            container.scroll_by(-amount);
        }
        if y > height - area {
            container.scroll_by(amount);
        }
    }

    /// Release. A held node is resolved one last time, dropped, and thrown
    /// into the document when it left the templates fast enough.
    pub fn pointer_up(&mut self, canvas: &mut Canvas, pointer: Point, now_ms: u64) -> Option<Release> {
        if pointer != self.pointer {
            self.pointer = pointer;
            self.moved = true;
        }
        let mode = std::mem::take(&mut self.mode);
        match mode {
            DragMode::Idle => None,
            DragMode::Container(panel) => {
                if let Some(container) = canvas.container_mut(panel) {
                    container.end_drag();
                }
                None
            }
            DragMode::Node(id) => {
                if self.moved {
                    self.moved = false;
                    apply_drag_offset(&mut canvas.tree, id, self.pointer);
                    self.history.record(self.pointer, now_ms);
                    self.resolve_drop(canvas, id);
                }
                let fades = canvas.fades;
                end_drag(&mut canvas.tree, id, &fades);
                self.touched_group = None;
                self.last_touched_group = None;
                self.last_bubbled = None;

                let from_templates = canvas.tree.parent(id) == Some(canvas.templates());
                let speed = self.history.speed();
                let thrown = from_templates
                    && canvas.last_added().is_some()
                    && self.history.is_throw(self.config.throw_limit)
                    && canvas.throw_to_document(id);
                if thrown {
                    log::debug!("Throw detected at {speed:.1} px²/ms");
                }
                let placed = canvas.update_last_added(id);
                Some(Release {
                    node: id,
                    thrown,
                    placed,
                })
            }
        }
    }

    /// Move the highlight to the node under the pointer. Skipped while a
    /// node is held.
    pub fn update_highlight(&mut self, canvas: &mut Canvas) {
        if self.dragged_node().is_some() {
            return;
        }
        let root = canvas.root();
        let touched = find_element(&canvas.tree, root, self.pointer.x, self.pointer.y);
        if touched == self.highlighted {
            return;
        }
        if let Some(node) = self.highlighted.and_then(|id| canvas.node_mut(id)) {
            node.set_highlighted(false);
        }
        if let Some(node) = touched.and_then(|id| canvas.node_mut(id)) {
            node.set_highlighted(true);
        }
        self.highlighted = touched;
    }

    /// Forget the pointer, e.g. when it leaves the window.
    pub fn clear_highlight(&mut self, canvas: &mut Canvas) {
        if let Some(node) = self.highlighted.take().and_then(|id| canvas.node_mut(id)) {
            node.set_highlighted(false);
        }
    }

    /// Let go of everything without dropping, e.g. before the document is
    /// replaced.
    pub fn cancel(&mut self, canvas: &mut Canvas) {
        match std::mem::take(&mut self.mode) {
            DragMode::Node(id) => {
                let fades = canvas.fades;
                end_drag(&mut canvas.tree, id, &fades);
            }
            DragMode::Container(panel) => {
                if let Some(container) = canvas.container_mut(panel) {
                    container.end_drag();
                }
            }
            DragMode::Idle => {}
        }
        self.clear_highlight(canvas);
        self.moved = false;
        self.last_bubbled = None;
        self.touched_group = None;
        self.last_touched_group = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_respects_interval() {
        let mut history = DragHistory::new(5, 5);
        history.reset(Point::new(0.0, 0.0), 100);
        history.record(Point::new(10.0, 0.0), 102);
        assert_eq!(history.speed(), 0.0);
        history.record(Point::new(10.0, 0.0), 105);
        assert_eq!(history.speed(), 100.0 / 5.0);
    }

    #[test]
    fn test_history_window_slides() {
        let mut history = DragHistory::new(3, 5);
        history.reset(Point::new(0.0, 0.0), 0);
        for (i, x) in [10.0, 20.0, 30.0].into_iter().enumerate() {
            history.record(Point::new(x, 0.0), (i as u64 + 1) * 10);
        }
        // Oldest kept sample is x = 10 at t = 10.
        assert_eq!(history.speed(), 400.0 / 20.0);
        assert!(history.is_throw(10.0));
        assert!(!history.is_throw(25.0));
    }

    #[test]
    fn test_release_without_motion_is_not_a_throw() {
        let mut history = DragHistory::new(5, 5);
        history.reset(Point::new(50.0, 50.0), 1000);
        assert_eq!(history.speed(), 0.0);
        assert!(!history.is_throw(0.0));
    }
}
