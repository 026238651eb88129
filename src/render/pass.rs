//! Layout and paint in one traversal.
//!
//! The tree is walked twice per frame. The first walk paints every node
//! that is neither highlighted nor dragged (nor below a dragged node); the
//! second paints the rest, so whatever the user is holding always ends up
//! on top. Both walks lay the tree out the same way, accumulating each
//! node's group height from its children as they are visited.

use super::{Border, PaintContext};
use crate::config::LayoutConfig;
use crate::container::Container;
use crate::geometry::{Color, Rect};
use crate::node::{is_self_or_parent_folded, Node, NodeKind, Role};
use crate::text::TextMeasurer;
use crate::tree::{NodeId, Tree};

const RUNNING_BORDER_WIDTH: f32 = 2.0;
const ERROR_COLOR: Color = Color::rgb(0.8, 0.1, 0.1);

/// Bar widths for the two panels, computed from the window layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BarWidths {
    pub document: f32,
    pub templates: f32,
}

impl BarWidths {
    pub fn compute(layout: &LayoutConfig, document: &Container, templates: &Container) -> Self {
        let document_width = document.viewport().width - layout.document_margin
            + document.content_origin().x;
        let templates_width =
            templates.viewport().width - crate::container::CONTAINER_PADDING_HORIZONTAL * 2.0;
        Self {
            document: document_width.min(layout.document_max_width).max(0.0),
            templates: templates_width.min(layout.templates_max_width).max(0.0),
        }
    }

    fn for_role(&self, role: Role) -> f32 {
        match role {
            Role::Template => self.templates,
            Role::Document | Role::Canvas => self.document,
        }
    }
}

pub struct RenderPass<'a> {
    tree: &'a mut Tree<Node>,
    measurer: &'a mut dyn TextMeasurer,
    ctx: &'a mut PaintContext,
    layout: &'a LayoutConfig,
    widths: BarWidths,
    /// Window area; bars entirely outside it are laid out but not painted.
    bounds: Rect,
    running: &'a [NodeId],
}

impl<'a> RenderPass<'a> {
    pub fn new(
        tree: &'a mut Tree<Node>,
        measurer: &'a mut dyn TextMeasurer,
        ctx: &'a mut PaintContext,
        layout: &'a LayoutConfig,
        widths: BarWidths,
        bounds: Rect,
    ) -> Self {
        Self {
            tree,
            measurer,
            ctx,
            layout,
            widths,
            bounds,
            running: &[],
        }
    }

    /// Nodes drawn with the "now running" decoration.
    pub fn running(mut self, running: &'a [NodeId]) -> Self {
        self.running = running;
        self
    }

    /// Lay out and paint the subtree at `root`.
    pub fn run(mut self, root: NodeId) {
        let Some(node) = self.tree.get_mut(root) else {
            return;
        };
        if !node.animator.color.is_visible() {
            node.group_height = 0.0;
            return;
        }
        self.pass(root, false, false);
        self.pass(root, true, false);
    }

    fn pass(&mut self, id: NodeId, highlight_mode: bool, parent_dragged: bool) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if node.is_visible() {
            self.calculate_position(id);
        }
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let dragged = node.is_dragged() || parent_dragged;
        let lifted = node.is_highlighted() || dragged;
        if lifted == highlight_mode {
            self.paint_before(id, highlight_mode);
        }

        let children = self.tree.children(id).to_vec();
        for child in children {
            self.pass(child, highlight_mode, dragged);
            let contribution = match self.tree.get(child) {
                Some(c) if c.animator.color.is_visible() => c.group_height,
                _ => 0.0,
            };
            if let Some(node) = self.tree.get_mut(id) {
                node.group_height += contribution;
            }
        }

        let folded = is_self_or_parent_folded(self.tree, id);
        if let Some(node) = self.tree.get_mut(id) {
            if folded {
                node.group_height = node.self_height();
            }
            if !node.is_visible() {
                node.group_height = 0.0;
            }
        }
        if lifted == highlight_mode {
            self.paint_after(id, highlight_mode);
        }
    }

    fn calculate_position(&mut self, id: NodeId) {
        let parent = self.tree.parent(id);
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if node.container.is_some() {
            self.layout_container(id);
        } else if node.kind == NodeKind::Root {
            if let Some(node) = self.tree.get_mut(id) {
                node.group_height = 0.0;
            }
        } else {
            self.layout_bar(id, parent);
        }
    }

    /// Containers follow their viewport and scroll offset. The rendered
    /// position keeps its distance to the real one so a sliding panel
    /// stays in motion while scrolling.
    fn layout_container(&mut self, id: NodeId) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        let Some(container) = node.container.as_ref() else {
            return;
        };
        let origin = container.content_origin();
        let width = container.viewport().width;
        let movement = &mut node.animator.movement;
        let (old_real, old_render) = (movement.real(), movement.render());
        movement.set_real(origin.x, origin.y);
        movement.set_render(
            old_render.x + origin.x - old_real.x,
            old_render.y + origin.y - old_real.y,
        );
        node.render_width = width;
        node.render_height = 0.0;
        node.padding_height = 0.0;
        node.group_height = 0.0;
    }

    fn layout_bar(&mut self, id: NodeId, parent: Option<NodeId>) {
        let sticks = self.tree.get(id).is_some_and(Node::sticks_to_parent);
        let origin = parent.and_then(|p| self.tree.get(p)).map(|p| {
            let base = if sticks {
                p.animator.movement.render()
            } else {
                p.animator.movement.real()
            };
            (base.x + p.kind.child_indent(), base.y + p.group_height)
        });

        let layout = self.layout;
        let target_width = match self.tree.get(id) {
            Some(node) => self.widths.for_role(node.role),
            None => return,
        };
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        if let Some((x, y)) = origin {
            node.animator.movement.set_real(x, y);
        }
        if sticks || node.animator.color.just_became_visible() {
            node.animator.movement.jump_to_real();
        }

        let size = &mut node.animator.size;
        if size.dest().width <= 0.0 {
            size.set_immediate(target_width, 0.0);
        } else if size.dest().width != target_width {
            size.set_dest(target_width, size.dest().height);
        }
        node.render_width = if size.is_resizing() {
            size.current().width
        } else {
            target_width
        };

        let text_width = (node.render_width - layout.text_padding_horizontal * 2.0).max(1.0);
        let line_height = self.measurer.line_height(layout.font_size);
        let text_height = self
            .measurer
            .measure(&node.display_text(), layout.font_size, Some(text_width))
            .height;
        let description_height = node.description.len() as f32 * line_height;
        let tags_height = if node.tags.is_empty() {
            0.0
        } else {
            line_height + layout.tags_padding_vertical * 2.0
        };
        let error_height = match node.error_message.as_deref() {
            Some(message) if node.is_failed() => {
                self.measurer
                    .measure(message, layout.font_size, Some(text_width))
                    .height
                    + layout.text_padding_vertical
            }
            _ => 0.0,
        };

        let content = text_height + description_height + tags_height;
        node.render_height = layout
            .min_bar_height
            .max(content + layout.text_padding_vertical * 2.0)
            + error_height;
        node.padding_height = node.kind.vertical_padding();
        node.group_height = node.render_height + node.padding_height;
    }

    fn paint_before(&mut self, id: NodeId, highlight_mode: bool) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if let Some(container) = node.container.as_ref() {
            if !highlight_mode {
                self.ctx.push_clip(container.viewport());
            }
            return;
        }
        if node.kind == NodeKind::Root {
            return;
        }
        let rect = node.render_rect();
        let alpha = node.animator.color.alpha();
        if alpha <= 0.0 || !rect.intersects(&self.bounds) || self.ctx.is_clipped_out(&rect) {
            return;
        }
        let bar = BarPaint {
            rect,
            alpha,
            running: self.running.contains(&id),
        };
        bar.paint(node, self.ctx, &mut *self.measurer, self.layout);
    }

    fn paint_after(&mut self, id: NodeId, highlight_mode: bool) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        let content_height = node.group_height;
        let Some(container) = node.container.as_mut() else {
            return;
        };
        if highlight_mode {
            return;
        }
        self.ctx.pop_clip();
        container.set_content_height(content_height);
        let scrollbar = container.scrollbar();
        if scrollbar.content_height() <= scrollbar.viewport_height() {
            return;
        }
        let radius = scrollbar.config().corner_radius;
        let track_color = scrollbar.config().track_color;
        self.ctx
            .draw_rounded_rect(scrollbar.track_rect(), track_color, radius);
        self.ctx
            .draw_rounded_rect(scrollbar.thumb_rect(), scrollbar.handle_color(), radius);
    }
}

struct BarPaint {
    rect: Rect,
    alpha: f32,
    running: bool,
}

impl BarPaint {
    fn paint(
        &self,
        node: &Node,
        ctx: &mut PaintContext,
        measurer: &mut dyn TextMeasurer,
        layout: &LayoutConfig,
    ) {
        let (rect, alpha) = (self.rect, self.alpha);
        let base = node.bar_color();
        let fill = base.with_alpha(base.a * alpha);
        if self.running {
            let border = Border::new(RUNNING_BORDER_WIDTH, Color::BLACK.with_alpha(alpha));
            ctx.draw_rounded_rect_with_border(rect, fill, layout.bar_rounding, border);
        } else {
            ctx.draw_rounded_rect(rect, fill, layout.bar_rounding);
        }
        if let Some(tint) = node.play_state().bar_tint() {
            ctx.draw_rounded_rect(rect, tint.with_alpha(tint.a * alpha), layout.bar_rounding);
        }

        let text_color = Color::BLACK.with_alpha(alpha);
        let line_height = measurer.line_height(layout.font_size);
        let x = rect.x + layout.text_padding_horizontal;
        let width = (rect.width - layout.text_padding_horizontal * 2.0).max(1.0);
        let mut y = rect.y + layout.text_padding_vertical;

        if !node.tags.is_empty() {
            let tags = node
                .tags
                .iter()
                .map(|t| format!("@{t}"))
                .collect::<Vec<_>>()
                .join(" ");
            let tags_rect = Rect::new(x, y + layout.tags_padding_vertical, width, line_height);
            ctx.draw_text(&tags, tags_rect, text_color, layout.font_size);
            y += line_height + layout.tags_padding_vertical * 2.0;
        }

        let text = node.display_text();
        let text_height = measurer
            .measure(&text, layout.font_size, Some(width))
            .height;
        ctx.draw_text(
            &text,
            Rect::new(x, y, width, text_height),
            text_color,
            layout.font_size,
        );
        y += text_height;

        for line in &node.description {
            ctx.draw_text(
                line,
                Rect::new(x, y, width, line_height),
                text_color,
                layout.font_size,
            );
            y += line_height;
        }

        if let Some(message) = node.error_message.as_deref().filter(|_| node.is_failed()) {
            let height = measurer
                .measure(message, layout.font_size, Some(width))
                .height;
            ctx.draw_text(
                message,
                Rect::new(x, y + layout.text_padding_vertical, width, height),
                ERROR_COLOR.with_alpha(alpha),
                layout.font_size,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{fold, NodeFlags};
    use crate::render::DrawCommand;
    use crate::scrollbar::{ScrollbarConfig, ScrollbarSide};
    use crate::text::MonospaceMeasurer;
    use crate::animation::FadeSpeeds;

    struct Fixture {
        tree: Tree<Node>,
        container: NodeId,
        feature: NodeId,
        scenario: NodeId,
        steps: Vec<NodeId>,
    }

    fn fixture() -> Fixture {
        let mut tree = Tree::new();
        let mut container = Container::new(ScrollbarSide::Right, ScrollbarConfig::default());
        container.set_bounds(Rect::new(0.0, 10.0, 800.0, 590.0));
        let container = tree.insert(Node::container(Role::Document, container));
        let feature = tree.insert(Node::new(NodeKind::Feature, Role::Document, "f"));
        let scenario = tree.insert(Node::new(NodeKind::Scenario, Role::Document, "s"));
        tree.append_child(container, feature);
        tree.append_child(feature, scenario);
        let mut steps = Vec::new();
        for title in ["Given a", "When b", "Then c"] {
            let step = tree.insert(Node::new(NodeKind::Step, Role::Document, title));
            tree.append_child(scenario, step);
            steps.push(step);
        }
        Fixture {
            tree,
            container,
            feature,
            scenario,
            steps,
        }
    }

    fn render(tree: &mut Tree<Node>, root: NodeId) -> PaintContext {
        let layout = LayoutConfig::default();
        let mut measurer = MonospaceMeasurer::default();
        let mut ctx = PaintContext::new();
        let widths = BarWidths {
            document: 600.0,
            templates: 400.0,
        };
        RenderPass::new(
            tree,
            &mut measurer,
            &mut ctx,
            &layout,
            widths,
            Rect::new(0.0, 0.0, 1200.0, 600.0),
        )
        .run(root);
        ctx
    }

    fn height(tree: &Tree<Node>, id: NodeId) -> f32 {
        tree.get(id).map_or(0.0, Node::group_height)
    }

    fn self_height(tree: &Tree<Node>, id: NodeId) -> f32 {
        tree.get(id).map_or(0.0, Node::self_height)
    }

    #[test]
    fn test_group_height_sums_children() {
        let mut f = fixture();
        render(&mut f.tree, f.container);

        let steps: f32 = f.steps.iter().map(|s| self_height(&f.tree, *s)).sum();
        assert_eq!(
            height(&f.tree, f.scenario),
            self_height(&f.tree, f.scenario) + steps
        );
        assert_eq!(
            height(&f.tree, f.feature),
            self_height(&f.tree, f.feature) + height(&f.tree, f.scenario)
        );
        assert_eq!(height(&f.tree, f.container), height(&f.tree, f.feature));
    }

    #[test]
    fn test_folded_ancestor_collapses_to_own_height() {
        let mut f = fixture();
        let fades = FadeSpeeds::default();
        fold(&mut f.tree, f.feature, false, &fades);
        render(&mut f.tree, f.container);

        assert_eq!(height(&f.tree, f.feature), self_height(&f.tree, f.feature));
        assert_eq!(height(&f.tree, f.scenario), self_height(&f.tree, f.scenario));
    }

    #[test]
    fn test_children_are_laid_out_below_and_indented() {
        let mut f = fixture();
        render(&mut f.tree, f.container);

        let real = |id: NodeId| f.tree.get(id).map(|n| n.animator.movement.real());
        let feature = real(f.feature).unwrap_or_default();
        let scenario = real(f.scenario).unwrap_or_default();
        assert_eq!(feature.x, 20.0);
        assert_eq!(feature.y, 10.0);
        assert_eq!(scenario.x, feature.x + 50.0);
        assert_eq!(scenario.y, feature.y + self_height(&f.tree, f.feature));

        let first = real(f.steps[0]).unwrap_or_default();
        let second = real(f.steps[1]).unwrap_or_default();
        assert_eq!(second.y, first.y + self_height(&f.tree, f.steps[0]));
    }

    #[test]
    fn test_minimum_height_and_padding() {
        let mut f = fixture();
        render(&mut f.tree, f.container);
        let line = MonospaceMeasurer::default().line_height(13.0);
        let step = f.tree.get(f.steps[0]).map(|n| (n.render_height, n.padding_height));
        assert_eq!(step, Some(((line + 10.0).max(20.0), 5.0)));

        if let Some(node) = f.tree.get_mut(f.steps[1]) {
            node.set_title("");
        }
        render(&mut f.tree, f.container);
        let empty = f.tree.get(f.steps[1]).map(|n| n.render_height);
        assert_eq!(empty, Some((line + 10.0).max(20.0)));
    }

    #[test]
    fn test_dragged_subtree_is_painted_last() {
        let mut f = fixture();
        render(&mut f.tree, f.container);
        if let Some(node) = f.tree.get_mut(f.steps[0]) {
            node.flags.insert(NodeFlags::DRAGGED);
        }
        let ctx = render(&mut f.tree, f.container);

        let texts: Vec<&str> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.last(), Some(&"Given a"));
        let pop = ctx
            .commands()
            .iter()
            .position(|c| *c == DrawCommand::PopClip)
            .unwrap_or(0);
        let dragged = ctx
            .commands()
            .iter()
            .position(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Given a"))
            .unwrap_or(0);
        assert!(dragged > pop);
    }

    #[test]
    fn test_invisible_root_paints_nothing() {
        let mut f = fixture();
        if let Some(node) = f.tree.get_mut(f.container) {
            node.animator.color.set_alpha(0.0, 0.0);
        }
        let ctx = render(&mut f.tree, f.container);
        assert!(ctx.commands().is_empty());
        assert_eq!(height(&f.tree, f.container), 0.0);
    }

    #[test]
    fn test_content_height_reaches_scrollbar() {
        let mut f = fixture();
        render(&mut f.tree, f.container);
        let container = f.tree.get(f.container).and_then(Node::container_state);
        assert_eq!(
            container.map(Container::content_height),
            Some(height(&f.tree, f.feature))
        );
    }

    #[test]
    fn test_bar_widths_are_capped() {
        let layout = LayoutConfig::default();
        let mut document = Container::new(ScrollbarSide::Right, ScrollbarConfig::default());
        document.set_bounds(Rect::new(0.0, 10.0, 2000.0, 600.0));
        let mut templates = Container::new(ScrollbarSide::Left, ScrollbarConfig::default());
        templates.set_bounds(Rect::new(2000.0, 10.0, 300.0, 600.0));
        let widths = BarWidths::compute(&layout, &document, &templates);
        assert_eq!(widths.document, 600.0);
        assert_eq!(widths.templates, 260.0);
    }
}
