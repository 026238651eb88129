//! Scrollable root containers.
//!
//! A container is stored on a `NodeKind::Root` node. It owns the viewport
//! and the scrollbar; its children are laid out from [`Container::content_origin`].

use crate::geometry::{Point, Rect};
use crate::scrollbar::{Scrollbar, ScrollbarConfig, ScrollbarSide};

/// Horizontal inset of the content inside the viewport.
pub const CONTAINER_PADDING_HORIZONTAL: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct Container {
    viewport: Rect,
    /// Extra space kept above the content, used to slide the panel.
    vertical_gap: f32,
    scrollbar: Scrollbar,
}

impl Container {
    pub fn new(side: ScrollbarSide, config: ScrollbarConfig) -> Self {
        Self {
            viewport: Rect::default(),
            vertical_gap: 0.0,
            scrollbar: Scrollbar::new(side, config),
        }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_bounds(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.scrollbar.set_bounds(viewport);
    }

    pub fn scrollbar(&self) -> &Scrollbar {
        &self.scrollbar
    }

    pub fn scrollbar_mut(&mut self) -> &mut Scrollbar {
        &mut self.scrollbar
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scrollbar.offset()
    }

    pub fn content_height(&self) -> f32 {
        self.scrollbar.content_height()
    }

    /// Record the laid out height of the children for scroll clamping.
    pub fn set_content_height(&mut self, height: f32) {
        self.scrollbar.set_content_height(height);
    }

    pub fn push_to_position(&mut self, gap: f32) {
        self.vertical_gap = gap;
    }

    pub fn vertical_gap(&self) -> f32 {
        self.vertical_gap
    }

    /// Layout origin of the first child.
    pub fn content_origin(&self) -> Point {
        Point::new(
            self.viewport.x + CONTAINER_PADDING_HORIZONTAL,
            self.viewport.y + self.vertical_gap - self.scrollbar.offset(),
        )
    }

    pub fn is_over_scrollbar(&self, x: f32, y: f32) -> bool {
        self.scrollbar.is_over(x, y)
    }

    /// Pointer press on the container background.
    pub fn start_drag(&mut self, pointer: Point) {
        if self.scrollbar.is_over(pointer.x, pointer.y) {
            self.scrollbar.begin_drag(pointer.y);
        }
    }

    /// Pointer moved by `delta_y` with the button held.
    pub fn drag(&mut self, pointer: Point, delta_y: f32) {
        if self.scrollbar.is_dragging() {
            self.scrollbar.drag_thumb(pointer.y, delta_y);
        } else {
            self.scrollbar.drag_canvas(delta_y);
        }
    }

    pub fn end_drag(&mut self) {
        self.scrollbar.end_drag();
    }

    /// Scroll by a content distance; positive values reveal content below.
    pub fn scroll_by(&mut self, amount: f32) {
        self.scrollbar.drag_canvas(-amount);
    }

    pub fn scroll_to_top(&mut self) {
        self.scrollbar.scroll_to_top();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Container {
        let mut c = Container::new(ScrollbarSide::Left, ScrollbarConfig::default());
        c.set_bounds(Rect::new(0.0, 10.0, 400.0, 200.0));
        c.set_content_height(1000.0);
        c
    }

    #[test]
    fn test_content_origin_follows_scroll() {
        let mut c = container();
        assert_eq!(c.content_origin(), Point::new(20.0, 10.0));
        c.scroll_by(50.0);
        assert_eq!(c.content_origin(), Point::new(20.0, -40.0));
        c.push_to_position(30.0);
        assert_eq!(c.content_origin().y, -10.0);
        c.scroll_to_top();
        assert_eq!(c.content_origin().y, 40.0);
    }

    #[test]
    fn test_press_on_scrollbar_drags_thumb() {
        let mut c = container();
        c.start_drag(Point::new(5.0, 100.0));
        assert!(c.scrollbar().is_dragging());
        assert!(c.scroll_offset() > 0.0);
        c.end_drag();
        assert!(!c.scrollbar().is_dragging());
    }

    #[test]
    fn test_press_on_canvas_drags_content() {
        let mut c = container();
        c.start_drag(Point::new(200.0, 100.0));
        c.drag(Point::new(200.0, 80.0), -20.0);
        assert_eq!(c.scroll_offset(), 20.0);
    }
}
