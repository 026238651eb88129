//! Vertical scrollbar model for the scroll containers.
//!
//! The scroll offset is stored as a non-negative distance from the top of
//! the content. While the thumb is being dragged the offset is derived from
//! the thumb position; otherwise the thumb position is derived from the
//! offset.

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Rect};

/// Edge of the container the scrollbar is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollbarSide {
    Left,
    Right,
}

/// Configuration for scrollbar appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollbarConfig {
    /// Width of the track and thumb
    pub width: f32,
    /// Gap between the track and the container edge
    pub padding_horizontal: f32,
    /// Gap above and below the track
    pub padding_vertical: f32,
    pub corner_radius: f32,
    pub track_color: Color,
    pub handle_color: Color,
    /// Color of the handle when hovered or dragged
    pub handle_active_color: Color,
}

impl Default for ScrollbarConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            padding_horizontal: 3.0,
            padding_vertical: 5.0,
            corner_radius: 7.0,
            track_color: Color::rgba(0.0, 0.0, 0.0, 0.5),
            handle_color: Color::rgba(1.0, 1.0, 1.0, 0.5),
            handle_active_color: Color::rgba(1.0, 1.0, 1.0, 0.6),
        }
    }
}

/// Builder for customizing scrollbar appearance
#[derive(Default)]
pub struct ScrollbarBuilder {
    config: ScrollbarConfig,
}

impl ScrollbarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: f32) -> Self {
        self.config.width = width;
        self
    }

    pub fn padding(mut self, horizontal: f32, vertical: f32) -> Self {
        self.config.padding_horizontal = horizontal;
        self.config.padding_vertical = vertical;
        self
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.config.corner_radius = radius;
        self
    }

    pub fn track_color(mut self, color: Color) -> Self {
        self.config.track_color = color;
        self
    }

    pub fn handle_color(mut self, color: Color) -> Self {
        self.config.handle_color = color;
        self
    }

    pub fn handle_active_color(mut self, color: Color) -> Self {
        self.config.handle_active_color = color;
        self
    }

    pub fn build(self) -> ScrollbarConfig {
        self.config
    }
}

#[derive(Debug, Clone)]
pub struct Scrollbar {
    config: ScrollbarConfig,
    side: ScrollbarSide,
    track: Rect,
    viewport_height: f32,
    content_height: f32,
    offset: f32,
    /// Thumb top relative to the track top.
    thumb_y: f32,
    dragging: bool,
    hovered: bool,
}

impl Scrollbar {
    pub fn new(side: ScrollbarSide, config: ScrollbarConfig) -> Self {
        Self {
            config,
            side,
            track: Rect::new(0.0, 0.0, 0.0, 1.0),
            viewport_height: 1.0,
            content_height: 0.0,
            offset: 0.0,
            thumb_y: 0.0,
            dragging: false,
            hovered: false,
        }
    }

    pub fn config(&self) -> &ScrollbarConfig {
        &self.config
    }

    /// Place the track along the chosen edge of `viewport`.
    pub fn set_bounds(&mut self, viewport: Rect) {
        let width = self.config.width;
        let x = match self.side {
            ScrollbarSide::Left => viewport.x + self.config.padding_horizontal,
            ScrollbarSide::Right => viewport.right() - self.config.padding_horizontal - width,
        };
        let height = (viewport.height - self.config.padding_vertical * 2.0).max(1.0);
        self.track = Rect::new(x, viewport.y + self.config.padding_vertical, width, height);
        self.viewport_height = viewport.height.max(1.0);
        self.clamp();
    }

    pub fn set_content_height(&mut self, height: f32) {
        self.content_height = height.max(0.0);
        self.clamp();
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn track_rect(&self) -> Rect {
        self.track
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
        self.clamp();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Thumb length: the visible share of the content, scaled to the track.
    pub fn thumb_height(&self) -> f32 {
        let visible = self.viewport_height / self.viewport_height.max(self.content_height).max(1.0);
        (self.track.height * visible).clamp(1.0, self.track.height)
    }

    fn travel(&self) -> f32 {
        (self.track.height - self.thumb_height()).max(0.0)
    }

    pub fn thumb_rect(&self) -> Rect {
        Rect::new(
            self.track.x,
            self.track.y + self.thumb_y,
            self.track.width,
            self.thumb_height(),
        )
    }

    /// The column the scrollbar occupies, extended to the container edge.
    pub fn is_over(&self, x: f32, y: f32) -> bool {
        let within_height = y >= self.track.y - self.config.padding_vertical
            && y < self.track.bottom() + self.config.padding_vertical;
        let within_column = match self.side {
            ScrollbarSide::Left => x <= self.track.right(),
            ScrollbarSide::Right => x >= self.track.x,
        };
        within_height && within_column
    }

    fn clamp(&mut self) {
        self.offset = self.offset.clamp(0.0, self.max_offset());
        self.thumb_y = self.thumb_y.clamp(0.0, self.travel());
        if !self.dragging {
            self.sync_thumb();
        }
    }

    fn sync_thumb(&mut self) {
        let max = self.max_offset();
        self.thumb_y = if max > 0.0 {
            self.travel() * self.offset / max
        } else {
            0.0
        };
    }

    pub fn begin_drag(&mut self, pointer_y: f32) {
        self.dragging = true;
        self.drag_thumb(pointer_y, 0.0);
    }

    /// Move the thumb by `delta`. A pointer outside the thumb re-centres
    /// the thumb on the pointer first.
    pub fn drag_thumb(&mut self, pointer_y: f32, delta: f32) {
        self.dragging = true;
        let thumb_height = self.thumb_height();
        let grab = pointer_y - self.track.y - self.thumb_y;
        if grab < 0.0 || grab >= thumb_height {
            self.thumb_y = pointer_y - self.track.y - thumb_height / 2.0;
        } else {
            self.thumb_y += delta;
        }
        self.thumb_y = self.thumb_y.clamp(0.0, self.travel());
        self.offset = self.thumb_y * self.max_offset() / self.travel().max(1.0);
        self.offset = self.offset.clamp(0.0, self.max_offset());
    }

    /// Grab-the-canvas scrolling: content follows the pointer.
    pub fn drag_canvas(&mut self, delta: f32) {
        self.dragging = false;
        self.offset -= delta;
        self.clamp();
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.sync_thumb();
    }

    pub fn scroll_to_top(&mut self) {
        self.dragging = false;
        self.offset = 0.0;
        self.thumb_y = 0.0;
    }

    pub fn handle_color(&self) -> Color {
        if self.hovered || self.dragging {
            self.config.handle_active_color
        } else {
            self.config.handle_color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(content: f32) -> Scrollbar {
        let mut s = Scrollbar::new(
            ScrollbarSide::Left,
            ScrollbarBuilder::new().padding(0.0, 0.0).build(),
        );
        s.set_bounds(Rect::new(0.0, 0.0, 300.0, 100.0));
        s.set_content_height(content);
        s
    }

    #[test]
    fn test_empty_content_fills_track_and_pins_offset() {
        let mut s = bar(0.0);
        assert_eq!(s.thumb_height(), s.track_rect().height);
        for delta in [-500.0, -1.0, 0.0, 3.0, 1000.0] {
            s.drag_canvas(delta);
            assert_eq!(s.offset(), 0.0);
            s.begin_drag(50.0);
            s.drag_thumb(50.0 + delta, delta);
            assert_eq!(s.offset(), 0.0);
            s.end_drag();
        }
    }

    #[test]
    fn test_thumb_is_viewport_share() {
        let s = bar(400.0);
        assert_eq!(s.thumb_height(), 25.0);
    }

    #[test]
    fn test_canvas_drag_clamps_to_content() {
        let mut s = bar(400.0);
        s.drag_canvas(-120.0);
        assert_eq!(s.offset(), 120.0);
        s.drag_canvas(-1000.0);
        assert_eq!(s.offset(), 300.0);
        assert_eq!(s.thumb_rect().y, 75.0);
        s.drag_canvas(1000.0);
        assert_eq!(s.offset(), 0.0);
    }

    #[test]
    fn test_press_outside_thumb_recentres() {
        let mut s = bar(400.0);
        s.begin_drag(50.0);
        // thumb 25 px centred on 50 => top at 37.5 of 75 travel
        assert_eq!(s.thumb_rect().y, 37.5);
        assert_eq!(s.offset(), 150.0);
    }

    #[test]
    fn test_thumb_drag_maps_back_to_offset() {
        let mut s = bar(400.0);
        s.begin_drag(5.0);
        assert_eq!(s.thumb_rect().y, 0.0);
        s.drag_thumb(20.0, 15.0);
        assert_eq!(s.thumb_rect().y, 15.0);
        assert_eq!(s.offset(), 60.0);
        s.end_drag();
        assert_eq!(s.thumb_rect().y, 15.0);
    }

    #[test]
    fn test_right_side_column() {
        let mut s = Scrollbar::new(ScrollbarSide::Right, ScrollbarConfig::default());
        s.set_bounds(Rect::new(100.0, 0.0, 200.0, 100.0));
        assert!(s.is_over(295.0, 50.0));
        assert!(!s.is_over(150.0, 50.0));
    }
}
