//! Display list output of a frame.
//!
//! The scene does not rasterize anything itself. Each frame it lays the tree
//! out and appends [`DrawCommand`]s to a [`PaintContext`], which the host
//! hands to whatever backend it draws with.

mod commands;
mod pass;

pub use commands::{Border, DrawCommand};
pub use pass::{BarWidths, RenderPass};

use crate::geometry::{Color, Rect};

#[derive(Debug, Default)]
pub struct PaintContext {
    commands: Vec<DrawCommand>,
    /// Clip stack for clipping children to container bounds
    clip_stack: Vec<Rect>,
}

impl PaintContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with pre-allocated capacity to avoid per-frame allocations
    pub fn with_capacity(commands: usize) -> Self {
        Self {
            commands: Vec::with_capacity(commands),
            clip_stack: Vec::with_capacity(4),
        }
    }

    /// Clear all buffers for reuse, preserving allocated capacity
    pub fn clear(&mut self) {
        self.commands.clear();
        self.clip_stack.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn draw_rounded_rect(&mut self, rect: Rect, color: Color, radius: f32) {
        self.commands
            .push(DrawCommand::rounded_rect(rect, color, radius));
    }

    pub fn draw_rounded_rect_with_border(
        &mut self,
        rect: Rect,
        color: Color,
        radius: f32,
        border: Border,
    ) {
        self.commands.push(DrawCommand::RoundedRect {
            rect,
            color,
            radius,
            border: Some(border),
        });
    }

    pub fn draw_text(&mut self, text: &str, rect: Rect, color: Color, font_size: f32) {
        self.commands
            .push(DrawCommand::text(text, rect, color, font_size));
    }

    /// Push a clip region onto the stack.
    /// All commands drawn after this are clipped to the given bounds.
    pub fn push_clip(&mut self, rect: Rect) {
        self.clip_stack.push(rect);
        self.commands.push(DrawCommand::PushClip(rect));
    }

    /// Pop a clip region from the stack. Unbalanced pops are ignored.
    pub fn pop_clip(&mut self) {
        if self.clip_stack.pop().is_some() {
            self.commands.push(DrawCommand::PopClip);
        }
    }

    /// Whether `rect` would be entirely hidden by the current clip.
    pub fn is_clipped_out(&self, rect: &Rect) -> bool {
        self.clip_stack
            .last()
            .is_some_and(|clip| !clip.intersects(rect))
    }
}
