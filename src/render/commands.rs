//! Draw command definitions for the display list.

use crate::geometry::{Color, Rect};

/// Border definition for shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    /// Border width in logical pixels
    pub width: f32,
    pub color: Color,
}

impl Border {
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// A single draw operation in window coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    RoundedRect {
        rect: Rect,
        color: Color,
        /// Corner radius in logical pixels
        radius: f32,
        border: Option<Border>,
    },

    Text {
        text: String,
        /// The bounding rectangle the text wraps inside
        rect: Rect,
        color: Color,
        font_size: f32,
    },

    /// Restrict every following command to `rect` until the matching
    /// [`DrawCommand::PopClip`].
    PushClip(Rect),

    PopClip,
}

impl DrawCommand {
    /// Create a simple rounded rectangle.
    pub fn rounded_rect(rect: Rect, color: Color, radius: f32) -> Self {
        Self::RoundedRect {
            rect,
            color,
            radius,
            border: None,
        }
    }

    pub fn text(text: impl Into<String>, rect: Rect, color: Color, font_size: f32) -> Self {
        Self::Text {
            text: text.into(),
            rect,
            color,
            font_size,
        }
    }

    /// Bounds touched by the command, if it draws anything.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            DrawCommand::RoundedRect { rect, .. } | DrawCommand::Text { rect, .. } => Some(*rect),
            DrawCommand::PushClip(_) | DrawCommand::PopClip => None,
        }
    }
}
