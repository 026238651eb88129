//! Text measurement used by layout to size bars.

use std::cell::RefCell;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};

use crate::geometry::Size;

pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

pub trait TextMeasurer: Send {
    /// Size of `text` when wrapped at `max_width`.
    fn measure(&mut self, text: &str, font_size: f32, max_width: Option<f32>) -> Size;

    fn line_height(&self, font_size: f32) -> f32 {
        font_size * LINE_HEIGHT_FACTOR
    }
}

/// Fixed-advance measurer with greedy word wrapping. Deterministic, so
/// geometry in tests does not depend on installed fonts.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasurer {
    /// Advance of one character as a fraction of the font size.
    pub advance: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl MonospaceMeasurer {
    fn wrap_count(words: &[&str], char_width: f32, max_width: Option<f32>) -> (usize, f32) {
        let Some(max_width) = max_width.filter(|w| *w > 0.0) else {
            let chars = words.iter().map(|w| w.chars().count()).sum::<usize>()
                + words.len().saturating_sub(1);
            return (1, chars as f32 * char_width);
        };
        let mut lines = 1;
        let mut widest = 0.0f32;
        let mut line = 0.0f32;
        for word in words {
            let w = word.chars().count() as f32 * char_width;
            let with_space = if line > 0.0 { line + char_width + w } else { w };
            if with_space > max_width && line > 0.0 {
                widest = widest.max(line);
                lines += 1;
                line = w;
            } else {
                line = with_space;
            }
        }
        (lines, widest.max(line).min(max_width))
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, max_width: Option<f32>) -> Size {
        let char_width = font_size * self.advance;
        let mut lines = 0;
        let mut width = 0.0f32;
        for paragraph in text.split('\n') {
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            let (count, w) = Self::wrap_count(&words, char_width, max_width);
            lines += count;
            width = width.max(w);
        }
        Size::new(width, lines.max(1) as f32 * self.line_height(font_size))
    }
}

thread_local! {
    static FONT_SYSTEM: RefCell<FontSystem> = RefCell::new(FontSystem::new());
}

/// Measurer backed by cosmic-text shaping with the system font set.
///
/// The font system lives in a thread local, so the measurer itself is a
/// zero-sized handle that can move into the engine thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosmicTextMeasurer;

impl TextMeasurer for CosmicTextMeasurer {
    fn measure(&mut self, text: &str, font_size: f32, max_width: Option<f32>) -> Size {
        FONT_SYSTEM.with_borrow_mut(|font_system| {
            let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT_FACTOR);
            let mut buffer = Buffer::new(font_system, metrics);

            buffer.set_size(font_system, max_width, None);
            buffer.set_text(
                font_system,
                text,
                &Attrs::new().family(Family::SansSerif),
                Shaping::Advanced,
                None,
            );
            buffer.shape_until_scroll(font_system, true);

            let mut width = 0.0f32;
            let mut height = 0.0f32;
            for run in buffer.layout_runs() {
                width = width.max(run.line_w);
                height += run.line_height;
            }

            // Empty text still occupies a line
            if height == 0.0 {
                height = font_size * LINE_HEIGHT_FACTOR;
            }

            Size::new(width, height)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_single_line() {
        let mut m = MonospaceMeasurer { advance: 0.5 };
        let size = m.measure("Given a user", 10.0, None);
        assert_eq!(size.width, 12.0 * 5.0);
        assert_eq!(size.height, m.line_height(10.0));
    }

    #[test]
    fn test_monospace_wraps_words() {
        let mut m = MonospaceMeasurer { advance: 0.5 };
        // Each word is 5 chars = 25 px, a space is 5 px.
        let size = m.measure("aaaaa bbbbb ccccc", 10.0, Some(60.0));
        assert_eq!(size.height, 2.0 * m.line_height(10.0));
        assert_eq!(size.width, 55.0);
    }

    #[test]
    fn test_monospace_empty_text_has_one_line() {
        let mut m = MonospaceMeasurer::default();
        let line = m.line_height(10.0);
        assert_eq!(m.measure("", 10.0, Some(100.0)).height, line);
    }

    #[test]
    fn test_explicit_newlines_count() {
        let mut m = MonospaceMeasurer::default();
        let line = m.line_height(10.0);
        assert_eq!(m.measure("a\nb\nc", 10.0, None).height, 3.0 * line);
    }
}
