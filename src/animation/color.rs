use super::Animatable;
use crate::geometry::Color;

/// Fixed-step fade between two colors.
///
/// Progress is counted in whole ticks so that a fade at `speed` lands
/// exactly on the destination after `ceil(1 / speed)` updates.
#[derive(Debug, Clone)]
pub struct ColorAnimation {
    from: Color,
    dest: Color,
    current: Color,
    speed: f32,
    ticks: u32,
    total_ticks: u32,
    fading: bool,
    just_became_visible: bool,
    pending_visible: bool,
}

impl ColorAnimation {
    pub fn new(color: Color) -> Self {
        Self {
            from: color,
            dest: color,
            current: color,
            speed: 0.0,
            ticks: 0,
            total_ticks: 0,
            fading: false,
            just_became_visible: false,
            pending_visible: false,
        }
    }

    pub fn current(&self) -> Color {
        self.current
    }

    pub fn dest(&self) -> Color {
        self.dest
    }

    pub fn alpha(&self) -> f32 {
        self.current.a
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn is_visible(&self) -> bool {
        self.current.a > 0.0
    }

    /// True for the single tick in which alpha went from zero to positive.
    pub fn just_became_visible(&self) -> bool {
        self.just_became_visible
    }

    /// Fade toward `dest`. A non-positive speed applies the color at once.
    pub fn set_color(&mut self, dest: Color, speed: f32) {
        if speed <= 0.0 {
            let was_visible = self.is_visible();
            self.from = dest;
            self.dest = dest;
            self.current = dest;
            self.fading = false;
            if !was_visible && self.is_visible() {
                self.pending_visible = true;
            }
            return;
        }
        self.from = self.current;
        self.dest = dest;
        self.speed = speed.min(1.0);
        self.ticks = 0;
        self.total_ticks = (1.0 / self.speed).ceil() as u32;
        self.fading = self.from != self.dest;
    }

    pub fn set_alpha(&mut self, alpha: f32, speed: f32) {
        let dest = self.dest.with_alpha(alpha.clamp(0.0, 1.0));
        self.set_color(dest, speed);
    }

    /// Advance one tick. Returns whether the fade is still running.
    pub fn update(&mut self) -> bool {
        let was_visible = self.is_visible();
        self.just_became_visible = std::mem::take(&mut self.pending_visible);
        if self.fading {
            self.ticks += 1;
            if self.ticks >= self.total_ticks {
                self.current = self.dest;
                self.fading = false;
            } else {
                let t = self.ticks as f32 * self.speed;
                self.current = Color::lerp(&self.from, &self.dest, t);
            }
        }
        if !was_visible && self.is_visible() {
            self.just_became_visible = true;
        }
        self.fading
    }
}
