use super::Animatable;
use crate::geometry::Point;

/// Distance below which the rendered position snaps onto its target.
pub const SNAP_DISTANCE: f32 = 0.1;

/// Eases the on-screen position toward the position chosen by layout.
///
/// `real` is written by layout every frame; `render` is what gets painted
/// and hit-tested by the "render" family of queries.
#[derive(Debug, Clone)]
pub struct MoveAnimation {
    real: Point,
    render: Point,
    speed: f32,
}

impl MoveAnimation {
    pub fn new(speed: f32) -> Self {
        Self {
            real: Point::default(),
            render: Point::default(),
            speed: speed.clamp(0.0, 1.0),
        }
    }

    pub fn real(&self) -> Point {
        self.real
    }

    pub fn render(&self) -> Point {
        self.render
    }

    pub fn set_real(&mut self, x: f32, y: f32) {
        self.real = Point::new(x, y);
    }

    pub fn set_render(&mut self, x: f32, y: f32) {
        self.render = Point::new(x, y);
    }

    /// Skip the interpolation and show the node where layout put it.
    pub fn jump_to_real(&mut self) {
        self.render = self.real;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(0.0, 1.0);
    }

    pub fn is_moving(&self) -> bool {
        (self.real.x - self.render.x).abs() > SNAP_DISTANCE
            || (self.real.y - self.render.y).abs() > SNAP_DISTANCE
    }

    /// Advance one tick. Returns whether the node is still in motion.
    pub fn update(&mut self) -> bool {
        if !self.is_moving() {
            self.render = self.real;
            return false;
        }
        self.render = Point::lerp(&self.render, &self.real, self.speed);
        if !self.is_moving() {
            self.render = self.real;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_and_snaps() {
        let mut m = MoveAnimation::new(0.2);
        m.set_real(100.0, 50.0);
        let mut ticks = 0;
        while m.update() {
            ticks += 1;
            assert!(ticks < 1000, "movement never settled");
        }
        assert_eq!(m.render(), m.real());
    }

    #[test]
    fn test_idle_update_is_idempotent() {
        let mut m = MoveAnimation::new(0.2);
        m.set_real(12.5, 7.25);
        m.jump_to_real();
        for _ in 0..10 {
            assert!(!m.update());
            assert_eq!(m.render(), Point::new(12.5, 7.25));
            assert_eq!(m.real(), Point::new(12.5, 7.25));
        }
    }

    #[test]
    fn test_first_step_closes_fraction_of_distance() {
        let mut m = MoveAnimation::new(0.2);
        m.set_real(0.0, 100.0);
        m.update();
        assert!((m.render().y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_within_snap_distance_is_not_moving() {
        let mut m = MoveAnimation::new(0.2);
        m.set_real(0.05, 0.0);
        assert!(!m.is_moving());
        m.update();
        assert_eq!(m.render().x, 0.05);
    }
}
