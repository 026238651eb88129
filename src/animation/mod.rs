//! Per-node interpolation of position, size and color.
//!
//! Every node owns one [`Animator`]. The scene advances all of them once
//! per tick, before the render pass reads their state.

mod animatable;
mod color;
mod movement;
mod size;

pub use animatable::Animatable;
pub use color::ColorAnimation;
pub use movement::{MoveAnimation, SNAP_DISTANCE};
pub use size::SizeAnimation;

use serde::{Deserialize, Serialize};

use crate::geometry::Color;

pub const MOVE_SPEED: f32 = 0.2;
pub const RESIZE_SPEED: f32 = 20.0;

pub const FADE_SPEED_DRAG: f32 = 0.05;
pub const FADE_SPEED_ENTRANCE: f32 = 0.02;
pub const FADE_SPEED_FOLD: f32 = 0.05;
pub const FADE_SPEED_APPEAR: f32 = 0.05;
pub const FADE_SPEED_REENTRANCE: f32 = 0.05;

pub const FADE_ALPHA_DEFAULT: f32 = 0.8;
pub const FADE_ALPHA_DRAG: f32 = 0.5;
pub const BAR_TRANSPARENCY: f32 = 0.7;

/// Fade speeds and target alphas used by fold, drag and show/hide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSpeeds {
    pub drag: f32,
    pub entrance: f32,
    pub fold: f32,
    pub appear: f32,
    pub reentrance: f32,
    /// Alpha of a resting, unfolded bar.
    pub bar_alpha: f32,
    /// Alpha of a bar while it follows the pointer.
    pub drag_alpha: f32,
}

impl Default for FadeSpeeds {
    fn default() -> Self {
        Self {
            drag: FADE_SPEED_DRAG,
            entrance: FADE_SPEED_ENTRANCE,
            fold: FADE_SPEED_FOLD,
            appear: FADE_SPEED_APPEAR,
            reentrance: FADE_SPEED_REENTRANCE,
            bar_alpha: BAR_TRANSPARENCY,
            drag_alpha: FADE_ALPHA_DRAG,
        }
    }
}

/// Move, size and color state for one node.
#[derive(Debug, Clone)]
pub struct Animator {
    pub movement: MoveAnimation,
    pub size: SizeAnimation,
    pub color: ColorAnimation,
}

impl Animator {
    pub fn new(move_speed: f32, resize_speed: f32, color: Color) -> Self {
        Self {
            movement: MoveAnimation::new(move_speed),
            size: SizeAnimation::new(resize_speed),
            color: ColorAnimation::new(color),
        }
    }

    /// Advance one tick. With `retain_position` the move step is frozen so
    /// the pointer, not interpolation, decides where the node is drawn.
    pub fn update(&mut self, retain_position: bool) {
        if !retain_position {
            self.movement.update();
        }
        self.size.update();
        self.color.update();
    }

    pub fn is_animating(&self) -> bool {
        self.movement.is_moving() || self.size.is_resizing() || self.color.is_fading()
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(
            MOVE_SPEED,
            RESIZE_SPEED,
            Color::WHITE.with_alpha(FADE_ALPHA_DEFAULT),
        )
    }
}
