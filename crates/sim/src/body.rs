//! Kinematic body integration.

use crate::config::{DragMode, PhysicsConfig};
use crate::vec2::Vec2;

/// Position and velocity of a moving entity.
///
/// Created on spawn and mutated once per tick. There is no mass: velocity
/// and acceleration are per-tick quantities.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl KinematicBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// One explicit Euler step: gravity, then horizontal drag, then
    /// position += velocity. Not sub-stepped.
    pub fn integrate(&mut self, config: &PhysicsConfig) {
        self.velocity += config.gravity;
        self.velocity.x = apply_drag(self.velocity.x, config.drag, config.drag_mode);
        self.position += self.velocity;
    }
}

/// Linear drag opposing horizontal motion.
fn apply_drag(vx: f64, drag: f64, mode: DragMode) -> f64 {
    if vx == 0.0 {
        return vx;
    }
    let dragged = vx - drag * vx.signum();
    match mode {
        DragMode::Overshoot => dragged,
        DragMode::ClampToZero if dragged.signum() != vx.signum() => 0.0,
        DragMode::ClampToZero => dragged,
    }
}
