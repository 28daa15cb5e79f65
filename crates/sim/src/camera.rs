//! Dead-zone camera.

use crate::vec2::Vec2;

/// Camera that only moves once its target leaves a dead zone around the
/// camera position. The renderer draws world positions offset by
/// `-position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec2,
    deadzone: Vec2,
}

impl Camera {
    pub fn new(position: Vec2, deadzone: Vec2) -> Self {
        Self { position, deadzone }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Pull the camera so `target` sits on the edge of the dead zone when it
    /// has moved outside it.
    pub fn follow(&mut self, target: Vec2) {
        self.position.x = follow_axis(self.position.x, target.x, self.deadzone.x);
        self.position.y = follow_axis(self.position.y, target.y, self.deadzone.y);
    }
}

fn follow_axis(camera: f64, target: f64, half_extent: f64) -> f64 {
    if target > camera + half_extent {
        target - half_extent
    } else if target < camera - half_extent {
        target + half_extent
    } else {
        camera
    }
}
