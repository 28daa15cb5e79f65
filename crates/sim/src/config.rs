//! Tuning constants for the kinematic model.
//!
//! Velocities and accelerations are in abstract per-tick units tied to the
//! configured tick rate. Changing the tick rate changes how the game feels
//! unless these values are rescaled with it.

use crate::vec2::Vec2;

/// Gravitational acceleration added to velocity every tick.
pub const GRAVITY: Vec2 = Vec2::new(0.0, 0.2);

/// Linear horizontal drag subtracted every tick while moving.
pub const DRAG: f64 = 0.2;

/// Horizontal speed set while a direction is held.
pub const MOVE_SPEED: f64 = 3.0;

/// Jump strength per millisecond of hold.
pub const JUMP_STRENGTH_PER_MS: f64 = 0.06;

/// Weakest jump impulse.
pub const JUMP_STRENGTH_MIN: f64 = 3.0;

/// Strongest jump impulse.
pub const JUMP_STRENGTH_MAX: f64 = 8.0;

/// Minimum elapsed time between two honored jumps.
pub const JUMP_COOLDOWN_MS: u64 = 100;

/// Number of recent ticks considered when deciding whether the player is grounded.
pub const GROUNDED_HISTORY_CAPACITY: usize = 5;

/// Half extents of the camera dead zone.
pub const CAMERA_DEADZONE: Vec2 = Vec2::new(100.0, 50.0);

/// How horizontal drag behaves near zero velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    /// Drag never carries velocity past zero.
    #[default]
    ClampToZero,
    /// Drag is subtracted unconditionally; residual velocities smaller than
    /// the drag flip sign and oscillate around zero.
    Overshoot,
}

impl DragMode {
    /// Stable numeric code used in tuning parameter tables.
    pub fn code(self) -> u8 {
        match self {
            Self::ClampToZero => 0,
            Self::Overshoot => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ClampToZero),
            1 => Some(Self::Overshoot),
            _ => None,
        }
    }
}

/// Physics and control tuning for one world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    pub drag: f64,
    pub drag_mode: DragMode,
    pub move_speed: f64,
    pub jump_strength_per_ms: f64,
    pub jump_strength_min: f64,
    pub jump_strength_max: f64,
    pub jump_cooldown_ms: u64,
    pub grounded_history_capacity: usize,
    pub camera_deadzone: Vec2,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            drag: DRAG,
            drag_mode: DragMode::default(),
            move_speed: MOVE_SPEED,
            jump_strength_per_ms: JUMP_STRENGTH_PER_MS,
            jump_strength_min: JUMP_STRENGTH_MIN,
            jump_strength_max: JUMP_STRENGTH_MAX,
            jump_cooldown_ms: JUMP_COOLDOWN_MS,
            grounded_history_capacity: GROUNDED_HISTORY_CAPACITY,
            camera_deadzone: CAMERA_DEADZONE,
        }
    }
}

impl PhysicsConfig {
    /// Flatten into `(key, value)` pairs sorted by key.
    pub fn tuning_parameters(&self) -> Vec<(&'static str, f64)> {
        let mut params = vec![
            ("camera_deadzone_x", self.camera_deadzone.x),
            ("camera_deadzone_y", self.camera_deadzone.y),
            ("drag", self.drag),
            ("drag_mode", f64::from(self.drag_mode.code())),
            ("gravity_x", self.gravity.x),
            ("gravity_y", self.gravity.y),
            (
                "grounded_history_capacity",
                self.grounded_history_capacity as f64,
            ),
            ("jump_cooldown_ms", self.jump_cooldown_ms as f64),
            ("jump_strength_max", self.jump_strength_max),
            ("jump_strength_min", self.jump_strength_min),
            ("jump_strength_per_ms", self.jump_strength_per_ms),
            ("move_speed", self.move_speed),
        ];
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }

    /// Rebuild a config from `(key, value)` pairs.
    ///
    /// Keys missing from `params` keep their default values; unknown keys
    /// and out-of-range codes are reported by name.
    pub fn from_tuning_parameters<'a, I>(params: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut config = Self::default();
        for (key, value) in params {
            match key {
                "camera_deadzone_x" => config.camera_deadzone.x = value,
                "camera_deadzone_y" => config.camera_deadzone.y = value,
                "drag" => config.drag = value,
                "drag_mode" => {
                    config.drag_mode = DragMode::from_code(value as u8)
                        .filter(|_| value.fract() == 0.0 && value >= 0.0)
                        .ok_or_else(|| format!("invalid drag_mode code {value}"))?;
                }
                "gravity_x" => config.gravity.x = value,
                "gravity_y" => config.gravity.y = value,
                "grounded_history_capacity" => {
                    config.grounded_history_capacity = value as usize;
                }
                "jump_cooldown_ms" => config.jump_cooldown_ms = value as u64,
                "jump_strength_max" => config.jump_strength_max = value,
                "jump_strength_min" => config.jump_strength_min = value,
                "jump_strength_per_ms" => config.jump_strength_per_ms = value,
                "move_speed" => config.move_speed = value,
                other => return Err(format!("unknown tuning parameter {other:?}")),
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, Vec2::new(0.0, 0.2));
        assert_eq!(config.drag, 0.2);
        assert_eq!(config.move_speed, 3.0);
        assert_eq!(config.jump_cooldown_ms, 100);
        assert_eq!(config.grounded_history_capacity, 5);
        assert_eq!(config.drag_mode, DragMode::ClampToZero);
    }

    #[test]
    fn test_tuning_parameters_sorted_by_key() {
        let params = PhysicsConfig::default().tuning_parameters();
        assert!(params.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_tuning_parameters_rebuild_config() {
        let config = PhysicsConfig {
            drag_mode: DragMode::Overshoot,
            jump_cooldown_ms: 250,
            grounded_history_capacity: 3,
            gravity: Vec2::new(0.0, 0.35),
            ..Default::default()
        };
        let params = config.tuning_parameters();
        let rebuilt = PhysicsConfig::from_tuning_parameters(params).unwrap();
        assert_eq!(rebuilt, config);
    }

    #[test]
    fn test_unknown_tuning_parameter_rejected() {
        let result = PhysicsConfig::from_tuning_parameters([("moon_gravity", 1.0)]);
        assert!(result.unwrap_err().contains("moon_gravity"));
    }

    #[test]
    fn test_bad_drag_mode_code_rejected() {
        assert!(PhysicsConfig::from_tuning_parameters([("drag_mode", 7.0)]).is_err());
        assert!(PhysicsConfig::from_tuning_parameters([("drag_mode", 0.5)]).is_err());
    }
}
