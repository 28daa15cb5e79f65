//! Game configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! reference tuning.

use std::fs;
use std::path::Path;

use log::LevelFilter;
use platformer_sim::{DragMode, PhysicsConfig, Vec2, config as sim};
use serde::Deserialize;
use thiserror::Error;

/// Default tick rate in Hz.
pub const TICK_RATE_HZ: u32 = 60;

/// Held-jump repeat threshold in milliseconds.
pub const HOLD_REPEAT_MS: u64 = 100;

/// Distance from the player center within which an NPC can be talked to.
pub const INTERACT_RADIUS: f64 = 48.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub tick_rate_hz: u32,
    /// Stop after this many ticks; unlimited when absent.
    pub max_ticks: Option<u64>,
    pub physics: PhysicsSection,
    pub input: InputSection,
    pub camera: CameraSection,
    pub dialogue: DialogueSection,
    pub log: LogSection,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            max_ticks: None,
            physics: PhysicsSection::default(),
            input: InputSection::default(),
            camera: CameraSection::default(),
            dialogue: DialogueSection::default(),
            log: LogSection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragModeSetting {
    #[default]
    Clamp,
    Overshoot,
}

impl From<DragModeSetting> for DragMode {
    fn from(setting: DragModeSetting) -> Self {
        match setting {
            DragModeSetting::Clamp => DragMode::ClampToZero,
            DragModeSetting::Overshoot => DragMode::Overshoot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsSection {
    pub gravity: [f64; 2],
    pub drag: f64,
    pub drag_mode: DragModeSetting,
    pub move_speed: f64,
    pub jump_strength_per_ms: f64,
    pub jump_strength_min: f64,
    pub jump_strength_max: f64,
    pub jump_cooldown_ms: u64,
    pub grounded_history_capacity: usize,
}

impl Default for PhysicsSection {
    fn default() -> Self {
        Self {
            gravity: sim::GRAVITY.into(),
            drag: sim::DRAG,
            drag_mode: DragModeSetting::default(),
            move_speed: sim::MOVE_SPEED,
            jump_strength_per_ms: sim::JUMP_STRENGTH_PER_MS,
            jump_strength_min: sim::JUMP_STRENGTH_MIN,
            jump_strength_max: sim::JUMP_STRENGTH_MAX,
            jump_cooldown_ms: sim::JUMP_COOLDOWN_MS,
            grounded_history_capacity: sim::GROUNDED_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    pub hold_repeat_ms: u64,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            hold_repeat_ms: HOLD_REPEAT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub deadzone: [f64; 2],
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            deadzone: sim::CAMERA_DEADZONE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DialogueSection {
    pub interact_radius: f64,
}

impl Default for DialogueSection {
    fn default() -> Self {
        Self {
            interact_radius: INTERACT_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// One of off, error, warn, info, debug, trace.
    pub level: String,
    pub file: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "log/platformer.log".to_string(),
        }
    }
}

impl GameConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.tick_rate_hz == 0 {
            return invalid("tick_rate_hz must be positive".into());
        }

        let p = &self.physics;
        if p.grounded_history_capacity == 0 {
            return invalid("physics.grounded_history_capacity must be positive".into());
        }
        for (name, value) in [
            ("physics.gravity[0]", p.gravity[0]),
            ("physics.gravity[1]", p.gravity[1]),
            ("physics.drag", p.drag),
            ("physics.move_speed", p.move_speed),
            ("physics.jump_strength_per_ms", p.jump_strength_per_ms),
            ("physics.jump_strength_min", p.jump_strength_min),
            ("physics.jump_strength_max", p.jump_strength_max),
            ("camera.deadzone[0]", self.camera.deadzone[0]),
            ("camera.deadzone[1]", self.camera.deadzone[1]),
            ("dialogue.interact_radius", self.dialogue.interact_radius),
        ] {
            if !value.is_finite() {
                return invalid(format!("{name} must be finite"));
            }
        }
        for (name, value) in [
            ("physics.drag", p.drag),
            ("physics.move_speed", p.move_speed),
            ("physics.jump_strength_per_ms", p.jump_strength_per_ms),
            ("physics.jump_strength_min", p.jump_strength_min),
            ("camera.deadzone[0]", self.camera.deadzone[0]),
            ("camera.deadzone[1]", self.camera.deadzone[1]),
            ("dialogue.interact_radius", self.dialogue.interact_radius),
        ] {
            if value < 0.0 {
                return invalid(format!("{name} must not be negative"));
            }
        }
        if p.jump_strength_min > p.jump_strength_max {
            return invalid(format!(
                "physics.jump_strength_min ({}) exceeds jump_strength_max ({})",
                p.jump_strength_min, p.jump_strength_max
            ));
        }

        self.log_level()?;
        Ok(())
    }

    /// Physics tuning for the core.
    pub fn physics_config(&self) -> PhysicsConfig {
        let p = &self.physics;
        PhysicsConfig {
            gravity: Vec2::from(p.gravity),
            drag: p.drag,
            drag_mode: p.drag_mode.into(),
            move_speed: p.move_speed,
            jump_strength_per_ms: p.jump_strength_per_ms,
            jump_strength_min: p.jump_strength_min,
            jump_strength_max: p.jump_strength_max,
            jump_cooldown_ms: p.jump_cooldown_ms,
            grounded_history_capacity: p.grounded_history_capacity,
            camera_deadzone: Vec2::from(self.camera.deadzone),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.log
            .level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level {:?}", self.log.level)))
    }
}
