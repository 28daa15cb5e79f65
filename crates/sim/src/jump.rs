//! Jump charge and cooldown.
//!
//! Holding the jump key longer produces a stronger impulse, clamped to a
//! fixed range. A jump is honored only while grounded and once the cooldown
//! since the previous honored jump has elapsed.

use crate::config::PhysicsConfig;

/// A request to jump after holding the key for `hold_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpRequest {
    pub hold_ms: u64,
}

/// Map hold duration to impulse strength: `clamp(k * hold_ms, min, max)`.
pub fn jump_strength(hold_ms: u64, config: &PhysicsConfig) -> f64 {
    (config.jump_strength_per_ms * hold_ms as f64)
        .max(config.jump_strength_min)
        .min(config.jump_strength_max)
}

/// Timestamp of the last honored jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JumpTimer {
    last_jump_ms: Option<u64>,
}

impl JumpTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_jump_ms(&self) -> Option<u64> {
        self.last_jump_ms
    }

    /// Whether the cooldown has elapsed at `now_ms`. Always true before the
    /// first jump.
    pub fn cooled_down(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_jump_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= cooldown_ms)
    }

    /// Try to honor `request` at `now_ms`.
    ///
    /// Returns the impulse strength when honored, recording `now_ms` as the
    /// last jump. Rejected requests leave the timer untouched.
    pub fn try_jump(
        &mut self,
        request: JumpRequest,
        now_ms: u64,
        grounded: bool,
        config: &PhysicsConfig,
    ) -> Option<f64> {
        if !grounded || !self.cooled_down(now_ms, config.jump_cooldown_ms) {
            return None;
        }
        self.last_jump_ms = Some(now_ms);
        Some(jump_strength(request.hold_ms, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_clamped() {
        let config = PhysicsConfig::default();
        assert_eq!(jump_strength(0, &config), 3.0);
        assert_eq!(jump_strength(10, &config), 3.0);
        assert_eq!(jump_strength(100, &config), 0.06 * 100.0);
        assert_eq!(jump_strength(1000, &config), 8.0);
    }

    #[test]
    fn test_strength_monotonic() {
        let config = PhysicsConfig::default();
        let mut previous = 0.0;
        for hold in (0..400).step_by(7) {
            let s = jump_strength(hold, &config);
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn test_second_jump_inside_cooldown_rejected() {
        let config = PhysicsConfig::default();
        let mut timer = JumpTimer::new();
        let request = JumpRequest { hold_ms: 0 };

        assert_eq!(timer.try_jump(request, 0, true, &config), Some(3.0));
        assert_eq!(timer.try_jump(request, 50, true, &config), None);
        assert_eq!(timer.last_jump_ms(), Some(0));

        assert_eq!(timer.try_jump(request, 100, true, &config), Some(3.0));
        assert_eq!(timer.last_jump_ms(), Some(100));
    }

    #[test]
    fn test_airborne_jump_rejected() {
        let config = PhysicsConfig::default();
        let mut timer = JumpTimer::new();
        assert_eq!(
            timer.try_jump(JumpRequest { hold_ms: 80 }, 500, false, &config),
            None
        );
        assert_eq!(timer.last_jump_ms(), None);
    }
}
