//! Key state tracking between frames.
//!
//! - Held directions: right wins when both are down
//! - Jump: a request on release carrying the hold duration, and a repeating
//!   request every tick once the hold reaches `hold_repeat_ms`
//! - Action: an edge, consumed once

use platformer_sim::{Facing, JumpRequest};

use crate::validation::{InputEvent, Key, KeyEdge};

/// Keyboard state as seen by the frame loop.
#[derive(Debug, Clone)]
pub struct InputState {
    hold_repeat_ms: u64,
    left: bool,
    right: bool,
    jump: bool,
    action: bool,
    /// Timestamp of the most recently accepted event.
    last_timestamp_ms: Option<u64>,
    /// When the jump key went down.
    jump_down_at: Option<u64>,
    /// Hold duration of a jump released since the last tick.
    released_jump: Option<JumpRequest>,
    /// Action pressed since the last tick.
    action_pressed: bool,
}

impl InputState {
    pub fn new(hold_repeat_ms: u64) -> Self {
        Self {
            hold_repeat_ms,
            left: false,
            right: false,
            jump: false,
            action: false,
            last_timestamp_ms: None,
            jump_down_at: None,
            released_jump: None,
            action_pressed: false,
        }
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.last_timestamp_ms
    }

    pub fn is_down(&self, key: Key) -> bool {
        match key {
            Key::Left => self.left,
            Key::Right => self.right,
            Key::Jump => self.jump,
            Key::Action => self.action,
        }
    }

    /// Apply an already validated event.
    pub(crate) fn apply(&mut self, event: &InputEvent) {
        let down = event.edge == KeyEdge::Down;
        match event.key {
            Key::Left => self.left = down,
            Key::Right => self.right = down,
            Key::Jump => {
                self.jump = down;
                if down {
                    self.jump_down_at = Some(event.timestamp_ms);
                } else if let Some(start) = self.jump_down_at.take() {
                    self.released_jump = Some(JumpRequest {
                        hold_ms: event.timestamp_ms.saturating_sub(start),
                    });
                }
            }
            Key::Action => {
                self.action = down;
                if down {
                    self.action_pressed = true;
                }
            }
        }
        self.last_timestamp_ms = Some(event.timestamp_ms);
    }

    /// Horizontal intent for this tick.
    pub fn movement(&self) -> Option<Facing> {
        if self.right {
            Some(Facing::Right)
        } else if self.left {
            Some(Facing::Left)
        } else {
            None
        }
    }

    /// Jump request for this tick, if any. A pending release wins over the
    /// held repeat.
    pub fn take_jump(&mut self, now_ms: u64) -> Option<JumpRequest> {
        if let Some(request) = self.released_jump.take() {
            return Some(request);
        }
        let start = self.jump_down_at?;
        let hold_ms = now_ms.saturating_sub(start);
        (hold_ms >= self.hold_repeat_ms).then_some(JumpRequest { hold_ms })
    }

    /// Whether Action went down since the last call.
    pub fn take_action(&mut self) -> bool {
        std::mem::take(&mut self.action_pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(key: Key, edge: KeyEdge, timestamp_ms: u64) -> InputEvent {
        InputEvent {
            key,
            edge,
            timestamp_ms,
        }
    }

    #[test]
    fn test_right_wins_over_left() {
        let mut state = InputState::new(100);
        state.apply(&event(Key::Left, KeyEdge::Down, 0));
        assert_eq!(state.movement(), Some(Facing::Left));

        state.apply(&event(Key::Right, KeyEdge::Down, 5));
        assert_eq!(state.movement(), Some(Facing::Right));

        state.apply(&event(Key::Right, KeyEdge::Up, 10));
        assert_eq!(state.movement(), Some(Facing::Left));
    }

    #[test]
    fn test_jump_release_carries_hold_duration() {
        let mut state = InputState::new(100);
        state.apply(&event(Key::Jump, KeyEdge::Down, 1000));
        state.apply(&event(Key::Jump, KeyEdge::Up, 1060));

        assert_eq!(state.take_jump(1070), Some(JumpRequest { hold_ms: 60 }));
        assert_eq!(state.take_jump(1080), None, "release is consumed once");
    }

    #[test]
    fn test_held_jump_repeats_after_threshold() {
        let mut state = InputState::new(100);
        state.apply(&event(Key::Jump, KeyEdge::Down, 1000));

        assert_eq!(state.take_jump(1050), None);
        assert_eq!(state.take_jump(1100), Some(JumpRequest { hold_ms: 100 }));
        assert_eq!(state.take_jump(1117), Some(JumpRequest { hold_ms: 117 }));
    }

    #[test]
    fn test_action_is_an_edge() {
        let mut state = InputState::new(100);
        assert!(!state.take_action());

        state.apply(&event(Key::Action, KeyEdge::Down, 0));
        assert!(state.take_action());
        assert!(!state.take_action(), "holding does not repeat");
        assert!(state.is_down(Key::Action));
    }

    #[test]
    fn test_last_timestamp_tracks_accepted_events() {
        let mut state = InputState::new(100);
        assert_eq!(state.last_timestamp_ms(), None);
        state.apply(&event(Key::Left, KeyEdge::Down, 42));
        assert_eq!(state.last_timestamp_ms(), Some(42));
    }
}
