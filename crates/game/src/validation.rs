//! Input event validation.
//!
//! - Timestamp before the last accepted event: DROP
//! - Timestamp after the current frame time: DROP
//! - Repeated edge (Down while down, Up while up): DROP
//!
//! Accepted events are applied to the [`InputState`].

use crate::input::InputState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// A raw key transition from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub key: Key,
    pub edge: KeyEdge,
    /// Monotonic milliseconds, same clock as the frame loop.
    pub timestamp_ms: u64,
}

/// Result of input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Event accepted and applied.
    Accepted,
    /// Dropped: older than the last accepted event.
    DroppedNonMonotonic { timestamp_ms: u64, last_ms: u64 },
    /// Dropped: stamped after the current frame time.
    DroppedFuture { timestamp_ms: u64, now_ms: u64 },
    /// Dropped: key already in that state.
    DroppedRepeatedEdge { key: Key, edge: KeyEdge },
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Validate an input event and apply it when accepted.
///
/// # Arguments
/// * `event` - The event to validate
/// * `now_ms` - Current frame time
/// * `state` - Key state; supplies the last accepted timestamp and held keys
pub fn validate_event(
    event: &InputEvent,
    now_ms: u64,
    state: &mut InputState,
) -> ValidationResult {
    if let Some(last_ms) = state.last_timestamp_ms()
        && event.timestamp_ms < last_ms
    {
        return ValidationResult::DroppedNonMonotonic {
            timestamp_ms: event.timestamp_ms,
            last_ms,
        };
    }

    if event.timestamp_ms > now_ms {
        return ValidationResult::DroppedFuture {
            timestamp_ms: event.timestamp_ms,
            now_ms,
        };
    }

    let down = event.edge == KeyEdge::Down;
    if state.is_down(event.key) == down {
        return ValidationResult::DroppedRepeatedEdge {
            key: event.key,
            edge: event.edge,
        };
    }

    state.apply(event);
    ValidationResult::Accepted
}
