//! Platformer Wire Types
//!
//! This crate defines the Protobuf message types used to persist a play
//! session: the level's collidable geometry, the per-tick step inputs the
//! core consumed, and the replay artifact that bundles them. Both the game
//! edge and the replay verifier MUST depend on this crate so they agree on
//! one schema.
//!
//! Messages are declared with `prost` derives; there is no `.proto` build
//! step.

#![deny(unsafe_code)]

use platformer_sim::{Facing, JumpRequest, Rect, StepInput, Vec2};
use prost::Message;

// ============================================================================
// Type Aliases (matching simulation crate)
// ============================================================================

/// Tick type alias for wire protocol.
pub type Tick = u64;

/// Movement code for "no direction held".
pub const MOVEMENT_NONE: u32 = 0;
pub const MOVEMENT_LEFT: u32 = 1;
pub const MOVEMENT_RIGHT: u32 = 2;

// ============================================================================
// Level Geometry
// ============================================================================

/// Axis-aligned rectangle: top-left corner and size.
#[derive(Clone, PartialEq, Message)]
pub struct RectProto {
    #[prost(double, tag = "1")]
    pub x: f64,

    #[prost(double, tag = "2")]
    pub y: f64,

    #[prost(double, tag = "3")]
    pub w: f64,

    #[prost(double, tag = "4")]
    pub h: f64,
}

// ============================================================================
// Step Inputs
// ============================================================================

/// One tick's reduced input as applied by the core.
#[derive(Clone, PartialEq, Message)]
pub struct StepInputProto {
    /// Pre-step tick this input was applied at.
    #[prost(uint64, tag = "1")]
    pub tick: Tick,

    /// Monotonic timestamp in milliseconds.
    #[prost(uint64, tag = "2")]
    pub now_ms: u64,

    /// One of `MOVEMENT_NONE`, `MOVEMENT_LEFT`, `MOVEMENT_RIGHT`.
    #[prost(uint32, tag = "3")]
    pub movement: u32,

    /// Hold duration of a jump request; absent when no jump was requested.
    #[prost(uint64, optional, tag = "4")]
    pub jump_hold_ms: Option<u64>,

    /// True while dialogue owned input.
    #[prost(bool, tag = "5")]
    pub suppressed: bool,
}

// ============================================================================
// Replay Artifact Types
// ============================================================================

/// Tuning parameter key-value pair.
#[derive(Clone, PartialEq, Message)]
pub struct TuningParameter {
    #[prost(string, tag = "1")]
    pub key: String,

    #[prost(double, tag = "2")]
    pub value: f64,
}

/// Complete replay artifact.
#[derive(Clone, PartialEq, Message)]
pub struct ReplayArtifact {
    /// Schema version (starts at 1).
    #[prost(uint32, tag = "1")]
    pub replay_format_version: u32,

    /// Simulation tick rate.
    #[prost(uint32, tag = "2")]
    pub tick_rate_hz: u32,

    /// StateDigest algorithm identifier.
    #[prost(string, tag = "3")]
    pub state_digest_algo_id: String,

    /// Physics tuning (sorted by key).
    #[prost(message, repeated, tag = "4")]
    pub tuning_parameters: Vec<TuningParameter>,

    /// Lowercase hex SHA-256 over `obstacles`.
    #[prost(string, tag = "5")]
    pub level_fingerprint: String,

    /// Collidable blocks in resolution order.
    #[prost(message, repeated, tag = "6")]
    pub obstacles: Vec<RectProto>,

    /// Player spawn center [x, y].
    #[prost(double, repeated, tag = "7")]
    pub player_spawn: Vec<f64>,

    /// Player bounding box size [w, h].
    #[prost(double, repeated, tag = "8")]
    pub player_size: Vec<f64>,

    #[prost(uint64, tag = "9")]
    pub initial_tick: Tick,

    /// StateDigest before the first recorded input.
    #[prost(uint64, tag = "10")]
    pub initial_digest: u64,

    /// Applied input stream, one per tick.
    #[prost(message, repeated, tag = "11")]
    pub inputs: Vec<StepInputProto>,

    /// StateDigest at checkpoint_tick.
    #[prost(uint64, tag = "12")]
    pub final_digest: u64,

    /// Post-step tick for verification anchor.
    #[prost(uint64, tag = "13")]
    pub checkpoint_tick: Tick,

    /// Session termination reason.
    #[prost(string, tag = "14")]
    pub end_reason: String,
}

// ============================================================================
// Conversion Traits
// ============================================================================

impl From<Rect> for RectProto {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            w: r.w,
            h: r.h,
        }
    }
}

impl TryFrom<RectProto> for Rect {
    type Error = &'static str;

    fn try_from(r: RectProto) -> Result<Self, Self::Error> {
        if !(r.x.is_finite() && r.y.is_finite() && r.w.is_finite() && r.h.is_finite()) {
            return Err("rect fields must be finite");
        }
        if r.w < 0.0 || r.h < 0.0 {
            return Err("rect size must be non-negative");
        }
        Ok(Rect::new(r.x, r.y, r.w, r.h))
    }
}

impl From<(Tick, StepInput)> for StepInputProto {
    fn from((tick, input): (Tick, StepInput)) -> Self {
        Self {
            tick,
            now_ms: input.now_ms,
            movement: match input.movement {
                None => MOVEMENT_NONE,
                Some(Facing::Left) => MOVEMENT_LEFT,
                Some(Facing::Right) => MOVEMENT_RIGHT,
            },
            jump_hold_ms: input.jump.map(|j| j.hold_ms),
            suppressed: input.suppressed,
        }
    }
}

impl TryFrom<StepInputProto> for (Tick, StepInput) {
    type Error = &'static str;

    fn try_from(p: StepInputProto) -> Result<Self, Self::Error> {
        let movement = match p.movement {
            MOVEMENT_NONE => None,
            MOVEMENT_LEFT => Some(Facing::Left),
            MOVEMENT_RIGHT => Some(Facing::Right),
            _ => return Err("unknown movement code"),
        };
        Ok((
            p.tick,
            StepInput {
                now_ms: p.now_ms,
                movement,
                jump: p.jump_hold_ms.map(|hold_ms| JumpRequest { hold_ms }),
                suppressed: p.suppressed,
            },
        ))
    }
}

/// Decode a `[x, y]` pair.
pub fn vec2_from_wire(values: &[f64]) -> Result<Vec2, &'static str> {
    match values {
        [x, y] => Ok(Vec2::new(*x, *y)),
        _ => Err("vector must have exactly 2 elements"),
    }
}

pub fn vec2_to_wire(v: Vec2) -> Vec<f64> {
    vec![v.x, v.y]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_input_conversion_preserves_jump_absence() {
        let input = StepInput {
            now_ms: 1234,
            movement: Some(Facing::Left),
            jump: None,
            suppressed: true,
        };
        let proto = StepInputProto::from((7, input));
        assert_eq!(proto.movement, MOVEMENT_LEFT);
        assert_eq!(proto.jump_hold_ms, None);

        let decoded = StepInputProto::decode(proto.encode_to_vec().as_slice()).unwrap();
        let (tick, back): (Tick, StepInput) = decoded.try_into().unwrap();
        assert_eq!(tick, 7);
        assert_eq!(back, input);
    }

    #[test]
    fn test_zero_hold_jump_distinct_from_no_jump() {
        let input = StepInput {
            now_ms: 0,
            movement: None,
            jump: Some(JumpRequest { hold_ms: 0 }),
            suppressed: false,
        };
        let decoded =
            StepInputProto::decode(StepInputProto::from((0, input)).encode_to_vec().as_slice())
                .unwrap();
        assert_eq!(decoded.jump_hold_ms, Some(0));
    }

    #[test]
    fn test_unknown_movement_code_rejected() {
        let proto = StepInputProto {
            tick: 0,
            now_ms: 0,
            movement: 9,
            jump_hold_ms: None,
            suppressed: false,
        };
        let result: Result<(Tick, StepInput), _> = proto.try_into();
        assert_eq!(result, Err("unknown movement code"));
    }

    #[test]
    fn test_rect_rejects_bad_fields() {
        let negative = RectProto {
            x: 0.0,
            y: 0.0,
            w: -1.0,
            h: 4.0,
        };
        assert!(Rect::try_from(negative).is_err());

        let nan = RectProto {
            x: f64::NAN,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        };
        assert!(Rect::try_from(nan).is_err());
    }

    #[test]
    fn test_vec2_wire_length_checked() {
        assert_eq!(vec2_from_wire(&[1.0, 2.0]), Ok(Vec2::new(1.0, 2.0)));
        assert!(vec2_from_wire(&[1.0]).is_err());
        assert_eq!(vec2_to_wire(Vec2::new(3.0, 4.0)), vec![3.0, 4.0]);
    }

    #[test]
    fn test_replay_artifact_roundtrip() {
        let msg = ReplayArtifact {
            replay_format_version: 1,
            tick_rate_hz: 60,
            state_digest_algo_id: platformer_sim::STATE_DIGEST_ALGO_ID.to_string(),
            tuning_parameters: vec![TuningParameter {
                key: "move_speed".to_string(),
                value: 3.0,
            }],
            level_fingerprint: "ab".repeat(32),
            obstacles: vec![Rect::new(0.0, 100.0, 320.0, 32.0).into()],
            player_spawn: vec![16.0, 0.0],
            player_size: vec![32.0, 32.0],
            initial_tick: 0,
            initial_digest: 1,
            inputs: vec![StepInputProto::from((0, StepInput::default()))],
            final_digest: 0xfeedface,
            checkpoint_tick: 1,
            end_reason: "complete".to_string(),
        };
        let encoded = msg.encode_to_vec();
        let decoded = ReplayArtifact::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }
}
