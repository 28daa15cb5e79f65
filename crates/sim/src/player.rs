//! The player: kinematic body, collision, grounded debouncing, jumping and
//! the Standing / Walking / Jumping state machine.

use std::sync::Arc;

use crate::animation::{AnimationPlayer, AnimationSet};
use crate::body::KinematicBody;
use crate::collision::{Contacts, resolve_collisions};
use crate::config::PhysicsConfig;
use crate::grounded::GroundedHistory;
use crate::jump::{JumpRequest, JumpTimer};
use crate::rect::Rect;
use crate::vec2::Vec2;

/// Player movement state. Initial value is `Standing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Standing,
    Walking,
    Jumping,
}

impl PlayerState {
    pub fn code(self) -> u8 {
        match self {
            Self::Standing => 0,
            Self::Walking => 1,
            Self::Jumping => 2,
        }
    }
}

/// Horizontal facing, also used as the horizontal move intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Per-tick control for the player, already reduced from raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub movement: Option<Facing>,
    pub jump: Option<JumpRequest>,
}

/// What happened to the player during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerTick {
    pub contacts: Contacts,
    pub jumped: bool,
    pub previous_state: PlayerState,
}

/// The player entity.
#[derive(Debug, Clone)]
pub struct Player {
    body: KinematicBody,
    size: Vec2,
    state: PlayerState,
    facing: Facing,
    grounded: GroundedHistory,
    jump_timer: JumpTimer,
    animations: Arc<AnimationSet>,
    animation: AnimationPlayer,
}

impl Player {
    /// Spawn with `position` as the center of a `size` bounding box.
    pub fn new(
        position: Vec2,
        size: Vec2,
        animations: Arc<AnimationSet>,
        config: &PhysicsConfig,
    ) -> Self {
        let state = PlayerState::default();
        let animation = AnimationPlayer::new(animations.for_state(state));
        Self {
            body: KinematicBody::new(position),
            size,
            state,
            facing: Facing::default(),
            grounded: GroundedHistory::new(config.grounded_history_capacity),
            jump_timer: JumpTimer::new(),
            animations,
            animation,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded.is_grounded()
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::from_center(self.body.position, self.size)
    }

    /// Tile index of the current animation frame.
    pub fn current_frame(&self) -> u32 {
        self.animation.current_tile()
    }

    /// Advance the player by one tick.
    ///
    /// Order: movement, jump, integration, collision, grounded history,
    /// state transitions, animation. `controls` is ignored when
    /// `suppressed`; physics still runs.
    pub fn tick<'a, I>(
        &mut self,
        controls: Controls,
        suppressed: bool,
        now_ms: u64,
        obstacles: I,
        config: &PhysicsConfig,
        elapsed_ms: f64,
    ) -> PlayerTick
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        let previous_state = self.state;
        let (movement, jump) = if suppressed {
            (None, None)
        } else {
            (controls.movement, controls.jump)
        };

        if let Some(direction) = movement {
            self.body.velocity.x = direction.sign() * config.move_speed;
            self.facing = direction;
        }

        // Eligibility uses the history as of the end of the previous tick.
        let jumped = match jump {
            Some(request) => {
                let grounded = self.grounded.is_grounded();
                match self.jump_timer.try_jump(request, now_ms, grounded, config) {
                    Some(strength) => {
                        self.body.velocity.y -= strength;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };

        self.body.integrate(config);

        let tentative = self.bounding_rect();
        let mut rect = tentative;
        let contacts = resolve_collisions(&mut rect, &mut self.body.velocity, obstacles);
        // Write back only snapped axes so untouched coordinates do not pick
        // up rounding from the center/corner round trip.
        if rect.x != tentative.x {
            self.body.position.x = rect.center().x;
        }
        if rect.y != tentative.y {
            self.body.position.y = rect.center().y;
        }
        self.grounded.push(contacts.ground);

        self.state = next_state(
            self.state,
            contacts.ground,
            self.grounded.is_grounded(),
            movement.is_some(),
            jumped,
        );

        if self.state != previous_state {
            self.animation.play(self.animations.for_state(self.state));
        }
        self.animation.advance(elapsed_ms);

        PlayerTick {
            contacts,
            jumped,
            previous_state,
        }
    }
}

/// State transition for one tick, applied in a fixed order where later
/// rules override earlier ones.
fn next_state(
    current: PlayerState,
    touched_ground: bool,
    grounded: bool,
    moving: bool,
    jumped: bool,
) -> PlayerState {
    let mut state = current;
    if touched_ground {
        state = PlayerState::Standing;
    } else if !grounded {
        state = PlayerState::Jumping;
    }
    if moving && state != PlayerState::Jumping {
        state = PlayerState::Walking;
    }
    if jumped {
        state = PlayerState::Jumping;
    }
    state
}
