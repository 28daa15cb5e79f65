//! Platformer Simulation Core
//!
//! This crate contains the fixed-timestep platformer simulation: player
//! kinematics, block collision resolution, grounded debouncing, jump
//! charge/cooldown and the player state machine.
//!
//! # Architecture Constraints
//!
//! The Simulation Core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time (timestamps arrive inside [`StepInput`])
//! - Hold process-wide mutable state
//! - Depend on frame rate or variable delta time
//!
//! Level loading, input polling, dialogue and rendering live outside this
//! crate and talk to it through [`World`], [`StepInput`] and [`Snapshot`].
//!
//! # Tick order
//!
//! Each [`World::advance`] runs, in order: movement, jump, gravity/drag
//! integration, collision against collidable blocks in insertion order,
//! grounded history, player state transitions, animation, camera.

#![deny(unsafe_code)]

pub mod animation;
pub mod body;
pub mod camera;
pub mod collision;
pub mod config;
pub mod entity;
pub mod grounded;
pub mod jump;
pub mod player;
pub mod rect;
pub mod vec2;

use std::sync::Arc;

pub use animation::{Animation, AnimationPlayer, AnimationSet, Frame};
pub use body::KinematicBody;
pub use camera::Camera;
pub use collision::{Contacts, Side};
pub use config::{DragMode, PhysicsConfig};
pub use entity::{Block, EntityId, EntityKind, EntitySnapshot, Npc};
pub use grounded::GroundedHistory;
pub use jump::{JumpRequest, JumpTimer};
pub use player::{Controls, Facing, Player, PlayerState};
pub use rect::Rect;
pub use vec2::Vec2;

// ============================================================================
// Type Aliases
// ============================================================================

/// A single discrete simulation timestep; the atomic unit of game time.
pub type Tick = u64;

// ============================================================================
// Core Types
// ============================================================================

/// Everything the core consumes for one tick.
///
/// Built by the edge from drained input events. `now_ms` is a monotonic
/// timestamp used for the jump cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInput {
    pub now_ms: u64,
    /// Held horizontal direction, if any.
    pub movement: Option<Facing>,
    pub jump: Option<JumpRequest>,
    /// Set while another component (dialogue) owns input. Movement and jump
    /// are ignored; gravity and collision keep running.
    pub suppressed: bool,
}

impl StepInput {
    fn controls(&self) -> Controls {
        Controls {
            movement: self.movement,
            jump: self.jump,
        }
    }
}

/// Player placement and shared visuals for a new world.
#[derive(Debug, Clone)]
pub struct PlayerSpawn {
    /// Center of the player's bounding box.
    pub position: Vec2,
    pub size: Vec2,
    pub animations: Arc<AnimationSet>,
}

impl PlayerSpawn {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            animations: Arc::new(AnimationSet::default()),
        }
    }
}

/// World state at a tick, as seen by the renderer.
///
/// entities MUST be sorted by entity_id ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: Tick,
    pub camera: Vec2,
    pub player_state: PlayerState,
    pub grounded: bool,
    pub entities: Vec<EntitySnapshot>,
    pub digest: u64,
}

impl Snapshot {
    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.kind == EntityKind::Player)
    }
}

// ============================================================================
// StateDigest Implementation
// ============================================================================

/// StateDigest algorithm identifier.
pub const STATE_DIGEST_ALGO_ID: &str = "statedigest-v1-fnv1a64-le-f64canon-player-posvel-state";

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn update_f64(&mut self, value: f64) {
        self.update(&canonicalize_f64(value).to_le_bytes());
    }

    fn finish(self) -> u64 {
        self.state
    }
}

/// Canonicalize an f64 value for deterministic hashing.
///
/// - `-0.0` → `+0.0`
/// - Any NaN → quiet NaN bit pattern `0x7ff8000000000000`
pub fn canonicalize_f64(value: f64) -> u64 {
    const QUIET_NAN_BITS: u64 = 0x7ff8000000000000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0u64
    } else {
        value.to_bits()
    }
}

// ============================================================================
// World Implementation
// ============================================================================

/// The authoritative simulation state container.
///
/// Owns the player, the level's blocks and NPCs, and the camera. Only the
/// frame loop mutates it, once per tick, through [`World::advance`].
#[derive(Debug, Clone)]
pub struct World {
    /// Current simulation tick
    tick: Tick,
    /// Configured tick rate (Hz)
    tick_rate_hz: u32,
    /// Milliseconds per tick, used to advance animations
    frame_ms: f64,
    config: PhysicsConfig,
    player_id: EntityId,
    player: Player,
    /// Blocks in insertion order; collidable ones are resolved in this order
    blocks: Vec<(EntityId, Block)>,
    npcs: Vec<(EntityId, Npc)>,
    camera: Camera,
    /// Next entity ID to assign (deterministic allocation)
    next_entity_id: EntityId,
}

impl World {
    /// Create a world at tick 0 with the player spawned as entity 1.
    ///
    /// # Panics
    /// If `tick_rate_hz` is zero or the grounded history capacity is zero.
    pub fn new(tick_rate_hz: u32, config: PhysicsConfig, spawn: PlayerSpawn) -> Self {
        assert!(tick_rate_hz > 0, "tick_rate_hz must be positive");

        let player = Player::new(spawn.position, spawn.size, spawn.animations, &config);
        Self {
            tick: 0,
            tick_rate_hz,
            frame_ms: 1000.0 / f64::from(tick_rate_hz),
            camera: Camera::new(spawn.position, config.camera_deadzone),
            config,
            player_id: 1,
            player,
            blocks: Vec::new(),
            npcs: Vec::new(),
            next_entity_id: 2,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Add a block. Collidable blocks are resolved in the order they are
    /// added.
    pub fn add_block(&mut self, block: Block) -> EntityId {
        let id = self.allocate_id();
        self.blocks.push((id, block));
        id
    }

    pub fn add_npc(&mut self, npc: Npc) -> EntityId {
        let id = self.allocate_id();
        self.npcs.push((id, npc));
        id
    }

    /// Get the current simulation tick.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Get the configured tick rate in Hz.
    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn player_id(&self) -> EntityId {
        self.player_id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Collidable block rects in resolution order.
    pub fn obstacles(&self) -> impl Iterator<Item = &Rect> {
        self.blocks
            .iter()
            .filter(|(_, b)| b.collidable)
            .map(|(_, b)| &b.rect)
    }

    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.iter().find(|(nid, _)| *nid == id).map(|(_, n)| n)
    }

    /// Nearest NPC whose center is within `radius` of the player's center.
    /// Equal distances resolve to the lower entity id.
    pub fn npc_in_reach(&self, radius: f64) -> Option<(EntityId, &Npc)> {
        let origin = self.player.position();
        self.npcs
            .iter()
            .map(|(id, npc)| (*id, npc, npc.position.distance(origin)))
            .filter(|(_, _, d)| *d <= radius)
            .min_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)))
            .map(|(id, npc, _)| (id, npc))
    }

    /// Get the current world state.
    ///
    /// Postcondition: snapshot().tick == world.tick()
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            camera: self.camera.position(),
            player_state: self.player.state(),
            grounded: self.player.is_grounded(),
            entities: self.sorted_entity_snapshots(),
            digest: self.state_digest(),
        }
    }

    /// Advance simulation from tick T to T+1.
    ///
    /// # Arguments
    /// * `tick` - The pre-step tick (MUST equal self.tick())
    /// * `input` - This tick's reduced input
    ///
    /// # Returns
    /// Snapshot with snapshot.tick = tick + 1 (post-step tick)
    ///
    /// # Panics
    /// If `tick != self.tick()` (precondition violation)
    pub fn advance(&mut self, tick: Tick, input: &StepInput) -> Snapshot {
        assert_eq!(
            tick, self.tick,
            "advance() tick mismatch: expected {}, got {}",
            self.tick, tick
        );

        let obstacles = self
            .blocks
            .iter()
            .filter(|(_, b)| b.collidable)
            .map(|(_, b)| &b.rect);
        self.player.tick(
            input.controls(),
            input.suppressed,
            input.now_ms,
            obstacles,
            &self.config,
            self.frame_ms,
        );

        for (_, npc) in &mut self.npcs {
            npc.advance(self.frame_ms);
        }

        self.camera.follow(self.player.position());

        self.tick += 1;

        self.snapshot()
    }

    /// Compute the StateDigest for the current world state.
    ///
    /// Algorithm: FNV-1a 64-bit, little-endian, canonicalized f64, over
    /// tick, player entity id, position, velocity, state and facing. Blocks
    /// and NPCs are static and not hashed.
    pub fn state_digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();

        hasher.update(&self.tick.to_le_bytes());
        hasher.update(&self.player_id.to_le_bytes());

        let position = self.player.position();
        let velocity = self.player.velocity();
        hasher.update_f64(position.x);
        hasher.update_f64(position.y);
        hasher.update_f64(velocity.x);
        hasher.update_f64(velocity.y);

        hasher.update(&[self.player.state().code(), self.player.facing().code()]);

        hasher.finish()
    }

    // ========================================================================
    // Internal Methods
    // ========================================================================

    /// Entity views sorted by entity_id ascending. The player is always 1
    /// and later ids are allocated monotonically across blocks and NPCs.
    fn sorted_entity_snapshots(&self) -> Vec<EntitySnapshot> {
        let mut entities = Vec::with_capacity(1 + self.blocks.len() + self.npcs.len());

        entities.push(EntitySnapshot {
            entity_id: self.player_id,
            kind: EntityKind::Player,
            position: self.player.position(),
            velocity: self.player.velocity(),
            frame: self.player.current_frame(),
            facing: self.player.facing(),
            bounds: self.player.bounding_rect(),
        });

        entities.extend(self.blocks.iter().map(|(id, block)| EntitySnapshot {
            entity_id: *id,
            kind: EntityKind::Block,
            position: block.rect.center(),
            velocity: Vec2::ZERO,
            frame: block.tile_idx,
            facing: Facing::default(),
            bounds: block.rect,
        }));

        entities.extend(self.npcs.iter().map(|(id, npc)| EntitySnapshot {
            entity_id: *id,
            kind: EntityKind::Npc,
            position: npc.position,
            velocity: Vec2::ZERO,
            frame: npc.current_frame(),
            facing: Facing::default(),
            bounds: npc.bounding_rect(),
        }));

        entities.sort_by_key(|e| e.entity_id);
        entities
    }
}

// ============================================================================
// Tests
// ============================================================================
