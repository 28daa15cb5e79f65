//! Static level entities and the common per-entity view handed to the
//! renderer.

use std::sync::Arc;

use crate::animation::{Animation, AnimationPlayer};
use crate::player::Facing;
use crate::rect::Rect;
use crate::vec2::Vec2;

/// Unique identifier for an entity within a world. Assigned in spawn order.
pub type EntityId = u64;

/// Which kind of entity a view describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Block,
    Npc,
}

/// A level tile. Collidable blocks are the obstacle set; the rest are
/// scenery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub rect: Rect,
    pub tile_idx: u32,
    pub collidable: bool,
}

impl Block {
    pub fn solid(rect: Rect, tile_idx: u32) -> Self {
        Self {
            rect,
            tile_idx,
            collidable: true,
        }
    }

    pub fn scenery(rect: Rect, tile_idx: u32) -> Self {
        Self {
            rect,
            tile_idx,
            collidable: false,
        }
    }
}

/// A non-player character. Static, never collides; the player talks to it.
#[derive(Debug, Clone)]
pub struct Npc {
    pub position: Vec2,
    pub size: Vec2,
    pub tile_idx: u32,
    /// Key the dialogue collaborator uses to look up this NPC's script.
    pub dialogue_key: String,
    animation: Option<AnimationPlayer>,
}

impl Npc {
    pub fn new(position: Vec2, size: Vec2, tile_idx: u32, dialogue_key: impl Into<String>) -> Self {
        Self {
            position,
            size,
            tile_idx,
            dialogue_key: dialogue_key.into(),
            animation: None,
        }
    }

    pub fn with_animation(mut self, animation: Arc<Animation>) -> Self {
        self.animation = Some(AnimationPlayer::new(animation));
        self
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    pub fn current_frame(&self) -> u32 {
        self.animation
            .as_ref()
            .map_or(self.tile_idx, AnimationPlayer::current_tile)
    }

    pub(crate) fn advance(&mut self, elapsed_ms: f64) {
        if let Some(animation) = &mut self.animation {
            animation.advance(elapsed_ms);
        }
    }
}

/// Render-facing view of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    /// Center of the bounding rect.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Tile index selecting the visual.
    pub frame: u32,
    pub facing: Facing,
    pub bounds: Rect,
}
