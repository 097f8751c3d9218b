//! The player-controlled avatar: position, facing, jump and grab state.

use crate::bbox::Collider;
use crate::entity::EntityId;
use crate::types::{Direction, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JumpState {
    pub is_jumping: bool,
    /// Height gained so far in the current jump.
    pub progress: f32,
}

/// Exactly one per session; survives room transitions.
#[derive(Debug, Clone)]
pub struct Avatar {
    position: Vec3,
    height_tiles: u32,
    pub facing: Direction,
    pub touch_ground: bool,
    pub jump: JumpState,
    grabbed: Option<EntityId>,
}

impl Avatar {
    pub fn new(position: Vec3, height_tiles: u32) -> Self {
        Self {
            position,
            height_tiles,
            facing: Direction::Down,
            touch_ground: false,
            jump: JumpState::default(),
            grabbed: None,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Height used for terrain gating: the top of the avatar, not its feet.
    pub fn gating_height(&self, tile_size: f32) -> f32 {
        self.position.z + self.height_tiles as f32 * tile_size
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbed.is_some()
    }

    pub fn grabbed(&self) -> Option<EntityId> {
        self.grabbed
    }

    pub fn grab(&mut self, id: EntityId) {
        self.grabbed = Some(id);
    }

    pub fn release(&mut self) -> Option<EntityId> {
        self.grabbed.take()
    }

    /// Where a carried entity sits: directly on top of the avatar.
    pub fn carry_position(&self, tile_size: f32) -> Vec3 {
        Vec3::new(
            self.position.x,
            self.position.y,
            self.gating_height(tile_size),
        )
    }

    /// Facing follows the highest-priority held direction.
    pub fn face(&mut self, direction: Option<Direction>) {
        if let Some(d) = direction {
            self.facing = d;
        }
    }
}

impl Collider for Avatar {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn height_tiles(&self) -> u32 {
        self.height_tiles
    }
}
