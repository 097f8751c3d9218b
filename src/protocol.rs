//! Input and output records exchanged with the collaborators around the core.
//!
//! ## Directions
//!
//! | Record          | Direction            | Producer / consumer      |
//! |-----------------|----------------------|--------------------------|
//! | `TickIntent`    | input → session      | input source, one/tick   |
//! | `FrameSnapshot` | session → renderer   | renderer, debug overlay  |
//! | `RoomLoaded` …  | session → listeners  | runner output channel    |
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Intents are a snapshot of what is held this tick, never raw key codes.
//! 3. Every outbound event is wrapped in a [`FrameEvent`] carrying `frame`
//!    and `session`.

use crate::locomotion::MotionState;
use crate::types::{Direction, Vec3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent<T> {
    pub session: String,
    pub frame: u64,
    pub channel: String,
    pub payload: T,
}

impl<T> FrameEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, channel: &str, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            channel: channel.to_string(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Intents  (input source → session)
// ---------------------------------------------------------------------------

/// Per-tick snapshot of player intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    /// Grab when empty-handed, place when carrying.
    pub grab: bool,
    pub toggle_debug: bool,
    /// Debug only: directional intents pan the camera instead of moving.
    pub pan_camera: bool,
    /// Debug only: step to the next (+1) or previous (-1) room.
    pub room_step: i32,
}

impl TickIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(direction: Direction) -> Self {
        let mut intent = Self::default();
        match direction {
            Direction::Left => intent.left = true,
            Direction::Right => intent.right = true,
            Direction::Up => intent.up = true,
            Direction::Down => intent.down = true,
        }
        intent
    }
}

// ---------------------------------------------------------------------------
// Frame snapshot  (session → renderer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxView {
    /// Footprint corners in world space: left, bottom, right, top.
    pub world: [(f32, f32); 4],
    /// Same corners projected to screen space, camera applied.
    pub screen: [(f32, f32); 4],
    pub z: f32,
    pub top: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarView {
    pub position: Vec3,
    pub facing: Direction,
    pub motion: MotionState,
    pub touch_ground: bool,
    pub is_jumping: bool,
    pub grabbed: Option<usize>,
    pub bbox: BoxView,
    /// HUD readout: tile x, tile y, head height in tiles.
    pub tile: (i32, i32, i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: usize,
    pub name: String,
    pub position: Vec3,
    pub visible: bool,
    pub bbox: BoxView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub room: u16,
    pub camera: (f32, f32),
    pub debug: bool,
    pub avatar: AvatarView,
    pub entities: Vec<EntityView>,
}

// ---------------------------------------------------------------------------
// Events  (session → listeners)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLoaded {
    pub room: u16,
    /// md5 of the room's heightmap source.
    pub digest: String,
    pub width: usize,
    pub height: usize,
    pub entities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpTaken {
    pub from_room: u16,
    pub to_room: u16,
    pub tile_x: i32,
    pub tile_y: i32,
    pub landing: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLoadFailed {
    pub room: u16,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CarryEvent {
    Grabbed { entity: usize },
    Placed { entity: usize, position: Vec3 },
    /// Carried entity dropped because its room was unloaded.
    Released { entity: usize },
}

// ---------------------------------------------------------------------------
// Channel names
// ---------------------------------------------------------------------------

pub mod channels {
    pub const FRAME: &str = "frame";
    pub const ROOM_LOADED: &str = "room.loaded";
    pub const ROOM_LOAD_FAILED: &str = "room.load_failed";
    pub const WARP_TAKEN: &str = "warp.taken";
    pub const CARRY: &str = "entity.carry";
    pub const TOUCHING: &str = "entity.touching";
}
