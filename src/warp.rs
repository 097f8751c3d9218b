//! Warp engine: bidirectional trigger zones linking two rooms.
//!
//! Warp anchors are authored in a tile space shifted from the heightmap's by
//! a fixed number of tiles (`SimConfig::warp_tile_shift`); both the zone test
//! and the landing tile subtract that shift.

use crate::types::{TileCoord, Vec3};
use serde::{Deserialize, Serialize};

/// Room identifier as used by room data and warp records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u16);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Warp as described by room data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpRecord {
    pub room1: u16,
    pub room2: u16,
    pub x: i32,
    pub y: i32,
    pub x2: i32,
    pub y2: i32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "type", default)]
    pub warp_type: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warp {
    pub room_a: RoomId,
    pub room_b: RoomId,
    /// Anchor on the `room_a` side, warp tile space.
    pub anchor_a: TileCoord,
    /// Anchor on the `room_b` side, warp tile space.
    pub anchor_b: TileCoord,
    pub width: i32,
    pub height: i32,
    pub warp_type: u32,
}

impl From<&WarpRecord> for Warp {
    fn from(r: &WarpRecord) -> Self {
        Self {
            room_a: RoomId(r.room1),
            room_b: RoomId(r.room2),
            anchor_a: TileCoord::new(r.x, r.y),
            anchor_b: TileCoord::new(r.x2, r.y2),
            width: r.width,
            height: r.height,
            warp_type: r.warp_type,
        }
    }
}

/// Where a warp sends the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpDestination {
    pub room: RoomId,
    /// Landing tile in the destination heightmap's space.
    pub tile: TileCoord,
}

impl Warp {
    /// Anchor belonging to `room`; the `room_b` side for any room that is not `room_a`.
    pub fn anchor_for(&self, room: RoomId) -> TileCoord {
        if room == self.room_a {
            self.anchor_a
        } else {
            self.anchor_b
        }
    }

    pub fn target_room(&self, current: RoomId) -> RoomId {
        if current == self.room_a {
            self.room_b
        } else {
            self.room_a
        }
    }

    /// Half-open `[anchor, anchor + extent)` test in heightmap tile space.
    pub fn contains(&self, tile: TileCoord, current: RoomId, shift: i32) -> bool {
        let anchor = self.anchor_for(current);
        let (x0, y0) = (anchor.x - shift, anchor.y - shift);
        tile.x >= x0 && tile.x < x0 + self.width && tile.y >= y0 && tile.y < y0 + self.height
    }
}

/// First warp (in list order) whose zone on the `current` side contains the
/// tile under `position`.
pub fn check<'a>(
    position: Vec3,
    warps: &'a [Warp],
    current: RoomId,
    tile_size: f32,
    shift: i32,
) -> Option<&'a Warp> {
    let tile = TileCoord::containing(position.x, position.y, tile_size);
    warps.iter().find(|w| w.contains(tile, current, shift))
}

/// Destination room and the other side's anchor, shifted into heightmap space.
pub fn resolve(warp: &Warp, current: RoomId, shift: i32) -> WarpDestination {
    let room = warp.target_room(current);
    let anchor = warp.anchor_for(room);
    WarpDestination {
        room,
        tile: TileCoord::new(anchor.x - shift, anchor.y - shift),
    }
}
