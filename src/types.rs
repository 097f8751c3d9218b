//! Core world types shared across all modules.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// Continuous world-space position in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Tile space
// ---------------------------------------------------------------------------

/// Integer heightmap cell coordinate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing the world-space point `(x, y)`.
    pub fn containing(x: f32, y: f32, tile_size: f32) -> Self {
        Self::new(
            (x / tile_size).floor() as i32,
            (y / tile_size).floor() as i32,
        )
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Index of the last tile touched by a half-open span ending at `max_edge`.
pub(crate) fn last_tile(max_edge: f32, tile_size: f32) -> i32 {
    (max_edge / tile_size).ceil() as i32 - 1
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step in world space (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Tile size and footprint margin, shared by every bounding box in a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub tile_size: f32,
    pub margin: f32,
}

impl Geometry {
    pub fn new(tile_size: f32, margin: f32) -> Self {
        Self { tile_size, margin }
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub room: u16,
    pub total_ticks: u64,
    pub warps_taken: u64,
    pub room_loads: u64,
    pub entities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Pixels per tile edge.
    pub tile_size: f32,
    /// Inward footprint margin applied to every side of a bounding box.
    pub margin: f32,
    pub avatar_height_tiles: u32,
    pub entity_height_tiles: u32,
    /// Planar distance covered per tick.
    pub walk_speed: f32,
    /// Vertical distance dropped per tick while falling.
    pub fall_speed: f32,
    /// Vertical distance gained per tick while jumping.
    pub jump_step: f32,
    /// Total rise of one jump.
    pub jump_height: f32,
    /// Maximum XY centre distance for a pickup.
    pub pickup_reach: f32,
    /// Slack added around the avatar box for touch detection.
    pub touch_tolerance: f32,
    /// Tiles subtracted from warp anchors to reach heightmap space.
    pub warp_tile_shift: i32,
    pub camera_pan_speed: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

/// Environment prefix for `SimConfig` overrides (`ISO_WORLD_WALK_SPEED=2`).
pub const ENV_PREFIX: &str = "ISO_WORLD";

impl SimConfig {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.tile_size, self.margin)
    }

    /// Layer the optional config file under `ISO_WORLD_<KEY>` environment
    /// overrides. Missing keys keep their defaults; unknown keys are ignored.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 16.0,
            margin: 2.0,
            avatar_height_tiles: 2,
            entity_height_tiles: 1,
            walk_speed: 1.0,
            fall_speed: 1.0,
            jump_step: 2.0,
            jump_height: 24.0,
            pickup_reach: 24.0,
            touch_tolerance: 1.0,
            warp_tile_shift: 12,
            camera_pan_speed: 5.0,
            viewport_width: 448.0,
            viewport_height: 320.0,
        }
    }
}
