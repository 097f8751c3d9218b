//! Isometric World Engine
//!
//! The spatial simulation core of a tile-based isometric action-adventure:
//! heightmap terrain, 3D bounding-box collision, gravity and jumps, carrying
//! objects, and warps between rooms.
//!
//! ## Architecture
//!
//! ```text
//! SimRunner  (runner.rs)                ← fixed-rate tick loop (server)
//!   └── GameSession  (session.rs)       ← tick pipeline, camera, room swap
//!         ├── Room  (room.rs)           ← heightmap + entities + warps
//!         │     └── RoomLoader          ← DirectoryLoader / StaticRooms
//!         ├── Avatar  (avatar.rs)
//!         ├── locomotion.rs             ← gravity, jump, planar steps
//!         ├── collision.rs              ← 3D AABB, push-out, pickup
//!         └── warp.rs                   ← zone test, destination
//! ```
//!
//! Per tick: gravity → planar movement → entity collision → warp check.

pub mod avatar;
pub mod bbox;
pub mod collision;
pub mod entity;
pub mod heightmap;
pub mod iso;
pub mod locomotion;
pub mod protocol;
pub mod room;
pub mod session;
pub mod types;
pub mod warp;

// The tick loop requires the `server` feature.
#[cfg(feature = "server")]
pub mod runner;

// Convenience re-exports
#[cfg(feature = "server")]
pub use runner::{RunnerConfig, SimRunner};
pub use avatar::Avatar;
pub use bbox::{Aabb, Aabb3, Collider};
pub use entity::{Entity, EntityId, EntityRecord};
pub use heightmap::{Heightmap, HeightmapCell, HeightmapError, TerrainSource};
pub use room::{DirectoryLoader, Room, RoomData, RoomLoadError, RoomLoader, StaticRooms};
pub use session::{GameSession, TickEvents};
pub use types::{Direction, Geometry, SessionStats, SimConfig, TileCoord, Vec3};
pub use warp::{RoomId, Warp, WarpRecord};
