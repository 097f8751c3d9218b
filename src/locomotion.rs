//! Terrain locomotion: gravity, the scripted jump and 4-directional steps
//! gated by heightmap walkability.

use crate::avatar::Avatar;
use crate::bbox::{Aabb, Collider};
use crate::collision::find_entity_top_below;
use crate::entity::{Entity, EntityId};
use crate::heightmap::TerrainSource;
use crate::types::{last_tile, Direction, SimConfig, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Grounded,
    Falling,
    Jumping,
}

/// Held-direction priority: Left > Right > Up > Down.
pub fn pick_direction(left: bool, right: bool, up: bool, down: bool) -> Option<Direction> {
    if left {
        Some(Direction::Left)
    } else if right {
        Some(Direction::Right)
    } else if up {
        Some(Direction::Up)
    } else if down {
        Some(Direction::Down)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Terrain sampling
// ---------------------------------------------------------------------------

/// Highest ground (world pixels) under the four footprint corners, or `None`
/// when any corner falls outside the heightmap.
pub fn ground_under(footprint: &Aabb, terrain: &impl TerrainSource, tile_size: f32) -> Option<f32> {
    let x0 = (footprint.x / tile_size).floor() as i32;
    let y0 = (footprint.y / tile_size).floor() as i32;
    let x1 = last_tile(footprint.x + footprint.width, tile_size);
    let y1 = last_tile(footprint.y + footprint.height, tile_size);

    [(x0, y0), (x1, y0), (x0, y1), (x1, y1)]
        .into_iter()
        .map(|(x, y)| terrain.ground_height(x, y, tile_size))
        .try_fold(f32::MIN, |acc, g| g.map(|g| acc.max(g)))
}

/// Z the body at `footprint`/`z` would come to rest on, if it is airborne.
fn fall_floor(
    footprint: &Aabb,
    z: f32,
    terrain: &impl TerrainSource,
    entities: &[Entity],
    exclude: &[EntityId],
    tile_size: f32,
) -> Option<f32> {
    // Out-of-range corners count as support.
    let ground = ground_under(footprint, terrain, tile_size)?;
    if ground >= z {
        return None;
    }
    let pool = entities.iter().filter(|e| !exclude.contains(&e.id));
    match find_entity_top_below(pool, footprint, z, None) {
        Some(top) if top >= z => None,
        Some(top) => Some(top.max(ground)),
        None => Some(ground),
    }
}

// ---------------------------------------------------------------------------
// Vertical motion
// ---------------------------------------------------------------------------

/// Arm a jump. Only possible from the ground.
pub fn start_jump(avatar: &mut Avatar) -> bool {
    if !avatar.touch_ground || avatar.jump.is_jumping {
        return false;
    }
    avatar.jump.is_jumping = true;
    avatar.jump.progress = 0.0;
    avatar.touch_ground = false;
    true
}

/// One tick of jump rise or gravity.
///
/// Gravity samples the ground at the avatar's feet; the avatar descends by
/// `fall_speed` while every footprint corner is strictly below it and no
/// entity top supports it.
pub fn apply_vertical(
    avatar: &mut Avatar,
    terrain: &impl TerrainSource,
    entities: &[Entity],
    exclude: Option<EntityId>,
    config: &SimConfig,
) -> MotionState {
    let mut pos = avatar.position();

    if avatar.jump.is_jumping {
        let rise = config
            .jump_step
            .min(config.jump_height - avatar.jump.progress);
        pos.z += rise;
        avatar.jump.progress += rise;
        if avatar.jump.progress >= config.jump_height {
            avatar.jump.is_jumping = false;
            avatar.jump.progress = 0.0;
        }
        avatar.set_position(pos);
        avatar.touch_ground = false;
        return MotionState::Jumping;
    }

    let footprint = avatar.bounding_box(config.geometry()).footprint;
    let skip: Vec<EntityId> = exclude.into_iter().collect();
    match fall_floor(&footprint, pos.z, terrain, entities, &skip, config.tile_size) {
        None => {
            avatar.touch_ground = true;
            MotionState::Grounded
        }
        Some(floor) => {
            pos.z = (pos.z - config.fall_speed).max(floor);
            avatar.set_position(pos);
            avatar.touch_ground = false;
            MotionState::Falling
        }
    }
}

/// Gravity for a free entity; returns the new position if it moved.
pub fn entity_fall(
    entities: &[Entity],
    index: usize,
    terrain: &impl TerrainSource,
    exclude: Option<EntityId>,
    config: &SimConfig,
) -> Option<Vec3> {
    let entity = entities.get(index)?;
    if !entity.flags.gravity {
        return None;
    }
    let mut skip = vec![entity.id];
    skip.extend(exclude);
    let mut pos = entity.position();
    let floor = fall_floor(
        &entity.bbox().footprint,
        pos.z,
        terrain,
        entities,
        &skip,
        config.tile_size,
    )?;
    pos.z = (pos.z - config.fall_speed).max(floor);
    Some(pos)
}

// ---------------------------------------------------------------------------
// Planar steps
// ---------------------------------------------------------------------------

/// Tentative position one step in `direction`, or `None` when the terrain
/// under the avatar's leading edge refuses it.
///
/// Each leading-edge cell must exist, be walkable, and have ground no higher
/// than [`Avatar::gating_height`].
pub fn step(
    avatar: &Avatar,
    direction: Direction,
    terrain: &impl TerrainSource,
    config: &SimConfig,
) -> Option<Vec3> {
    let t = config.tile_size;
    let (dx, dy) = direction.delta();
    let mut target = avatar.position();
    target.x += dx as f32 * config.walk_speed;
    target.y += dy as f32 * config.walk_speed;

    let fp = avatar
        .bounding_box_at(target.x, target.y, config.geometry())
        .footprint;
    let col0 = (fp.x / t).floor() as i32;
    let col1 = last_tile(fp.x + fp.width, t);
    let row0 = (fp.y / t).floor() as i32;
    let row1 = last_tile(fp.y + fp.height, t);

    let edge: [(i32, i32); 2] = match direction {
        Direction::Left => [(col0, row0), (col0, row1)],
        Direction::Right => [(col1, row0), (col1, row1)],
        Direction::Up => [(col0, row0), (col1, row0)],
        Direction::Down => [(col0, row1), (col1, row1)],
    };

    let limit = avatar.gating_height(t);
    let clear = edge.iter().all(|&(x, y)| {
        terrain
            .cell(x, y)
            .is_some_and(|c| c.is_walkable() && c.height as f32 * t <= limit)
    });
    clear.then_some(target)
}
