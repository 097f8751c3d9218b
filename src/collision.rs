//! Collision engine: 3D AABB tests between a mover and room entities,
//! push-out resolution, support and pickup queries.
//!
//! Only solid, visible entities take part in movement collision. Every query
//! accepts an `exclude` id so the entity currently carried by the avatar is
//! ignored.

use crate::bbox::{self, Aabb, Aabb3, Collider};
use crate::entity::{Entity, EntityId};
use crate::heightmap::TerrainSource;
use crate::types::{Geometry, TileCoord, Vec3};

/// Open-interval overlap on all three axes. Shared faces do not collide.
pub fn intersects_3d(a: &Aabb3, b: &Aabb3) -> bool {
    a.footprint.overlaps(&b.footprint) && a.z_overlaps(b)
}

fn obstacles<'a>(
    entities: &'a [Entity],
    exclude: Option<EntityId>,
) -> impl Iterator<Item = &'a Entity> + 'a {
    entities
        .iter()
        .filter(move |e| e.is_obstacle() && Some(e.id) != exclude)
}

// ---------------------------------------------------------------------------
// Movement resolution
// ---------------------------------------------------------------------------

/// Outcome of [`resolve_move`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Mover footprint after all push-outs.
    pub footprint: Aabb,
    /// Entities that displaced the mover, in resolution order.
    pub touched: Vec<EntityId>,
    /// Entities the mover overlapped from above and was allowed across.
    pub passed_over: Vec<EntityId>,
}

impl Resolution {
    /// Planar displacement applied relative to the proposed footprint.
    pub fn shift_from(&self, proposed: &Aabb) -> (f32, f32) {
        (self.footprint.x - proposed.x, self.footprint.y - proposed.y)
    }
}

/// Push the mover's proposed box out of every entity it would penetrate.
///
/// Entities are handled one after another in list order; each push-out is
/// taken along the axis of least penetration and snaps the mover flush
/// against the entity's near edge. Later entities see the already adjusted
/// box.
pub fn resolve_move(mover: Aabb3, entities: &[Entity], exclude: Option<EntityId>) -> Resolution {
    let mut current = mover;
    let mut touched = Vec::new();
    let mut passed_over = Vec::new();

    for entity in obstacles(entities, exclude) {
        let target = entity.bbox();
        if !current.footprint.overlaps(&target.footprint) {
            continue;
        }
        if current.z >= target.top() {
            passed_over.push(entity.id);
            continue;
        }
        if !current.z_overlaps(target) {
            continue;
        }

        let m = current.footprint;
        let e = target.footprint;
        let (mcx, mcy) = m.center();
        let (ecx, ecy) = e.center();
        let dx = mcx - ecx;
        let dy = mcy - ecy;
        let overlap_x = (m.width + e.width) / 2.0 - dx.abs();
        let overlap_y = (m.height + e.height) / 2.0 - dy.abs();

        let (nx, ny) = if overlap_x < overlap_y {
            if dx > 0.0 {
                (e.x + e.width, m.y)
            } else {
                (e.x - m.width, m.y)
            }
        } else if dy > 0.0 {
            (m.x, e.y + e.height)
        } else {
            (m.x, e.y - m.height)
        };

        current = current.moved_to(nx, ny);
        touched.push(entity.id);
    }

    Resolution {
        footprint: current.footprint,
        touched,
        passed_over,
    }
}

/// Cheap veto: `true` when nothing blocks the mover's box. Feet at or above
/// an entity's top never intersect it, so walking across its top is allowed.
pub fn can_move_to(mover: &Aabb3, entities: &[Entity], exclude: Option<EntityId>) -> bool {
    !obstacles(entities, exclude).any(|e| intersects_3d(mover, e.bbox()))
}

// ---------------------------------------------------------------------------
// Contact queries
// ---------------------------------------------------------------------------

/// Entities in contact with the mover's current box.
///
/// The probe is inflated by `tolerance` on all three axes, not just Z: an
/// entity flush against the mover's side is reported as well as one flush
/// above or below it.
pub fn get_touching(
    mover: &Aabb3,
    entities: &[Entity],
    exclude: Option<EntityId>,
    tolerance: f32,
) -> Vec<EntityId> {
    let probe = mover.inflate(tolerance);
    entities
        .iter()
        .filter(|e| e.flags.visible && Some(e.id) != exclude)
        .filter(|e| intersects_3d(&probe, e.bbox()))
        .map(|e| e.id)
        .collect()
}

/// Highest entity top at or below `z_ceiling` under the footprint.
pub fn find_entity_top_below<'a>(
    entities: impl IntoIterator<Item = &'a Entity>,
    footprint: &Aabb,
    z_ceiling: f32,
    exclude: Option<EntityId>,
) -> Option<f32> {
    entities
        .into_iter()
        .filter(|e| e.is_obstacle() && Some(e.id) != exclude)
        .filter(|e| e.top() <= z_ceiling && footprint.overlaps(&e.bbox().footprint))
        .map(Entity::top)
        .max_by(f32::total_cmp)
}

/// Nearest liftable entity within `max_distance` (XY, centre to centre).
/// Equal distances keep the first entity in list order.
pub fn find_pickup_target(
    avatar: &impl Collider,
    entities: &[Entity],
    max_distance: f32,
    geometry: Geometry,
) -> Option<EntityId> {
    let own = avatar.bounding_box(geometry);
    let (ax, ay) = own.footprint.center();

    let mut best: Option<(EntityId, f32)> = None;
    for e in entities {
        if e.flags.no_pickup || !e.flags.visible || !e.flags.solid {
            continue;
        }
        if (own.z - e.position().z).abs() > geometry.tile_size {
            continue;
        }
        let (ex, ey) = e.bbox().footprint.center();
        let distance = ((ax - ex).powi(2) + (ay - ey).powi(2)).sqrt();
        if distance > max_distance {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((e.id, distance));
        }
    }
    best.map(|(id, _)| id)
}

/// Whether `entity` may be set down at `position`: on a walkable in-bounds
/// cell, exactly at ground height, and clear of every other obstacle.
pub fn can_place(
    entity: &Entity,
    position: Vec3,
    others: &[Entity],
    terrain: &impl TerrainSource,
    geometry: Geometry,
) -> bool {
    let tile = TileCoord::containing(position.x, position.y, geometry.tile_size);
    let Some(cell) = terrain.cell_at(tile) else {
        return false;
    };
    if !cell.is_walkable() {
        return false;
    }
    if position.z != cell.height as f32 * geometry.tile_size {
        return false;
    }
    let placed = bbox::compute(
        position,
        entity.height_tiles(),
        geometry.tile_size,
        geometry.margin,
    );
    !obstacles(others, Some(entity.id)).any(|o| intersects_3d(&placed, o.bbox()))
}
