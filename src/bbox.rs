//! Axis-aligned boxes: the XY footprint, its Z extent, and the `Collider`
//! trait shared by the avatar and entities.

use crate::types::{Geometry, Vec3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// XY footprint in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap: shared edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn moved_to(&self, x: f32, y: f32) -> Self {
        Self { x, y, ..*self }
    }

    pub fn inflate(&self, by: f32) -> Self {
        Self::new(
            self.x - by,
            self.y - by,
            self.width + 2.0 * by,
            self.height + 2.0 * by,
        )
    }

    /// Corners in drawing order: left, bottom, right, top.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        [(x, y + h), (x + w, y + h), (x + w, y), (x, y)]
    }
}

// ---------------------------------------------------------------------------
// 3D box
// ---------------------------------------------------------------------------

/// Footprint plus the half-open vertical extent `[z, z + depth)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub footprint: Aabb,
    pub z: f32,
    pub depth: f32,
}

impl Aabb3 {
    pub fn new(footprint: Aabb, z: f32, depth: f32) -> Self {
        Self {
            footprint,
            z,
            depth,
        }
    }

    pub fn top(&self) -> f32 {
        self.z + self.depth
    }

    pub fn z_overlaps(&self, other: &Aabb3) -> bool {
        self.z < other.top() && self.top() > other.z
    }

    pub fn moved_to(&self, x: f32, y: f32) -> Self {
        Self {
            footprint: self.footprint.moved_to(x, y),
            ..*self
        }
    }

    /// Grow every axis by `by` on both sides.
    pub fn inflate(&self, by: f32) -> Self {
        Self::new(self.footprint.inflate(by), self.z - by, self.depth + 2.0 * by)
    }
}

/// Box of a body standing at `position`: one tile minus `margin` on each side
/// of the footprint, `height_tiles` tall.
pub fn compute(position: Vec3, height_tiles: u32, tile_size: f32, margin: f32) -> Aabb3 {
    debug_assert!(
        position.is_finite(),
        "bounding box requested for unpositioned body {position}"
    );
    let side = tile_size - 2.0 * margin;
    Aabb3::new(
        Aabb::new(position.x + margin, position.y + margin, side, side),
        position.z,
        height_tiles as f32 * tile_size,
    )
}

// ---------------------------------------------------------------------------
// Collider
// ---------------------------------------------------------------------------

/// A positioned body with a tile-based bounding box.
pub trait Collider {
    fn position(&self) -> Vec3;
    fn height_tiles(&self) -> u32;

    fn bounding_box(&self, geometry: Geometry) -> Aabb3 {
        compute(
            self.position(),
            self.height_tiles(),
            geometry.tile_size,
            geometry.margin,
        )
    }

    /// Box the body would have at another planar position, same Z.
    fn bounding_box_at(&self, x: f32, y: f32, geometry: Geometry) -> Aabb3 {
        let z = self.position().z;
        compute(
            Vec3::new(x, y, z),
            self.height_tiles(),
            geometry.tile_size,
            geometry.margin,
        )
    }
}
