//! Entity subsystem: placeable room objects (crates, chests, NPCs) and the
//! raw records they are instantiated from.

use crate::bbox::{self, Aabb3, Collider};
use crate::types::{Geometry, Vec3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable index of an entity within its room's entity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityClass {
    Crate,
    Chest,
    Npc,
    Generic,
}

impl From<&str> for EntityClass {
    fn from(s: &str) -> Self {
        match s {
            "Crate" => EntityClass::Crate,
            "Chest" => EntityClass::Chest,
            "NPC" | "Npc" => EntityClass::Npc,
            _ => EntityClass::Generic,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw record
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "Unknown".into()
}

fn default_class() -> String {
    "Entity".into()
}

fn default_orientation() -> String {
    "NE".into()
}

/// Entity as described by room data. Position is in tiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityRecord {
    #[serde(rename = "name", default = "default_name")]
    pub name: String,
    #[serde(rename = "class", default = "default_class")]
    pub class: String,
    #[serde(default)]
    pub r#type: u32,
    #[serde(rename = "X", default)]
    pub x: f32,
    #[serde(rename = "Y", default)]
    pub y: f32,
    #[serde(rename = "Z", default)]
    pub z: f32,
    #[serde(default)]
    pub palette: u32,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default)]
    pub behaviour: u32,
    #[serde(default)]
    pub dialogue: u32,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub hostile: bool,
    #[serde(default)]
    pub no_rotate: bool,
    #[serde(default)]
    pub no_pickup: bool,
    #[serde(default)]
    pub has_dialogue: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub solid: bool,
    #[serde(default = "default_true")]
    pub gravity: bool,
    #[serde(default = "default_true")]
    pub friction: bool,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub tile_copy: bool,
    #[serde(default)]
    pub tile_source: u32,
}

impl EntityRecord {
    /// Minimal solid, visible, liftable record at a tile position.
    pub fn at(name: impl Into<String>, class: impl Into<String>, x: f32, y: f32, z: f32) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            r#type: 0,
            x,
            y,
            z,
            palette: 0,
            orientation: default_orientation(),
            behaviour: 0,
            dialogue: 0,
            speed: 0,
            hostile: false,
            no_rotate: false,
            no_pickup: false,
            has_dialogue: false,
            visible: true,
            solid: true,
            gravity: true,
            friction: true,
            reserved: false,
            tile_copy: false,
            tile_source: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFlags {
    pub solid: bool,
    pub visible: bool,
    pub gravity: bool,
    pub friction: bool,
    pub no_pickup: bool,
    pub no_rotate: bool,
    pub hostile: bool,
    pub has_dialogue: bool,
    pub reserved: bool,
}

impl From<&EntityRecord> for EntityFlags {
    fn from(r: &EntityRecord) -> Self {
        Self {
            solid: r.solid,
            visible: r.visible,
            gravity: r.gravity,
            friction: r.friction,
            no_pickup: r.no_pickup,
            no_rotate: r.no_rotate,
            hostile: r.hostile,
            has_dialogue: r.has_dialogue,
            reserved: r.reserved,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub class: EntityClass,
    pub flags: EntityFlags,
    pub behaviour: u32,
    pub dialogue: u32,
    pub palette: u32,
    pub orientation: String,
    height_tiles: u32,
    geometry: Geometry,
    world_pos: Vec3,
    bbox: Aabb3,
}

impl Entity {
    /// Instantiate from a record, converting its tile position to world pixels.
    pub fn from_record(
        id: EntityId,
        record: &EntityRecord,
        geometry: Geometry,
        height_tiles: u32,
    ) -> Self {
        let t = geometry.tile_size;
        let world_pos = Vec3::new(record.x * t, record.y * t, record.z * t);
        Self {
            id,
            name: record.name.clone(),
            class: EntityClass::from(record.class.as_str()),
            flags: EntityFlags::from(record),
            behaviour: record.behaviour,
            dialogue: record.dialogue,
            palette: record.palette,
            orientation: record.orientation.clone(),
            height_tiles,
            geometry,
            world_pos,
            bbox: bbox::compute(world_pos, height_tiles, t, geometry.margin),
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.world_pos = position;
        self.bbox = bbox::compute(
            position,
            self.height_tiles,
            self.geometry.tile_size,
            self.geometry.margin,
        );
    }

    /// Cached box at the current position.
    pub fn bbox(&self) -> &Aabb3 {
        &self.bbox
    }

    /// Top surface Z in world pixels.
    pub fn top(&self) -> f32 {
        self.bbox.top()
    }

    /// Takes part in movement collision.
    pub fn is_obstacle(&self) -> bool {
        self.flags.solid && self.flags.visible
    }

    pub fn is_crate(&self) -> bool {
        self.class == EntityClass::Crate
    }

    pub fn is_chest(&self) -> bool {
        self.class == EntityClass::Chest
    }

    pub fn is_npc(&self) -> bool {
        self.class == EntityClass::Npc
    }
}

impl Collider for Entity {
    fn position(&self) -> Vec3 {
        self.world_pos
    }

    fn height_tiles(&self) -> u32 {
        self.height_tiles
    }
}
