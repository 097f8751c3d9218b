//! Room subsystem: the records a room is built from, the loaders that supply
//! them, and the live per-room state (heightmap, entities, warps).

use crate::entity::{Entity, EntityId, EntityRecord};
use crate::heightmap::{Heightmap, HeightmapError};
use crate::types::Geometry;
use crate::warp::{RoomId, Warp, WarpRecord};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RoomLoadError {
    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid room record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("room {0} has no heightmap")]
    MissingHeightmap(RoomId),
    #[error("room {room}: {source}")]
    Heightmap {
        room: RoomId,
        #[source]
        source: HeightmapError,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Everything the tile loader knows about a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomData {
    pub id: u16,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Packed in-map heightmap (`0xWHHH` codes).
    #[serde(default)]
    pub heightmap: Option<String>,
    #[serde(default)]
    pub hm_left: i32,
    #[serde(default)]
    pub hm_top: i32,
    /// Standalone CSV heightmap resource, when not embedded.
    #[serde(default)]
    pub heightmap_csv: Option<String>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub warps: Vec<WarpRecord>,
}

fn default_tile_size() -> f32 {
    16.0
}

impl RoomData {
    pub fn room_id(&self) -> RoomId {
        RoomId(self.id)
    }

    /// md5 of the heightmap source, hex encoded.
    pub fn digest(&self) -> String {
        let source = self
            .heightmap
            .as_deref()
            .or(self.heightmap_csv.as_deref())
            .unwrap_or_default();
        format!("{:x}", md5::compute(source.as_bytes()))
    }

    pub fn parse_heightmap(&self) -> Result<Heightmap, RoomLoadError> {
        let room = self.room_id();
        let parsed = match (&self.heightmap, &self.heightmap_csv) {
            (Some(packed), _) => Heightmap::parse_packed(packed, self.hm_left, self.hm_top),
            (None, Some(csv)) => Heightmap::parse_csv(csv),
            (None, None) => return Err(RoomLoadError::MissingHeightmap(room)),
        };
        parsed.map_err(|source| RoomLoadError::Heightmap { room, source })
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Source of room records. Loading is blocking and may fail.
pub trait RoomLoader: Send + Sync {
    fn load(&self, id: RoomId) -> Result<Arc<RoomData>, RoomLoadError>;
}

/// Rooms held in memory, keyed by id.
#[derive(Default)]
pub struct StaticRooms {
    rooms: HashMap<RoomId, Arc<RoomData>>,
}

impl StaticRooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, data: RoomData) -> Self {
        self.insert(data);
        self
    }

    pub fn insert(&mut self, data: RoomData) {
        self.rooms.insert(data.room_id(), Arc::new(data));
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl RoomLoader for StaticRooms {
    fn load(&self, id: RoomId) -> Result<Arc<RoomData>, RoomLoadError> {
        self.rooms
            .get(&id)
            .cloned()
            .ok_or(RoomLoadError::UnknownRoom(id))
    }
}

/// Reads `room{NNN}.json` (and `room{NNN}_heightmap.csv` when the record
/// carries no embedded heightmap) from a data directory.
///
/// Parsed records are cached; room state built from them is never shared.
pub struct DirectoryLoader {
    root: PathBuf,
    cache: RwLock<HashMap<RoomId, Arc<RoomData>>>,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn record_path(&self, id: RoomId) -> PathBuf {
        self.root.join(format!("room{id}.json"))
    }

    pub fn heightmap_path(&self, id: RoomId) -> PathBuf {
        self.root.join(format!("room{id}_heightmap.csv"))
    }

    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    /// Drop every cached record so the next load re-reads from disk.
    pub fn invalidate(&self) {
        self.cache.write().clear();
    }

    fn read_from_disk(&self, id: RoomId) -> Result<RoomData, RoomLoadError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(RoomLoadError::UnknownRoom(id));
        }
        let text = read(&path)?;
        let mut data: RoomData = serde_json::from_str(&text)
            .map_err(|source| RoomLoadError::Json { path: path.clone(), source })?;

        if data.heightmap.is_none() && data.heightmap_csv.is_none() {
            let hm_path = self.heightmap_path(id);
            if !hm_path.exists() {
                return Err(RoomLoadError::MissingHeightmap(id));
            }
            data.heightmap_csv = Some(read(&hm_path)?);
        }
        debug!("Read room {} from {}", id, path.display());
        Ok(data)
    }
}

fn read(path: &Path) -> Result<String, RoomLoadError> {
    std::fs::read_to_string(path).map_err(|source| RoomLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl RoomLoader for DirectoryLoader {
    fn load(&self, id: RoomId) -> Result<Arc<RoomData>, RoomLoadError> {
        if let Some(data) = self.cache.read().get(&id) {
            return Ok(data.clone());
        }
        let data = Arc::new(self.read_from_disk(id)?);
        let mut cache = self.cache.write();
        match cache.entry(id) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(v) => {
                v.insert(data.clone());
                Ok(data)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Live room
// ---------------------------------------------------------------------------

/// Live state of the active room. Replaced wholesale on room change.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub heightmap: Heightmap,
    pub entities: Vec<Entity>,
    pub warps: Vec<Warp>,
    pub digest: String,
}

impl Room {
    /// Build fresh room state. Fails without side effects.
    pub fn build(
        data: &RoomData,
        geometry: Geometry,
        entity_height_tiles: u32,
    ) -> Result<Self, RoomLoadError> {
        let heightmap = data.parse_heightmap()?;
        let entities = data
            .entities
            .iter()
            .enumerate()
            .map(|(i, r)| Entity::from_record(EntityId(i), r, geometry, entity_height_tiles))
            .collect();
        let warps = data.warps.iter().map(Warp::from).collect();
        Ok(Self {
            id: data.room_id(),
            heightmap,
            entities,
            warps,
            digest: data.digest(),
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }
}
