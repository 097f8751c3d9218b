//! GameSession – the per-tick simulation pipeline, camera, debug state and
//! atomic room swaps.
//!
//! Stage order inside [`GameSession::tick`] is fixed: gravity/jump, planar
//! movement, entity collision, carry and entity gravity, warp check. Each
//! stage consumes the position committed by the one before it.

use crate::avatar::Avatar;
use crate::bbox::{self, Aabb3, Collider};
use crate::collision::{self, intersects_3d};
use crate::entity::EntityId;
use crate::heightmap::TerrainSource;
use crate::iso;
use crate::locomotion::{self, MotionState};
use crate::protocol::{
    AvatarView, BoxView, CarryEvent, EntityView, FrameSnapshot, RoomLoadFailed, RoomLoaded,
    TickIntent, WarpTaken,
};
use crate::room::{Room, RoomLoadError, RoomLoader};
use crate::types::{last_tile, Direction, SessionStats, SimConfig, TileCoord, Vec3};
use crate::warp::{self, RoomId, WarpDestination};
use log::{debug, info, warn};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Tick result
// ---------------------------------------------------------------------------

/// Everything that happened during one [`GameSession::tick`].
#[derive(Debug, Clone)]
pub struct TickEvents {
    pub tick: u64,
    pub motion: MotionState,
    /// Entities that pushed the avatar back this tick.
    pub touched: Vec<EntityId>,
    /// Entities the avatar walked across the top of.
    pub passed_over: Vec<EntityId>,
    /// Entities in contact with the avatar after movement.
    pub touching: Vec<EntityId>,
    pub carry: Vec<CarryEvent>,
    pub warp: Option<WarpTaken>,
    pub room_loaded: Option<RoomLoaded>,
    pub room_load_failed: Option<RoomLoadFailed>,
}

impl TickEvents {
    fn new(tick: u64, motion: MotionState) -> Self {
        Self {
            tick,
            motion,
            touched: Vec::new(),
            passed_over: Vec::new(),
            touching: Vec::new(),
            carry: Vec::new(),
            warp: None,
            room_loaded: None,
            room_load_failed: None,
        }
    }
}

/// Debug display state, toggled through intents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebugState {
    pub enabled: bool,
    /// Manual camera offset accumulated while panning.
    pub pan: (f32, f32),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct GameSession {
    config: SimConfig,
    loader: Arc<dyn RoomLoader>,
    room: Room,
    avatar: Avatar,
    debug: DebugState,
    camera: (f32, f32),
    motion: MotionState,
    /// Cleared on arrival; set again once the avatar stands outside every zone.
    warp_armed: bool,
    tick_count: u64,
    warps_taken: u64,
    room_loads: u64,
}

impl GameSession {
    /// Load the first room and place the avatar at `spawn` (world pixels).
    pub fn start(
        config: SimConfig,
        loader: Arc<dyn RoomLoader>,
        room: RoomId,
        spawn: Vec3,
    ) -> Result<Self, RoomLoadError> {
        let data = loader.load(room)?;
        let room = Room::build(&data, config.geometry(), config.entity_height_tiles)?;
        info!(
            "Session starting in room {} ({}x{} cells, {} entities)",
            room.id,
            room.heightmap.width(),
            room.heightmap.height(),
            room.entities.len()
        );
        let avatar = Avatar::new(spawn, config.avatar_height_tiles);
        let mut session = Self {
            config,
            loader,
            room,
            avatar,
            debug: DebugState::default(),
            camera: (0.0, 0.0),
            motion: MotionState::Falling,
            warp_armed: false,
            tick_count: 0,
            warps_taken: 0,
            room_loads: 1,
        };
        session.update_camera();
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn avatar_mut(&mut self) -> &mut Avatar {
        &mut self.avatar
    }

    pub fn debug(&self) -> DebugState {
        self.debug
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug.enabled = enabled;
    }

    pub fn camera(&self) -> (f32, f32) {
        self.camera
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    pub fn is_warp_armed(&self) -> bool {
        self.warp_armed
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            room: self.room.id.0,
            total_ticks: self.tick_count,
            warps_taken: self.warps_taken,
            room_loads: self.room_loads,
            entities: self.room.entities.len(),
        }
    }

    pub fn room_loaded_event(&self) -> RoomLoaded {
        RoomLoaded {
            room: self.room.id.0,
            digest: self.room.digest.clone(),
            width: self.room.heightmap.width(),
            height: self.room.heightmap.height(),
            entities: self.room.entities.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, intent: &TickIntent) -> TickEvents {
        self.tick_count += 1;
        let mut events = TickEvents::new(self.tick_count, self.motion);

        if intent.toggle_debug {
            self.debug.enabled = !self.debug.enabled;
            debug!("Debug display {}", if self.debug.enabled { "on" } else { "off" });
        }

        let direction =
            locomotion::pick_direction(intent.left, intent.right, intent.up, intent.down);

        if self.debug.enabled && intent.room_step != 0 {
            self.debug_room_step(intent.room_step, &mut events);
        }

        if self.debug.enabled && intent.pan_camera {
            if let Some(d) = direction {
                let (dx, dy) = d.delta();
                self.debug.pan.0 += dx as f32 * self.config.camera_pan_speed;
                self.debug.pan.1 += dy as f32 * self.config.camera_pan_speed;
            }
            self.update_camera();
            return events;
        }

        if intent.grab {
            self.toggle_grab(&mut events);
        }

        // 1. Gravity / jump
        if intent.jump {
            locomotion::start_jump(&mut self.avatar);
        }
        let grabbed = self.avatar.grabbed();
        self.motion = locomotion::apply_vertical(
            &mut self.avatar,
            &self.room.heightmap,
            &self.room.entities,
            grabbed,
            &self.config,
        );
        events.motion = self.motion;

        // 2. Planar movement + 3. entity collision
        self.avatar.face(direction);
        if let Some(d) = direction {
            self.move_avatar(d, &mut events);
        }

        // 4. Carried entity, free entity gravity, contact
        self.update_entities();
        let own = self.avatar.bounding_box(self.config.geometry());
        events.touching = collision::get_touching(
            &own,
            &self.room.entities,
            self.avatar.grabbed(),
            self.config.touch_tolerance,
        );

        // 5. Warps
        self.check_warps(&mut events);

        self.update_camera();
        events
    }

    fn move_avatar(&mut self, direction: Direction, events: &mut TickEvents) {
        let geometry = self.config.geometry();
        let Some(target) =
            locomotion::step(&self.avatar, direction, &self.room.heightmap, &self.config)
        else {
            return;
        };

        let proposed = self.avatar.bounding_box_at(target.x, target.y, geometry);
        let resolution =
            collision::resolve_move(proposed, &self.room.entities, self.avatar.grabbed());
        let (sx, sy) = resolution.shift_from(&proposed.footprint);
        let resolved = Vec3::new(target.x + sx, target.y + sy, target.z);

        // A push-out may land the avatar somewhere the step never inspected.
        if (sx != 0.0 || sy != 0.0) && !self.footprint_clear(resolved) {
            events.touched = resolution.touched;
            return;
        }

        self.avatar.set_position(resolved);
        events.touched = resolution.touched;
        events.passed_over = resolution.passed_over;
    }

    /// Every cell under the avatar's footprint at `position` is walkable and
    /// no higher than its gating height.
    fn footprint_clear(&self, position: Vec3) -> bool {
        let t = self.config.tile_size;
        let fp = self
            .avatar
            .bounding_box_at(position.x, position.y, self.config.geometry())
            .footprint;
        let limit = self.avatar.gating_height(t);
        let (x0, y0) = ((fp.x / t).floor() as i32, (fp.y / t).floor() as i32);
        let (x1, y1) = (last_tile(fp.x + fp.width, t), last_tile(fp.y + fp.height, t));
        (y0..=y1).all(|y| {
            (x0..=x1).all(|x| {
                self.room
                    .heightmap
                    .cell(x, y)
                    .is_some_and(|c| c.is_walkable() && c.height as f32 * t <= limit)
            })
        })
    }

    fn update_entities(&mut self) {
        let grabbed = self.avatar.grabbed();
        if let Some(id) = grabbed {
            let carry = self.avatar.carry_position(self.config.tile_size);
            if let Some(entity) = self.room.entity_mut(id) {
                entity.set_position(carry);
            }
        }

        for i in 0..self.room.entities.len() {
            if Some(EntityId(i)) == grabbed {
                continue;
            }
            if let Some(pos) = locomotion::entity_fall(
                &self.room.entities,
                i,
                &self.room.heightmap,
                grabbed,
                &self.config,
            ) {
                self.room.entities[i].set_position(pos);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Grab / place
    // -----------------------------------------------------------------------

    fn toggle_grab(&mut self, events: &mut TickEvents) {
        let geometry = self.config.geometry();

        let Some(id) = self.avatar.grabbed() else {
            if let Some(target) = collision::find_pickup_target(
                &self.avatar,
                &self.room.entities,
                self.config.pickup_reach,
                geometry,
            ) {
                debug!("Grabbed entity {}", target);
                self.avatar.grab(target);
                let carry = self.avatar.carry_position(self.config.tile_size);
                if let Some(entity) = self.room.entity_mut(target) {
                    entity.set_position(carry);
                }
                events.carry.push(CarryEvent::Grabbed { entity: target.0 });
            }
            return;
        };

        let Some(position) = self.placement_in_front() else {
            return;
        };
        let Some(entity) = self.room.entity(id) else {
            self.avatar.release();
            return;
        };
        let placed = bbox::compute(
            position,
            entity.height_tiles(),
            geometry.tile_size,
            geometry.margin,
        );
        let clear_of_avatar = !intersects_3d(&placed, &self.avatar.bounding_box(geometry));
        if clear_of_avatar
            && collision::can_place(
                entity,
                position,
                &self.room.entities,
                &self.room.heightmap,
                geometry,
            )
        {
            if let Some(entity) = self.room.entity_mut(id) {
                entity.set_position(position);
            }
            self.avatar.release();
            debug!("Placed entity {} at {}", id, position);
            events.carry.push(CarryEvent::Placed {
                entity: id.0,
                position,
            });
        }
    }

    /// Ground position of the tile the avatar is facing.
    fn placement_in_front(&self) -> Option<Vec3> {
        let t = self.config.tile_size;
        let (cx, cy) = self
            .avatar
            .bounding_box(self.config.geometry())
            .footprint
            .center();
        let here = TileCoord::containing(cx, cy, t);
        let (dx, dy) = self.avatar.facing.delta();
        let front = TileCoord::new(here.x + dx, here.y + dy);
        let ground = self.room.heightmap.ground_height(front.x, front.y, t)?;
        Some(Vec3::new(front.x as f32 * t, front.y as f32 * t, ground))
    }

    // -----------------------------------------------------------------------
    // Warps and room changes
    // -----------------------------------------------------------------------

    fn check_warps(&mut self, events: &mut TickEvents) {
        let hit = warp::check(
            self.avatar.position(),
            &self.room.warps,
            self.room.id,
            self.config.tile_size,
            self.config.warp_tile_shift,
        )
        .cloned();

        match hit {
            None => self.warp_armed = true,
            Some(_) if !self.warp_armed => {}
            Some(w) => {
                let from = self.room.id;
                let dest = warp::resolve(&w, from, self.config.warp_tile_shift);
                // Stay disarmed whatever the outcome; a failed load must not
                // retry every tick while the avatar stands in the zone.
                self.warp_armed = false;
                self.take_warp(from, dest, events);
            }
        }
    }

    fn take_warp(&mut self, from: RoomId, dest: WarpDestination, events: &mut TickEvents) {
        let room = match self.build_room(dest.room) {
            Ok(room) => room,
            Err(e) => {
                warn!("Warp {} -> {} failed: {}", from, dest.room, e);
                events.room_load_failed = Some(RoomLoadFailed {
                    room: dest.room.0,
                    error: e.to_string(),
                });
                return;
            }
        };

        let t = self.config.tile_size;
        let ground = room
            .heightmap
            .ground_height(dest.tile.x, dest.tile.y, t)
            .unwrap_or_else(|| {
                warn!(
                    "Warp landing tile {} is outside room {}; landing at z=0",
                    dest.tile, dest.room
                );
                0.0
            });
        let landing = Vec3::new(dest.tile.x as f32 * t, dest.tile.y as f32 * t, ground);

        self.swap_room(room, events);
        self.avatar.set_position(landing);
        self.avatar.jump = Default::default();
        self.avatar.touch_ground = true;
        self.motion = MotionState::Grounded;
        self.warps_taken += 1;

        info!("Warped {} -> {} landing at {}", from, dest.room, landing);
        events.warp = Some(WarpTaken {
            from_room: from.0,
            to_room: dest.room.0,
            tile_x: dest.tile.x,
            tile_y: dest.tile.y,
            landing,
        });
    }

    /// Replace the active room, keeping the avatar where it is. On failure
    /// the current room stays in effect.
    pub fn change_room(&mut self, id: RoomId) -> Result<RoomLoaded, RoomLoadError> {
        let room = self.build_room(id)?;
        let mut events = TickEvents::new(self.tick_count, self.motion);
        self.swap_room(room, &mut events);
        self.warp_armed = false;
        Ok(self.room_loaded_event())
    }

    fn debug_room_step(&mut self, step: i32, events: &mut TickEvents) {
        let target = i32::from(self.room.id.0) + step;
        let Ok(target) = u16::try_from(target) else {
            warn!("Already at the first room ({})", self.room.id);
            return;
        };
        if target == 0 {
            warn!("Already at the first room ({})", self.room.id);
            return;
        }
        match self.build_room(RoomId(target)) {
            Ok(room) => {
                self.swap_room(room, events);
                self.warp_armed = false;
            }
            Err(e) => {
                warn!("Staying in room {}: {}", self.room.id, e);
                events.room_load_failed = Some(RoomLoadFailed {
                    room: target,
                    error: e.to_string(),
                });
            }
        }
    }

    fn build_room(&self, id: RoomId) -> Result<Room, RoomLoadError> {
        let data = self.loader.load(id)?;
        Room::build(&data, self.config.geometry(), self.config.entity_height_tiles)
    }

    /// Commit a fully built room. The carried entity belongs to the old room
    /// and is released.
    fn swap_room(&mut self, room: Room, events: &mut TickEvents) {
        if let Some(id) = self.avatar.release() {
            events.carry.push(CarryEvent::Released { entity: id.0 });
        }
        self.room = room;
        self.room_loads += 1;
        self.debug.pan = (0.0, 0.0);
        info!("Loaded room {}", self.room.id);
        events.room_loaded = Some(self.room_loaded_event());
    }

    // -----------------------------------------------------------------------
    // Camera and render snapshot
    // -----------------------------------------------------------------------

    fn update_camera(&mut self) {
        let p = self.avatar.position();
        let (sx, sy) = iso::project(p.x, p.y);
        self.camera = (
            sx - self.config.viewport_width / 2.0 + self.debug.pan.0,
            sy - p.z - self.config.viewport_height / 2.0 + self.debug.pan.1,
        );
    }

    fn box_view(&self, b: &Aabb3) -> BoxView {
        let world = b.footprint.corners();
        let screen = world.map(|(x, y)| {
            let (sx, sy) = iso::project(x, y);
            (sx - self.camera.0, sy - b.z - self.camera.1)
        });
        BoxView {
            world,
            screen,
            z: b.z,
            top: b.top(),
        }
    }

    /// What the renderer needs to draw this frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        let t = self.config.tile_size;
        let p = self.avatar.position();
        let own = self.avatar.bounding_box(self.config.geometry());
        let avatar = AvatarView {
            position: p,
            facing: self.avatar.facing,
            motion: self.motion,
            touch_ground: self.avatar.touch_ground,
            is_jumping: self.avatar.jump.is_jumping,
            grabbed: self.avatar.grabbed().map(|id| id.0),
            bbox: self.box_view(&own),
            tile: (
                (p.x / t).floor() as i32,
                (p.y / t).floor() as i32,
                (self.avatar.gating_height(t) / t).floor() as i32,
            ),
        };
        let entities = self
            .room
            .entities
            .iter()
            .map(|e| EntityView {
                id: e.id.0,
                name: e.name.clone(),
                position: e.position(),
                visible: e.flags.visible,
                bbox: self.box_view(e.bbox()),
            })
            .collect();
        FrameSnapshot {
            room: self.room.id.0,
            camera: self.camera,
            debug: self.debug.enabled,
            avatar,
            entities,
        }
    }
}
