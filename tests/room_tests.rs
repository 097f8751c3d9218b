//! Room loading tests

#[cfg(test)]
mod tests {
    use iso_world::bbox::Collider;
    use iso_world::entity::{EntityClass, EntityId};
    use iso_world::room::{DirectoryLoader, Room, RoomLoadError, RoomLoader};
    use iso_world::types::{Geometry, Vec3};
    use iso_world::warp::RoomId;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const ROOM_ONE: &str = r#"{
        "id": 1,
        "heightmap": "0x0000,0x0000,0x0000\n0x0000,0x0001,0x4000",
        "hm_left": -2,
        "hm_top": 3,
        "entities": [
            { "name": "box", "class": "Crate", "X": 1, "Y": 0, "Z": 0 },
            { "name": "chest", "class": "Chest", "X": 2, "Y": 1, "Z": 1, "NoPickup": true, "Type": 7 },
            { "name": "ghost", "class": "NPC", "X": 0, "Y": 1, "Solid": false, "Visible": false }
        ],
        "warps": [
            { "room1": 1, "room2": 2, "x": 12, "y": 12, "x2": 14, "y2": 13, "width": 1, "height": 2, "type": 0 }
        ]
    }"#;

    const ROOM_TWO: &str = r#"{ "id": 2, "entities": [] }"#;
    const ROOM_TWO_CSV: &str = "0A,-3\n00,01\n02,03\n";

    /// Fresh scratch directory under the system temp dir.
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("iso-world-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, contents: &str) {
        std::fs::write(dir.join(file), contents).unwrap();
    }

    // -----------------------------------------------------------------------
    // Directory loader
    // -----------------------------------------------------------------------

    #[test]
    fn loads_embedded_heightmap_and_records() {
        let dir = scratch("embedded");
        write(&dir, "room001.json", ROOM_ONE);
        let loader = DirectoryLoader::new(&dir);

        let data = loader.load(RoomId(1)).unwrap();
        assert_eq!(data.room_id(), RoomId(1));
        assert_eq!(data.tile_size, 16.0);
        assert_eq!(data.entities.len(), 3);
        assert_eq!(data.entities[1].r#type, 7);
        assert!(data.entities[1].no_pickup);
        assert!(data.entities[0].gravity, "flags default to true");
        assert!(!data.entities[2].solid);
        assert_eq!(data.warps[0].height, 2);

        let hm = data.parse_heightmap().unwrap();
        assert_eq!((hm.left_offset, hm.top_offset), (-2, 3));
        assert_eq!((hm.width(), hm.height()), (3, 2));
    }

    #[test]
    fn falls_back_to_csv_heightmap_file() {
        let dir = scratch("csv");
        write(&dir, "room002.json", ROOM_TWO);
        write(&dir, "room002_heightmap.csv", ROOM_TWO_CSV);
        let loader = DirectoryLoader::new(&dir);

        let data = loader.load(RoomId(2)).unwrap();
        assert_eq!(data.heightmap_csv.as_deref(), Some(ROOM_TWO_CSV));
        let hm = data.parse_heightmap().unwrap();
        assert_eq!((hm.left_offset, hm.top_offset), (10, -3));
        assert_eq!(hm.get_cell(1, 1).unwrap().height, 3);
    }

    #[test]
    fn missing_resources_are_errors() {
        let dir = scratch("missing");
        write(&dir, "room003.json", r#"{ "id": 3 }"#);
        write(&dir, "room004.json", "{ not json");
        let loader = DirectoryLoader::new(&dir);

        assert!(matches!(
            loader.load(RoomId(3)),
            Err(RoomLoadError::MissingHeightmap(RoomId(3)))
        ));
        assert!(matches!(
            loader.load(RoomId(4)),
            Err(RoomLoadError::Json { .. })
        ));
        assert!(matches!(
            loader.load(RoomId(5)),
            Err(RoomLoadError::UnknownRoom(RoomId(5)))
        ));
        assert_eq!(loader.cached(), 0);
    }

    #[test]
    fn records_are_cached_until_invalidated() {
        let dir = scratch("cache");
        write(&dir, "room001.json", ROOM_ONE);
        let loader = DirectoryLoader::new(&dir);

        let first = loader.load(RoomId(1)).unwrap();
        let second = loader.load(RoomId(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached(), 1);

        loader.invalidate();
        assert_eq!(loader.cached(), 0);
        let third = loader.load(RoomId(1)).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn file_names_use_three_digit_ids() {
        let loader = DirectoryLoader::new("data");
        assert!(loader.record_path(RoomId(7)).ends_with("room007.json"));
        assert!(loader
            .heightmap_path(RoomId(42))
            .ends_with("room042_heightmap.csv"));
    }

    // -----------------------------------------------------------------------
    // Room state
    // -----------------------------------------------------------------------

    #[test]
    fn digest_is_md5_of_heightmap_source() {
        let dir = scratch("digest");
        write(&dir, "room001.json", ROOM_ONE);
        let data = DirectoryLoader::new(&dir).load(RoomId(1)).unwrap();

        let source = data.heightmap.as_deref().unwrap();
        assert_eq!(data.digest(), format!("{:x}", md5::compute(source.as_bytes())));
        assert_eq!(data.digest().len(), 32);
    }

    #[test]
    fn build_converts_entities_to_world_space() {
        let dir = scratch("build");
        write(&dir, "room001.json", ROOM_ONE);
        let data = DirectoryLoader::new(&dir).load(RoomId(1)).unwrap();

        let room = Room::build(&data, Geometry::new(16.0, 2.0), 1).unwrap();
        assert_eq!(room.id, RoomId(1));
        assert_eq!(room.entities.len(), 3);
        assert_eq!(room.warps.len(), 1);
        assert_eq!(room.digest, data.digest());

        let chest = room.entity(EntityId(1)).unwrap();
        assert_eq!(chest.position(), Vec3::new(32.0, 16.0, 16.0));
        assert_eq!(chest.top(), 32.0);
        assert!(chest.is_chest());
        assert!(room.entity(EntityId(0)).unwrap().is_crate());

        let ghost = room.entity(EntityId(2)).unwrap();
        assert_eq!(ghost.class, EntityClass::Npc);
        assert!(!ghost.is_obstacle());
    }

    #[test]
    fn rebuilt_rooms_do_not_share_state() {
        let dir = scratch("fresh");
        write(&dir, "room001.json", ROOM_ONE);
        let loader = DirectoryLoader::new(&dir);
        let geometry = Geometry::new(16.0, 2.0);

        let mut first = Room::build(&loader.load(RoomId(1)).unwrap(), geometry, 1).unwrap();
        first
            .entity_mut(EntityId(0))
            .unwrap()
            .set_position(Vec3::new(80.0, 80.0, 0.0));

        let second = Room::build(&loader.load(RoomId(1)).unwrap(), geometry, 1).unwrap();
        assert_eq!(
            second.entity(EntityId(0)).unwrap().position(),
            Vec3::new(16.0, 0.0, 0.0)
        );
    }
}
