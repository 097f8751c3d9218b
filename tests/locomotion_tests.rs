//! Terrain locomotion tests

#[cfg(test)]
mod tests {
    use iso_world::avatar::Avatar;
    use iso_world::bbox::Collider;
    use iso_world::entity::{Entity, EntityId, EntityRecord};
    use iso_world::heightmap::Heightmap;
    use iso_world::locomotion::{
        apply_vertical, entity_fall, ground_under, pick_direction, start_jump, step, MotionState,
    };
    use iso_world::types::{Direction, SimConfig, Vec3};

    fn config() -> SimConfig {
        SimConfig::default()
    }

    /// Parse rows of packed codes into a heightmap.
    fn terrain(rows: &[&[&str]]) -> Heightmap {
        let source = rows
            .iter()
            .map(|r| r.join(","))
            .collect::<Vec<_>>()
            .join("\n");
        Heightmap::parse_packed(&source, 0, 0).unwrap()
    }

    fn flat(size: usize) -> Heightmap {
        let row = vec!["0x0000"; size].join(",");
        Heightmap::parse_packed(&vec![row; size].join("\n"), 0, 0).unwrap()
    }

    /// 3x3 plateau at height 1, ringed by height 0, inside a blocking border.
    fn plateau() -> Heightmap {
        const B: &str = "0x4000";
        const L: &str = "0x0000";
        const P: &str = "0x0001";
        terrain(&[
            &[B, B, B, B, B, B, B],
            &[B, L, L, L, L, L, B],
            &[B, L, P, P, P, L, B],
            &[B, L, P, P, P, L, B],
            &[B, L, P, P, P, L, B],
            &[B, L, L, L, L, L, B],
            &[B, B, B, B, B, B, B],
        ])
    }

    fn crate_at(id: usize, x: f32, y: f32, z: f32) -> Entity {
        let record = EntityRecord::at(format!("crate{id}"), "Crate", x, y, z);
        Entity::from_record(EntityId(id), &record, config().geometry(), 1)
    }

    fn settle(avatar: &mut Avatar, terrain: &Heightmap, entities: &[Entity]) -> usize {
        let config = config();
        for ticks in 0..500 {
            if apply_vertical(avatar, terrain, entities, None, &config) == MotionState::Grounded {
                return ticks;
            }
        }
        panic!("avatar never landed");
    }

    // -----------------------------------------------------------------------
    // Direction priority
    // -----------------------------------------------------------------------

    #[test]
    fn direction_priority_is_left_right_up_down() {
        assert_eq!(pick_direction(true, true, true, true), Some(Direction::Left));
        assert_eq!(pick_direction(false, true, true, true), Some(Direction::Right));
        assert_eq!(pick_direction(false, false, true, true), Some(Direction::Up));
        assert_eq!(pick_direction(false, false, false, true), Some(Direction::Down));
        assert_eq!(pick_direction(false, false, false, false), None);
    }

    // -----------------------------------------------------------------------
    // Gravity
    // -----------------------------------------------------------------------

    #[test]
    fn avatar_lands_on_plateau() {
        let hm = plateau();
        let mut avatar = Avatar::new(Vec3::new(48.0, 48.0, 40.0), 2);

        let ticks = settle(&mut avatar, &hm, &[]);

        assert_eq!(ticks, 24);
        assert_eq!(avatar.position().z, 16.0);
        assert!(avatar.touch_ground);
        assert!(!avatar.jump.is_jumping);
    }

    #[test]
    fn fall_is_clamped_to_the_floor() {
        let hm = plateau();
        let mut avatar = Avatar::new(Vec3::new(48.0, 48.0, 16.5), 2);
        let state = apply_vertical(&mut avatar, &hm, &[], None, &config());
        assert_eq!(state, MotionState::Falling);
        assert_eq!(avatar.position().z, 16.0);
    }

    #[test]
    fn highest_corner_supports_the_avatar() {
        let hm = plateau();
        // Footprint straddles the plateau edge between columns 1 and 2.
        let avatar = Avatar::new(Vec3::new(24.0, 48.0, 16.0), 2);
        let fp = avatar.bounding_box(config().geometry()).footprint;
        assert_eq!(ground_under(&fp, &hm, 16.0), Some(16.0));
    }

    #[test]
    fn entity_top_supports_the_avatar() {
        let hm = flat(6);
        let entities = vec![crate_at(0, 2.0, 2.0, 0.0)];
        let mut avatar = Avatar::new(Vec3::new(32.0, 32.0, 20.0), 2);

        settle(&mut avatar, &hm, &entities);
        assert_eq!(avatar.position().z, 16.0);

        // Excluding the crate (it is being carried) lets the avatar drop through.
        let mut avatar = Avatar::new(Vec3::new(32.0, 32.0, 20.0), 2);
        let config = config();
        while apply_vertical(&mut avatar, &hm, &entities, Some(EntityId(0)), &config)
            != MotionState::Grounded
        {}
        assert_eq!(avatar.position().z, 0.0);
    }

    #[test]
    fn off_map_corner_counts_as_support() {
        let hm = flat(4);
        let mut avatar = Avatar::new(Vec3::new(-8.0, 16.0, 8.0), 2);
        let state = apply_vertical(&mut avatar, &hm, &[], None, &config());
        assert_eq!(state, MotionState::Grounded);
        assert_eq!(avatar.position().z, 8.0);
    }

    #[test]
    fn entities_fall_onto_each_other() {
        let hm = flat(6);
        let mut entities = vec![crate_at(0, 2.0, 2.0, 0.0), crate_at(1, 2.0, 2.0, 2.0)];
        let config = config();

        assert_eq!(entity_fall(&entities, 0, &hm, None, &config), None);
        let mut ticks = 0;
        while let Some(pos) = entity_fall(&entities, 1, &hm, None, &config) {
            entities[1].set_position(pos);
            ticks += 1;
        }
        assert_eq!(ticks, 16);
        assert_eq!(entities[1].position().z, 16.0);
    }

    #[test]
    fn gravity_flag_off_keeps_entity_floating() {
        let hm = flat(4);
        let mut record = EntityRecord::at("balloon", "Generic", 1.0, 1.0, 3.0);
        record.gravity = false;
        let entities = vec![Entity::from_record(EntityId(0), &record, config().geometry(), 1)];
        assert_eq!(entity_fall(&entities, 0, &hm, None, &config()), None);
    }

    // -----------------------------------------------------------------------
    // Jump
    // -----------------------------------------------------------------------

    #[test]
    fn jump_rises_then_falls_back() {
        let hm = flat(6);
        let config = config();
        let mut avatar = Avatar::new(Vec3::new(32.0, 32.0, 0.0), 2);
        assert_eq!(
            apply_vertical(&mut avatar, &hm, &[], None, &config),
            MotionState::Grounded
        );

        assert!(start_jump(&mut avatar));
        assert!(!start_jump(&mut avatar), "cannot jump while airborne");

        for _ in 0..12 {
            assert_eq!(
                apply_vertical(&mut avatar, &hm, &[], None, &config),
                MotionState::Jumping
            );
        }
        assert_eq!(avatar.position().z, 24.0);
        assert!(!avatar.jump.is_jumping);
        assert!(!avatar.touch_ground);

        let ticks = settle(&mut avatar, &hm, &[]);
        assert_eq!(ticks, 24);
        assert_eq!(avatar.position().z, 0.0);
        assert!(avatar.touch_ground);
    }

    // -----------------------------------------------------------------------
    // Planar steps
    // -----------------------------------------------------------------------

    #[test]
    fn step_moves_by_walk_speed() {
        let hm = flat(6);
        let avatar = Avatar::new(Vec3::new(32.0, 32.0, 0.0), 2);
        let config = config();
        assert_eq!(
            step(&avatar, Direction::Right, &hm, &config),
            Some(Vec3::new(33.0, 32.0, 0.0))
        );
        assert_eq!(
            step(&avatar, Direction::Up, &hm, &config),
            Some(Vec3::new(32.0, 31.0, 0.0))
        );
    }

    #[test]
    fn step_into_blocking_cell_is_refused() {
        const L: &str = "0x0000";
        const B: &str = "0x4000";
        let hm = terrain(&[&[L, L, B], &[L, L, B], &[L, L, B]]);
        // Footprint right edge flush with column 2.
        let avatar = Avatar::new(Vec3::new(18.0, 16.0, 0.0), 2);
        assert_eq!(step(&avatar, Direction::Right, &hm, &config()), None);
        assert!(step(&avatar, Direction::Left, &hm, &config()).is_some());
    }

    #[test]
    fn step_off_the_map_is_refused() {
        let hm = flat(3);
        let avatar = Avatar::new(Vec3::new(-2.0, 16.0, 0.0), 2);
        assert_eq!(step(&avatar, Direction::Left, &hm, &config()), None);
    }

    #[test]
    fn step_gating_uses_head_height() {
        const L: &str = "0x0000";
        const H2: &str = "0x0002";
        const H3: &str = "0x0003";
        let two = terrain(&[&[L, L, H2], &[L, L, H2], &[L, L, H2]]);
        let three = terrain(&[&[L, L, H3], &[L, L, H3], &[L, L, H3]]);

        // Feet at 0, head at 32: a 32px ledge is reachable, 48px is not.
        let avatar = Avatar::new(Vec3::new(18.0, 16.0, 0.0), 2);
        assert_eq!(avatar.gating_height(16.0), 32.0);
        assert!(step(&avatar, Direction::Right, &two, &config()).is_some());
        assert_eq!(step(&avatar, Direction::Right, &three, &config()), None);
    }
}
